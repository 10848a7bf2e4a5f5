use eas_wbxml::cli::Cli;

fn main() {
    if let Err(e) = Cli::run() {
        eprintln!("eas-wbxml: {e}");
        std::process::exit(1);
    }
}
