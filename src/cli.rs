use crate::{Result, WbxmlError, WbxmlToXmlConverter, XmlToWbxmlConverter, response_log};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::{Arg, ArgAction, Command};
use std::fs;
use std::io::{self, Read, Write};
use tracing_subscriber::EnvFilter;

pub struct Cli;

impl Cli {
    pub fn build_command() -> Command {
        Command::new("eas-wbxml")
            .about("Converts between Exchange ActiveSync WBXML and human-readable XML")
            .long_about("Converts between Exchange ActiveSync WBXML and human-readable XML.\n\nBy default the input is WBXML and the output XML; '-e' converts the other way. When invoked with the '-i' argument, the output of a successful conversion will overwrite the original input file. Input can be '-' to use stdin, and output can be '-' to use stdout.")
            .arg(
                Arg::new("encode")
                    .short('e')
                    .long("encode")
                    .help("Encode XML input to WBXML")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("in-place")
                    .short('i')
                    .long("in-place")
                    .help("Overwrite input file with converted output")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("base64")
                    .long("base64")
                    .help("WBXML input is base64 text, as printed by the response logger")
                    .conflicts_with("encode")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("hex")
                    .long("hex")
                    .help("Write encoded WBXML as a hex string")
                    .requires("encode")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Log more (-v info, -vv protocol trace, -vvv bytes); RUST_LOG overrides")
                    .action(ArgAction::Count),
            )
            .arg(
                Arg::new("input")
                    .help("Input file path (use '-' for stdin)")
                    .required(true)
                    .index(1),
            )
            .arg(
                Arg::new("output")
                    .help("Output file path (use '-' for stdout)")
                    .index(2),
            )
    }

    pub fn run() -> Result<()> {
        let matches = Self::build_command().get_matches();
        Self::init_logging(matches.get_count("verbose"));
        Self::run_with_matches(matches)
    }

    /// Install a stderr subscriber; `RUST_LOG` wins over the verbosity flag
    pub fn init_logging(verbosity: u8) {
        let level = match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        // Fails only if a subscriber is already installed
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init();
    }

    pub fn run_with_matches(matches: clap::ArgMatches) -> Result<()> {
        let input_path = matches
            .get_one::<String>("input")
            .ok_or_else(|| WbxmlError::Usage("Missing input path".to_string()))?;
        let output_path = matches.get_one::<String>("output");
        let in_place = matches.get_flag("in-place");
        let encode = matches.get_flag("encode");

        if in_place && input_path == "-" {
            return Err(WbxmlError::Usage(
                "Cannot use -i option with stdin input".to_string(),
            ));
        }

        let output_path = match output_path {
            Some(path) => path.clone(),
            None => {
                if in_place {
                    input_path.clone()
                } else {
                    "-".to_string()
                }
            }
        };

        let input = read_input(input_path)?;
        tracing::info!(
            input = %input_path,
            output = %output_path,
            bytes = input.len(),
            "{}",
            if encode { "encoding XML" } else { "decoding WBXML" }
        );

        let output = if encode {
            let wbxml = XmlToWbxmlConverter::convert_bytes(&input)?;
            if matches.get_flag("hex") {
                let mut text = hex::encode_upper(wbxml);
                text.push('\n');
                text.into_bytes()
            } else {
                wbxml
            }
        } else {
            let wbxml = if matches.get_flag("base64") {
                let compact: Vec<u8> = input
                    .into_iter()
                    .filter(|b| !b.is_ascii_whitespace())
                    .collect();
                STANDARD.decode(compact)?
            } else {
                input
            };
            response_log::log_response(&wbxml);
            WbxmlToXmlConverter::convert_bytes(&wbxml)?.into_bytes()
        };

        write_output(&output_path, &output)
    }
}

fn read_input(path: &str) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    if path == "-" {
        io::stdin().lock().read_to_end(&mut data)?;
    } else {
        data = fs::read(path)?;
    }
    Ok(data)
}

fn write_output(path: &str, data: &[u8]) -> Result<()> {
    if path == "-" {
        let mut stdout = io::stdout().lock();
        stdout.write_all(data)?;
        stdout.flush()?;
    } else {
        fs::write(path, data)?;
    }
    Ok(())
}
