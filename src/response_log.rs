//! Debug dumps of WBXML response bodies.
//!
//! The body is logged base64-encoded together with a shell pipeline that
//! turns it back into something readable:
//! `echo '<base64>' | base64 -d | eas-wbxml -`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Larger bodies are mostly message content and are not worth dumping
pub const MAX_LENGTH: usize = 1024;

pub fn should_log_response(content_length: usize) -> bool {
    content_length < MAX_LENGTH
}

pub fn response_log_line(body: &[u8]) -> String {
    if !should_log_response(body.len()) {
        return "wbxml response: [TOO MUCH DATA TO INCLUDE]".to_string();
    }
    format!(
        "wbxml response: echo '{}' | base64 -d | eas-wbxml -",
        STANDARD.encode(body)
    )
}

/// Emit [`response_log_line`] at debug level
pub fn log_response(body: &[u8]) {
    if tracing::enabled!(tracing::Level::DEBUG) {
        tracing::debug!("{}", response_log_line(body));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_log_response() {
        assert!(should_log_response(0));
        assert!(should_log_response(MAX_LENGTH - 1));
        assert!(!should_log_response(MAX_LENGTH));
    }

    #[test]
    fn test_small_body() {
        let line = response_log_line(&[0x03, 0x01, 0x6A, 0x00]);
        assert_eq!(line, "wbxml response: echo 'AwFqAA==' | base64 -d | eas-wbxml -");
    }

    #[test]
    fn test_large_body() {
        let body = vec![0u8; MAX_LENGTH];
        assert_eq!(
            response_log_line(&body),
            "wbxml response: [TOO MUCH DATA TO INCLUDE]"
        );
    }
}
