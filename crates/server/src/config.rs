//! Server startup configuration.

use clap::Parser;
use std::net::SocketAddr;

/// HTTP service that applies find/replace rules to PowerPoint files.
#[derive(Parser, Debug, Clone)]
#[command(name = "deck-server")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// Largest accepted request body, in megabytes
    #[arg(long, default_value = "50")]
    pub max_upload_mb: usize,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Request body limit in bytes.
    pub fn body_limit(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            max_upload_mb: 50,
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        let config =
            Config::try_parse_from(["deck-server", "--bind", "0.0.0.0:9000", "--max-upload-mb", "2"])
                .unwrap();

        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.body_limit(), 2 * 1024 * 1024);
        assert!(!config.verbose);
    }

    #[test]
    fn test_defaults_match_parser_defaults() {
        let parsed = Config::try_parse_from(["deck-server"]).unwrap();
        let default = Config::default();

        assert_eq!(parsed.bind, default.bind);
        assert_eq!(parsed.max_upload_mb, default.max_upload_mb);
    }
}
