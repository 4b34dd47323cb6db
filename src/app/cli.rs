use std::{fmt::Display, path::PathBuf, str::FromStr};

use clap::Parser;
use tracing_subscriber::filter::{self, Directive};

pub const DEFAULT_USER: &str = "You";
pub const DEFAULT_BASE_URL: &str = "https://threadpanel.local/board";

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    #[clap(flatten)]
    pub args: Args,
}

#[derive(clap::Args, Clone, Debug)]
pub struct Args {
    /// Name the panel posts and reacts as
    #[clap(long, short, default_value = DEFAULT_USER)]
    pub user: String,
    /// Load comments from a JSON file instead of the built-in conversation
    #[clap(long, short)]
    pub comments: Option<PathBuf>,
    /// Simulated latency of the initial load, in milliseconds
    #[clap(long, default_value_t = 1500)]
    pub load_delay_ms: u64,
    /// Make the built-in source fail, to exercise the error view
    #[clap(long)]
    pub fail_load: bool,
    /// Page address used when copying a link to a comment
    #[clap(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
    #[clap(long, short, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
    #[clap(long, short)]
    pub print_log_dir: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    None,
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::None => "none",
        };
        write!(f, "{s}")
    }
}

impl TryFrom<LogLevel> for Directive {
    type Error = filter::ParseError;
    fn try_from(value: LogLevel) -> Result<Self, Self::Error> {
        match value {
            LogLevel::None => Directive::from_str("off"),
            level => Directive::from_str(&level.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults() {
        let cli = Cli::try_parse_from(["threadpanel"]).unwrap();
        assert_eq!(cli.args.user, "You");
        assert_eq!(cli.args.load_delay_ms, 1500);
        assert_eq!(cli.args.log_level, LogLevel::Info);
        assert!(!cli.args.fail_load);
        assert!(cli.args.comments.is_none());
    }

    #[test]
    fn parses_overrides() {
        let cli = Cli::try_parse_from([
            "threadpanel",
            "--user",
            "Jane Doe",
            "--comments",
            "board.json",
            "--load-delay-ms",
            "0",
            "--fail-load",
            "--log-level",
            "none",
        ])
        .unwrap();
        assert_eq!(cli.args.user, "Jane Doe");
        assert_eq!(cli.args.comments, Some(PathBuf::from("board.json")));
        assert_eq!(cli.args.load_delay_ms, 0);
        assert!(cli.args.fail_load);
        assert!(Directive::try_from(cli.args.log_level).is_ok());
    }
}
