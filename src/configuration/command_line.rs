use crate::configuration::constants::cargo_env::CARGO_PKG_NAME;
use crate::time::timeunit::parse_duration;
use clap::arg_enum;
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;
use structopt::StructOpt;

arg_enum! {
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum LogLevel {
        Off, Error, Warn, Info, Debug, Trace,
    }
}

/// Runs tSQLt tests against a database and shows the results as they come in.
///
/// Tests are read one per line as `Suite.Test`, or just `Suite` to run a whole suite.
#[derive(StructOpt, Debug, Default)]
#[structopt(name = CARGO_PKG_NAME)]
pub struct Opt {
    /// Database server, optionally as host:port (default: $TSQLR_SERVER)
    #[structopt(short = "s", long)]
    pub server: Option<String>,

    /// Database name (default: $TSQLR_DATABASE)
    #[structopt(short = "d", long)]
    pub database: Option<String>,

    /// Database username (default: $TSQLR_USER)
    #[structopt(short = "u", long)]
    pub user: Option<String>,

    /// Database user password (default: $TSQLR_PASSWORD)
    #[structopt(short = "p", long)]
    pub password: Option<String>,

    /// Database port (default: $TSQLR_PORT or 1433)
    #[structopt(long)]
    pub port: Option<u16>,

    /// Test file, standard input if not specified
    #[structopt(short = "f", long = "file", parse(from_os_str))]
    pub test_file: Option<PathBuf>,

    /// Settings file. Supported: YAML, JSON, TOML, HJSON
    #[structopt(short = "c", long, parse(from_os_str))]
    pub config: Option<PathBuf>,

    /// Time limit of a single test run, e.g. 30s (default: $TSQLR_TIMEOUT or 10s)
    #[structopt(long, parse(try_from_str = parse_duration))]
    pub timeout: Option<Duration>,

    /// Sets a logging level
    #[structopt(case_insensitive = true, long, short = "L", possible_values = &LogLevel::variants(), env = "TSQLR_LOG_LEVEL")]
    pub logging: Option<LogLevel>,

    /// File to which application will write logs
    #[structopt(long, short = "O", env = "TSQLR_LOG_OUTPUT_FILE", parse(from_os_str))]
    pub log_output_file: Option<PathBuf>,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}
