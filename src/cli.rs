use clap::{Parser, ValueEnum};
use log::LevelFilter;

/// Custom enum for log levels that can be used with clap's ValueEnum
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convert our custom LogLevel enum to log crate's LevelFilter
impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Command line arguments structure using clap derive macros
#[derive(Parser, Debug)]
#[command(name = "chromamarch")]
#[command(about = "Path tracer for signed distance field scenes")]
pub struct Args {
    /// Scene configuration file; built-in defaults are used when it does not exist
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Set the logging level (defaults to "info")
    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub debug_level: LogLevel,

    /// Image width in pixels, overrides the configuration
    #[arg(long)]
    pub width: Option<u32>,

    /// Image height in pixels, overrides the configuration
    #[arg(long)]
    pub height: Option<u32>,

    /// Number of frames blended into the output, overrides the configuration
    #[arg(long, short = 'f')]
    pub frames: Option<u32>,

    /// Time of the first frame; different values give different noise
    #[arg(long, default_value = "0.0")]
    pub seed_time: f32,

    /// Send image to TEV for real-time visualization
    #[arg(long, help = "Send image to TEV for real-time visualization")]
    pub tev: bool,

    /// TEV client IP address and port (automatically enables --tev)
    #[arg(long, help = "TEV client IP address and port (automatically enables --tev)")]
    pub tev_address: Option<String>,

    /// Output file path (.png for 8-bit display colors, .exr for float)
    #[arg(short, long, default_value = "output.png")]
    pub output: String,
}
