use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use iec61937::process::{ByteOrder, Codec};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\niec61937 ",
    env!("IEC61937_VERSION"),
    "\nbuilt ",
    env!("BUILD_TIMESTAMP"),
);

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION,
    author       = env!("CARGO_PKG_AUTHORS"),
    about        = "Wraps AC-3, E-AC-3, DTS and TrueHD streams into IEC 61937 bursts",
    long_about   = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Treat warnings as fatal errors (fail on first warning).
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Wrap the specified stream into an IEC 61937 bitstream.
    Wrap(WrapArgs),

    /// Print stream information
    Info(InfoArgs),
}

#[derive(Debug, Args)]
pub struct WrapArgs {
    /// Input elementary stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Codec of the input stream.
    #[arg(long, value_enum)]
    pub codec: CodecArg,

    /// Byte order of the 16-bit output words.
    #[arg(long, value_enum, default_value_t = ByteOrderArg::Le)]
    pub byte_order: ByteOrderArg,

    /// Container for the output.
    #[arg(long, value_enum, default_value_t = OutputFormat::Wav)]
    pub format: OutputFormat,

    /// Output path; the extension is added when missing.
    #[arg(long, value_name = "PATH")]
    pub output_path: PathBuf,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Input elementary stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Codec of the input stream.
    #[arg(long, value_enum)]
    pub codec: CodecArg,

    /// Print the summary as YAML.
    #[arg(long)]
    pub yaml: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum CodecArg {
    /// Dolby Digital.
    Ac3,
    /// Dolby Digital Plus.
    Eac3,
    /// DTS core.
    Dts,
    /// Dolby TrueHD.
    Truehd,
    /// Meridian Lossless Packing.
    Mlp,
}

impl From<CodecArg> for Codec {
    fn from(value: CodecArg) -> Self {
        match value {
            CodecArg::Ac3 => Codec::Ac3,
            CodecArg::Eac3 => Codec::Eac3,
            CodecArg::Dts => Codec::Dts,
            CodecArg::Truehd => Codec::TrueHd,
            CodecArg::Mlp => Codec::Mlp,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum ByteOrderArg {
    /// Little-endian words (SPDIFL).
    Le,
    /// Big-endian words (SPDIFB).
    Be,
}

impl From<ByteOrderArg> for ByteOrder {
    fn from(value: ByteOrderArg) -> Self {
        match value {
            ByteOrderArg::Le => ByteOrder::Little,
            ByteOrderArg::Be => ByteOrder::Big,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum OutputFormat {
    /// RIFF WAVE, 16-bit PCM carrying the bursts.
    Wav,
    /// Bursts concatenated without a container.
    Raw,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Raw => "spdif",
        }
    }
}
