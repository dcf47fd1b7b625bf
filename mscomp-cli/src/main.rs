//! mscomp CLI - streaming LZNT1 and Xpress from the command line
//!
//! Compresses and decompresses files through the same session interface the
//! library exposes, with configurable read and write sizes.

mod commands;
mod utils;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{cmd_compress, cmd_decompress, cmd_test};
use mscomp::{CompressionLevel, Format};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use utils::StreamOptions;

#[derive(Parser)]
#[command(name = "mscomp")]
#[command(
    author,
    version,
    about = "Streaming compressor for the Microsoft LZ77 formats"
)]
#[command(long_about = "
mscomp compresses and decompresses LZNT1 and plain Xpress streams.
Supported formats: none, lznt1, xpress

Examples:
  mscomp compress disk.img
  mscomp compress -f xpress -l 9 hiberfil.bin -o hiberfil.xpress
  mscomp decompress disk.img.lznt1
  mscomp decompress -f xpress data.xpress --write-size 1
  mscomp test -f xpress --read-size 10 --write-size 7 notes.txt
")]
struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file
    #[command(alias = "c")]
    Compress {
        /// File to compress
        input: PathBuf,

        /// Output file (defaults to the input name plus the format extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stream format
        #[arg(short, long, value_enum, default_value = "lznt1")]
        format: FormatArg,

        /// Compression level (0 stores, 9 searches hardest)
        #[arg(
            short,
            long,
            default_value_t = 6,
            value_parser = clap::value_parser!(u8).range(0..=9)
        )]
        level: u8,

        #[command(flatten)]
        stream: StreamArgs,
    },

    /// Decompress a file
    #[command(alias = "d")]
    Decompress {
        /// File to decompress
        input: PathBuf,

        /// Output file (defaults to the input name without the format extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stream format
        #[arg(short, long, value_enum, default_value = "lznt1")]
        format: FormatArg,

        #[command(flatten)]
        stream: StreamArgs,
    },

    /// Compress then decompress a file in memory and compare
    #[command(alias = "t")]
    Test {
        /// File to test with
        input: PathBuf,

        /// Stream format
        #[arg(short, long, value_enum, default_value = "lznt1")]
        format: FormatArg,

        /// Compression level
        #[arg(
            short,
            long,
            default_value_t = 6,
            value_parser = clap::value_parser!(u8).range(0..=9)
        )]
        level: u8,

        #[command(flatten)]
        stream: StreamArgs,
    },
}

#[derive(clap::Args)]
struct StreamArgs {
    /// Bytes handed to the codec per call
    #[arg(long, default_value_t = 64 * 1024, value_parser = clap::value_parser!(u64).range(1..))]
    read_size: u64,

    /// Output space offered to the codec per call
    #[arg(long, default_value_t = 64 * 1024, value_parser = clap::value_parser!(u64).range(1..))]
    write_size: u64,

    /// Output a summary as JSON (machine-readable)
    #[arg(short, long)]
    json: bool,

    /// Show progress bar
    #[arg(short = 'P', long)]
    progress: bool,
}

impl From<StreamArgs> for StreamOptions {
    fn from(args: StreamArgs) -> Self {
        Self {
            read_size: args.read_size as usize,
            write_size: args.write_size as usize,
            json: args.json,
            progress: args.progress,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Pass bytes through unchanged
    None,
    /// NTFS chunked LZ77
    Lznt1,
    /// Plain Xpress LZ77
    Xpress,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::None => Format::None,
            FormatArg::Lznt1 => Format::Lznt1,
            FormatArg::Xpress => Format::Xpress,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

fn init_logging(level: LogLevel) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::from(level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set up logging: {}", e);
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let result = match cli.command {
        Commands::Compress {
            input,
            output,
            format,
            level,
            stream,
        } => cmd_compress(
            &input,
            output.as_deref(),
            format.into(),
            CompressionLevel::new(level),
            &stream.into(),
        ),
        Commands::Decompress {
            input,
            output,
            format,
            stream,
        } => cmd_decompress(&input, output.as_deref(), format.into(), &stream.into()),
        Commands::Test {
            input,
            format,
            level,
            stream,
        } => cmd_test(
            &input,
            format.into(),
            CompressionLevel::new(level),
            &stream.into(),
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
