mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "carpeta",
    version,
    about = "Extract monthly Formulario 29 declarations from a Carpeta Tributaria"
)]
struct Cli {
    /// Log parsing details (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Monthly rows plus TOTAL and PROMEDIO
    Table,
    /// The full result set
    Json,
    /// {"ok": ..., "result" | "errorMessage": ...}
    Envelope,
    /// Scaled credit/debit series for charting
    Series,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract declarations from a Carpeta Tributaria (PDF or pre-extracted text)
    Extract {
        /// Path to a PDF, or a .txt file already converted to text
        input_file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,

        /// Write the result set as JSON to a file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// JSON options file (display_factor, duplicate_periods)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Override the display factor used for scaled amounts
        #[arg(long, value_name = "N")]
        factor: Option<rust_decimal::Decimal>,

        /// Show monthly rows in chronological order instead of document order
        #[arg(long)]
        sort: bool,
    },
    /// Print the text the engine would scan
    Text {
        /// Path to a PDF or text file
        input_file: PathBuf,
    },
    /// List the recognized Formulario 29 field codes
    Codes,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .init();

    let result = match cli.command {
        Commands::Extract {
            input_file,
            output,
            out,
            config,
            factor,
            sort,
        } => commands::extract::run(input_file, output, out, config, factor, sort),
        Commands::Text { input_file } => commands::text::run(input_file),
        Commands::Codes => commands::codes::list(),
    };

    if let Err(e) = result {
        eprintln!("Error: could not process file: {e}");
        std::process::exit(1);
    }
}
