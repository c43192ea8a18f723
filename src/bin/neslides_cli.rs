//! NES Slides CLI
//!
//! Commands: encode, export, import, inspect
//! Outputs JSON to stdout (except `encode`, which prints assembly)
//! Returns 1 on I/O or usage errors, 2 on a failed export

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use neslides_core::{
    codec,
    logging::{init_logging, LogConfig, LogFormat},
    persistence, BuildConfig, BuildPipeline, Deck, FormatVersion, LayoutChecker, Slide,
};

#[derive(Parser)]
#[command(name = "neslides-cli")]
#[command(about = "NES Slides CLI - compile text slides into a ROM")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Build configuration (JSON); defaults apply when missing
    #[arg(short, long, default_value = "neslides.json", global = true)]
    config: PathBuf,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the generated assembly for a deck
    Encode {
        deck: PathBuf,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate the artifact and run make clean + make all
    Export { deck: PathBuf },

    /// Build a deck from text files, one slide per file
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, value_enum, default_value_t = BlobFormat::Legacy)]
        format: BlobFormat,
    },

    /// List slides, labels and layout warnings
    Inspect { deck: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum BlobFormat {
    Legacy,
    V1,
}

impl From<BlobFormat> for FormatVersion {
    fn from(format: BlobFormat) -> Self {
        match format {
            BlobFormat::Legacy => FormatVersion::Legacy,
            BlobFormat::V1 => FormatVersion::V1,
        }
    }
}

#[derive(Serialize)]
struct SlideEntry<'a> {
    index: usize,
    label: String,
    text: &'a str,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig::from_verbosity(cli.verbose).with_format(cli.log_format);
    if let Err(e) = init_logging(&log_config) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    match cli.command {
        Commands::Encode { deck, output } => {
            let deck = match read_deck(&deck) {
                Ok(d) => d,
                Err(code) => return code,
            };
            let config = match BuildConfig::load_or_default(&cli.config) {
                Ok(c) => c,
                Err(e) => return fail(&e.to_string()),
            };
            let artifact = codec::encode_labeled(&deck, &config.label);
            match output {
                Some(path) => match fs::write(&path, artifact) {
                    Ok(()) => ExitCode::SUCCESS,
                    Err(e) => fail(&format!("Cannot write {}: {}", path.display(), e)),
                },
                None => {
                    print!("{}", artifact);
                    ExitCode::SUCCESS
                }
            }
        }

        Commands::Export { deck } => {
            let deck = match read_deck(&deck) {
                Ok(d) => d,
                Err(code) => return code,
            };
            let config = match BuildConfig::load_or_default(&cli.config) {
                Ok(c) => c,
                Err(e) => return fail(&e.to_string()),
            };

            let mut pipeline = BuildPipeline::new(config);
            match pipeline.run(&deck) {
                Ok(report) => {
                    print_json(&serde_json::json!({
                        "success": true,
                        "report": report,
                    }));
                    ExitCode::SUCCESS
                }
                Err(failure) => {
                    print_json(&serde_json::json!({
                        "success": false,
                        "reason": failure.reason(),
                        "error": failure.to_string(),
                    }));
                    ExitCode::from(2)
                }
            }
        }

        Commands::Import { files, output, format } => {
            let mut slides = Vec::with_capacity(files.len());
            for file in &files {
                match fs::read_to_string(file) {
                    Ok(text) => slides.push(Slide::from(text)),
                    Err(e) => return fail(&format!("Cannot read {}: {}", file.display(), e)),
                }
            }
            let deck = Deck::from_slides(slides);
            let output = persistence::with_deck_extension(output);

            match persistence::save_versioned_to(&output, &deck, format.into()) {
                Ok(bytes) => {
                    print_json(&serde_json::json!({
                        "success": true,
                        "path": output,
                        "slides": deck.len(),
                        "bytes": bytes,
                    }));
                    ExitCode::SUCCESS
                }
                Err(e) => fail(&e.to_string()),
            }
        }

        Commands::Inspect { deck } => {
            let deck = match read_deck(&deck) {
                Ok(d) => d,
                Err(code) => return code,
            };
            let slides: Vec<_> = deck
                .iter()
                .enumerate()
                .map(|(index, slide)| SlideEntry {
                    index,
                    label: deck.label(index),
                    text: slide.text(),
                })
                .collect();
            let layout = LayoutChecker::new().check(&deck);

            print_json(&serde_json::json!({
                "slides": slides,
                "layout": layout,
            }));
            ExitCode::SUCCESS
        }
    }
}

fn read_deck(path: &Path) -> Result<Deck, ExitCode> {
    persistence::load_from(path)
        .map(Deck::from_slides)
        .map_err(|e| fail(&e.to_string()))
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Failed to serialise output: {}", e),
    }
}

fn fail(message: &str) -> ExitCode {
    print_json(&serde_json::json!({
        "success": false,
        "error": message,
    }));
    ExitCode::FAILURE
}
