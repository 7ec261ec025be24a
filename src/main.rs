use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use manga_typeset_rust::{Command, Config};

#[derive(Parser, Debug)]
#[command(
    name = "manga-typeset",
    version,
    about = "Rebuild manga speech bubbles from OCR boxes and typeset translations into them"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings", global = true)]
    read_settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose", global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List reconstructed bubbles in reading-row order
    Bubbles(BubblesArgs),
    /// Draw translations over the bubbles of an image
    Overlay(OverlayArgs),
}

#[derive(Args, Debug)]
struct BubblesArgs {
    /// Detection JSON (Vision textAnnotations or [{text, vertices}])
    #[arg(short = 'd', long = "detections")]
    detections: PathBuf,

    /// Print bubbles as JSON
    #[arg(long = "json")]
    json: bool,
}

#[derive(Args, Debug)]
struct OverlayArgs {
    /// Source image
    #[arg(short = 'i', long = "image")]
    image: PathBuf,

    /// Detection JSON (Vision textAnnotations or [{text, vertices}])
    #[arg(short = 'd', long = "detections")]
    detections: PathBuf,

    /// JSON array of replacement strings, one per bubble index
    #[arg(short = 't', long = "translations")]
    translations: Option<PathBuf>,

    /// Output image path
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Output mime type (default: from the output extension, else image/png)
    #[arg(short = 'M', long = "output-mime")]
    output_mime: Option<String>,

    /// Also write bubble/column diagnostics next to the output
    #[arg(long = "debug-bubbles")]
    debug_bubbles: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    manga_typeset_rust::logging::init(cli.verbose)?;

    let command = match cli.command {
        Commands::Bubbles(args) => Command::Bubbles {
            detections: args.detections,
            json: args.json,
        },
        Commands::Overlay(args) => Command::Overlay {
            image: args.image,
            detections: args.detections,
            translations: args.translations,
            output: args.output,
            output_mime: args.output_mime,
            debug_bubbles: args.debug_bubbles,
        },
    };
    let config = Config {
        settings_path: cli.read_settings,
        command,
    };

    let output = manga_typeset_rust::run(config)?;
    println!("{}", output);
    Ok(())
}
