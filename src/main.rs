// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};

mod cli;

#[derive(Parser)]
#[command(name = "videoio")]
#[command(about = "Probe, grab and copy video sources addressed by URI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a video URI and print its properties
    Info {
        /// Video URI, e.g. test:[size=320x240]// or usb-video:///dev/video0
        uri: String,

        /// Print machine-readable JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Grab frames from a capture URI and save them as images
    Grab {
        /// Capture URI
        uri: String,

        /// Number of frames to grab
        #[arg(short = 'n', long, default_value = "1")]
        frames: usize,

        /// Output pattern (default: videoio_TIMESTAMP_%04d.png)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Copy frames from a capture URI into a record URI
    Copy {
        /// Capture URI to read from
        input: String,

        /// Record URI to write to, e.g. file:///cap/run.rv
        output: String,

        /// Number of frames to copy (0 = until the source ends)
        #[arg(short = 'n', long, default_value = "0")]
        frames: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=videoio=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { uri, json } => cli::info(&uri, json),
        Commands::Grab {
            uri,
            frames,
            output,
        } => cli::grab(&uri, frames, output),
        Commands::Copy {
            input,
            output,
            frames,
        } => cli::copy(&input, &output, frames),
    }
}
