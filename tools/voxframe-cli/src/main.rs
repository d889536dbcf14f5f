//! voxframe CLI - encode and inspect block-sparse volume frames
//!
//! # Commands
//!
//! - `voxframe encode` - Rasterize a scene file and write a compressed frame
//! - `voxframe inspect` - Decompress a frame file and summarize its grids
//! - `voxframe roundtrip` - Encode, compress, decompress and decode a scene,
//!   reporting the per-channel error
//!
//! # Usage
//!
//! ```bash
//! # Encode scene.toml into scene.vxrf
//! voxframe encode scene.toml
//!
//! # Keep only some channels
//! voxframe encode scene.toml --channels density,temperature -o smoke.vxrf
//!
//! # Inspect, restoring absolute coordinates
//! voxframe inspect smoke.vxrf --offset -16,0,8
//!
//! # Full round trip as JSON
//! voxframe roundtrip scene.toml --json
//! ```
//!
//! Set `RUST_LOG=voxframe=debug` for per-stage logging.

mod encode;
mod inspect;
mod report;
mod roundtrip;
mod scene;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// voxframe CLI - block-sparse frame codec tools
#[derive(Parser)]
#[command(name = "voxframe")]
#[command(about = "Encode and inspect block-sparse volume frames")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rasterize a scene file and write a compressed frame
    Encode(encode::EncodeArgs),

    /// Decompress a frame file and summarize its grids
    Inspect(inspect::InspectArgs),

    /// Encode → compress → decompress → decode, with error report
    Roundtrip(roundtrip::RoundtripArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Encode(args) => encode::execute(args),
        Commands::Inspect(args) => inspect::execute(args),
        Commands::Roundtrip(args) => roundtrip::execute(args),
    }
}
