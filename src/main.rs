//! camo-proxy: signed image proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!   Host renders content ──▶ POST /render ──▶ hooks::CamoProxy::render
//!                                               │ camo::extractor
//!                                               │ camo::link (signer + codec)
//!                                               ▼ camo::rewriter
//!   Browser <img src=".../camo?digest=..&image=.."> ──▶ GET /camo
//!                                               │ serve (verify, mime)
//!                                               ▼ serve::upstream ──▶ image host
//!
//!   Cross-cutting: config (TOML + env + hot reload), security (groups),
//!   observability (tracing, prometheus), lifecycle (signals, shutdown)
//! ```

use clap::Parser;
use std::path::PathBuf;

use camo_proxy::lifecycle::startup;

#[derive(Parser)]
#[command(name = "camo-proxy", version, about = "Signed image proxy", long_about = None)]
struct Args {
    /// Path to the TOML config file. Without it, defaults plus CAMO_*
    /// environment variables are used and hot reload is off.
    #[arg(short, long, env = "CAMO_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    startup::run(args.config).await
}
