use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

use camo_proxy::camo::{extract_image_urls, ContentRewriter, ImageReference, LinkBuilder, Signer};
use camo_proxy::lifecycle::startup;

#[derive(Parser)]
#[command(name = "camo-cli")]
#[command(about = "Sign, inspect and test camo proxy links", long_about = None)]
struct Cli {
    /// Config file; defaults plus CAMO_* environment when omitted
    #[arg(short, long, env = "CAMO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query a running proxy's health endpoint
    Status {
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
    #[command(flatten)]
    Offline(OfflineCommand),
}

/// Commands answered from the local configuration alone.
#[derive(Subcommand)]
enum OfflineCommand {
    /// Print the digest for the configured base URL and key
    Sign,
    /// Build the proxied URL for an image
    Link { url: String },
    /// Decode an `image` query parameter back to its locator
    Decode { image: String },
    /// Rewrite image sources in a file (or stdin)
    Rewrite { file: Option<PathBuf> },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Status { url } => {
            let res = reqwest::get(format!("{}/health", url.trim_end_matches('/'))).await?;
            print_response(res).await
        }
        Commands::Offline(command) => run_offline(command, cli.config.as_ref()),
    }
}

fn run_offline(command: OfflineCommand, config: Option<&PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = startup::load(config)?;
    let signer = Signer::new(&config.camo)?;

    match command {
        OfflineCommand::Sign => println!("{}", signer.digest()),
        OfflineCommand::Link { url } => {
            let image = ImageReference::parse(url)?;
            println!("{}", LinkBuilder::new(signer).build(&image));
        }
        OfflineCommand::Decode { image } => {
            let locator = signer.encoding().decode(&image)?;
            println!("{}", String::from_utf8_lossy(&locator));
        }
        OfflineCommand::Rewrite { file } => {
            let content = match file {
                Some(path) => std::fs::read_to_string(path)?,
                None => std::io::read_to_string(std::io::stdin())?,
            };
            let rewrite = ContentRewriter::new(LinkBuilder::new(signer)).rewrite(&content);
            print!("{}", rewrite.content);
            eprintln!(
                "{} of {} image(s) proxied",
                rewrite.images,
                extract_image_urls(&content).len()
            );
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: proxy returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
