pub mod types;
pub mod config;
pub mod data;
pub mod processing;
pub mod colormap;
pub mod render;
pub mod report;
pub mod server;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the dashboard page to an HTML file
    Generate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Serve the dashboard, re-rendering it for every page view
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate { config } => {
            println!("Generating dashboard with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            let page = report::render_dashboard(&app_config)?;

            let out = &app_config.output.html;
            if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create output directory: {:?}", dir))?;
            }
            fs::write(out, page)
                .with_context(|| format!("Failed to write dashboard: {:?}", out))?;

            println!("Generation complete! Wrote {:?}", out);
        }
        Commands::Serve { config } => {
            println!("Serving dashboard with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            server::start_server(app_config).await?;
        }
    }

    Ok(())
}
