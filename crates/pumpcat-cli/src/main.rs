use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "pumpcat")]
#[command(about = "Wilo catalog scraper and Shopify uploader")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape the catalog page and export the extracted products.
    Scrape {
        /// Catalog entry URL (defaults to PUMPCAT_CATALOG_URL).
        #[arg(long)]
        url: Option<String>,
        /// Cap on products scraped from the category.
        #[arg(long)]
        max_products: Option<usize>,
        /// Output JSON file.
        #[arg(long, default_value = "exports/products.json")]
        output: PathBuf,
        /// Additionally write a CSV view next to the JSON.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Scrape the selection tool's result grid for a country.
    Select {
        /// Country key (defaults to PUMPCAT_COUNTRY).
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        max_products: Option<usize>,
        #[arg(long, default_value = "exports/selection.json")]
        output: PathBuf,
    },
    /// Upload previously exported products to the configured Shopify store.
    Upload {
        /// JSON file produced by `scrape` or `select`.
        #[arg(long)]
        input: PathBuf,
        /// Delay between product uploads in milliseconds.
        #[arg(long)]
        delay_ms: Option<u64>,
    },
    /// Convert an exported JSON file to CSV.
    Export {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Verify the configured Shopify credentials.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = pumpcat_core::load_app_config_from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Scrape {
            url,
            max_products,
            output,
            csv,
        } => commands::scrape(&config, url, max_products, &output, csv.as_deref()).await,
        Commands::Select {
            country,
            max_products,
            output,
        } => commands::select(&config, country, max_products, &output).await,
        Commands::Upload { input, delay_ms } => {
            commands::upload(&config, &input, delay_ms).await
        }
        Commands::Export { input, output } => commands::export(&input, &output),
        Commands::Check => commands::check(&config).await,
    }
}
