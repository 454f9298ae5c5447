use carlister_core::InventoryType;
use carlister_scraper::params::DEFAULT_SRP_VARIATION;
use carlister_scraper::{CarGurusScraper, DealerInput, ScraperError, SearchInput};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "carlister")]
#[command(about = "Scrape vehicle listings from CarGurus")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape a single listing by URL
    Scrape {
        url: String,
    },
    /// Run one page of a generic inventory search
    Search(SearchArgs),
    /// Fetch one page of a dealer's inventory
    Dealer(DealerArgs),
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Five-digit US zip code
    #[arg(long)]
    zip: String,
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..=500))]
    distance: u32,
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,
    #[arg(long, default_value = DEFAULT_SRP_VARIATION)]
    sort_variation: String,
    #[arg(long, default_value_t = 1)]
    new_used: u8,
}

impl SearchArgs {
    fn into_input(self) -> Result<SearchInput, ScraperError> {
        let input = SearchInput {
            zip: self.zip.trim().to_owned(),
            distance: self.distance,
            page: self.page,
            sort_variation: self.sort_variation,
            new_used: self.new_used,
        };
        input.validate()?;
        Ok(input)
    }
}

#[derive(Debug, Args)]
struct DealerArgs {
    #[arg(long)]
    dealer_entity_id: String,
    /// Dealer landing page on cargurus.com
    #[arg(long)]
    dealer_url: String,
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,
    #[arg(long, default_value_t = InventoryType::All)]
    inventory_type: InventoryType,
}

impl DealerArgs {
    fn into_input(self) -> Result<DealerInput, ScraperError> {
        let input = DealerInput {
            dealer_entity_id: self.dealer_entity_id.trim().to_owned(),
            dealer_url: self.dealer_url.trim().to_owned(),
            page: self.page,
            inventory_type: self.inventory_type,
        };
        input.validate()?;
        Ok(input)
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = carlister_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let scraper = CarGurusScraper::from_config(&config)?;

    match cli.command {
        Commands::Scrape { url } => {
            let record = scraper.scrape_detail(&url).await?;
            print_json(&record)?;
        }
        Commands::Search(args) => {
            let input = args.into_input()?;
            let result = scraper.search_inventory(&input).await;
            print_json(&result)?;
            if !result.success {
                anyhow::bail!(
                    "search failed: {}",
                    result.error_message.unwrap_or_default()
                );
            }
        }
        Commands::Dealer(args) => {
            let input = args.into_input()?;
            let result = scraper.scrape_dealer_page(&input).await;
            print_json(&result)?;
            if !result.success {
                anyhow::bail!(
                    "dealer fetch failed: {}",
                    result.error_message.unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}
