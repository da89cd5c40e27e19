//! Command-line interface for stock-picker

mod check;
mod report;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use picker_core::ScoringModel;
use picker_llm::LLMProvider;
use picker_llm::providers::{OpenAIConfig, OpenAIProvider};
use picker_stock::{
    AlphaVantageClient, Market, PickerEngine, StockConfig, Universe, YahooDataSource,
    YahooFinanceClient,
};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "picker")]
#[command(about = "Rank a stock universe by momentum and fundamentals", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch data, rank the universe and print the top picks
    Run(RunArgs),
    /// Check that every external API answers
    Check,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Scoring model: fundamental or price-action
    #[arg(long, default_value = "fundamental")]
    model: ScoringModel,

    /// Comma-separated symbols replacing the built-in universe
    #[arg(long, value_delimiter = ',')]
    symbols: Vec<String>,

    /// Comma-separated markets (france, asia, us) to draw the universe from
    #[arg(long, value_delimiter = ',', conflicts_with = "symbols")]
    markets: Vec<Market>,

    /// Skip the LLM commentary
    #[arg(long)]
    no_commentary: bool,

    /// Also fetch Alpha Vantage news sentiment (one extra request per ticker)
    #[arg(long)]
    news_sentiment: bool,

    /// Re-run every N minutes (1-30, 30 when no value is given)
    #[arg(
        long,
        value_name = "MINUTES",
        num_args = 0..=1,
        default_missing_value = "30",
        value_parser = clap::value_parser!(u64).range(1..=30)
    )]
    watch: Option<u64>,

    /// Tickers fetched concurrently
    #[arg(long, default_value_t = 4)]
    concurrency: usize,

    /// Print the cycle report as JSON
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn universe(&self) -> Universe {
        if !self.symbols.is_empty() {
            Universe::from_symbols(&self.symbols)
        } else if !self.markets.is_empty() {
            Universe::for_markets(&self.markets)
        } else {
            Universe::default_universe()
        }
    }

    fn stock_config(&self) -> picker_stock::Result<StockConfig> {
        let mut builder = StockConfig::builder()
            .with_env_all_keys()
            .scoring_model(self.model)
            .universe(self.universe())
            .fetch_concurrency(self.concurrency)
            .news_sentiment(self.news_sentiment);
        if let Some(minutes) = self.watch {
            builder = builder.refresh_interval_minutes(minutes);
        }
        builder.build()
    }
}

/// OpenAI provider when `OPENAI_API_KEY` is set
fn openai_provider() -> anyhow::Result<Option<Arc<dyn LLMProvider>>> {
    match OpenAIConfig::from_env() {
        Ok(config) => {
            let provider: Arc<dyn LLMProvider> = Arc::new(OpenAIProvider::with_config(config)?);
            Ok(Some(provider))
        }
        Err(e) => {
            debug!(error = %e, "OpenAI provider not configured");
            Ok(None)
        }
    }
}

async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = args.stock_config().context("invalid configuration")?;
    let source = Arc::new(YahooDataSource::from_config(&config)?);

    let mut engine = PickerEngine::new(source, openai_provider()?, &config);
    if args.no_commentary {
        engine = engine.without_commentary();
    }

    info!(
        model = %config.scoring_model,
        universe = engine.universe().len(),
        "starting stock picker"
    );

    loop {
        let report = engine.run_cycle().await?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print!("{}", report::render(&report));
        }

        if args.watch.is_none() {
            break;
        }

        println!(
            "\nData refreshes every {} minutes. Press Ctrl+C to stop.\n",
            config.refresh_minutes()
        );
        tokio::select! {
            () = tokio::time::sleep(config.refresh_interval) => {}
            result = tokio::signal::ctrl_c() => {
                result?;
                break;
            }
        }
    }

    Ok(())
}

async fn check_apis() -> anyhow::Result<()> {
    let config = StockConfig::default().with_env_all_keys();
    let provider = openai_provider()?;
    let alpha_vantage = config
        .alpha_vantage_api_key
        .as_ref()
        .map(|key| AlphaVantageClient::new(key.clone(), config.alpha_vantage_rate_limit));

    println!("Testing APIs...");
    let yahoo = check::check_yahoo(&YahooFinanceClient::new()).await;
    println!("Yahoo Finance: {yahoo}");
    let openai = check::check_openai(provider.as_deref(), &config.openai_model).await;
    println!("OpenAI: {openai}");
    let av = check::check_alpha_vantage(alpha_vantage.as_ref()).await;
    println!("Alpha Vantage: {av}");

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = picker_utils::Config::from_env();
    picker_utils::init_tracing_with(&app_config);

    let cli = Cli::parse();
    debug!(app = %app_config.app_name, environment = %app_config.environment, "parsed arguments");

    match cli.command {
        Command::Run(args) => run(args).await,
        Command::Check => check_apis().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("picker").chain(args.iter().copied())).unwrap()
    }

    fn run_args(args: &[&str]) -> RunArgs {
        match parse(args).command {
            Command::Run(run) => run,
            Command::Check => panic!("expected run"),
        }
    }

    #[test]
    fn test_run_defaults() {
        let args = run_args(&["run"]);
        assert_eq!(args.model, ScoringModel::Fundamental);
        assert!(args.watch.is_none());
        assert_eq!(args.universe().len(), 31);

        let config = args.stock_config().unwrap();
        assert_eq!(config.refresh_minutes(), 30);
        assert_eq!(config.fetch_concurrency, 4);
        assert!(!config.news_sentiment);
    }

    #[test]
    fn test_news_sentiment_is_opt_in() {
        let args = run_args(&["run", "--news-sentiment"]);
        assert!(args.stock_config().unwrap().news_sentiment);
    }

    #[test]
    fn test_run_with_symbols_and_model() {
        let args = run_args(&["run", "--model", "price-action", "--symbols", "nvda,AMD,coin"]);
        assert_eq!(args.model, ScoringModel::PriceAction);
        assert_eq!(args.universe().symbols(), ["NVDA", "AMD", "COIN"]);
    }

    #[test]
    fn test_run_with_markets() {
        let args = run_args(&["run", "--markets", "us,france"]);
        let universe = args.universe();
        assert_eq!(universe.len(), 21);
        assert_eq!(universe.symbols()[0], "NVDA");
    }

    #[test]
    fn test_watch_interval() {
        assert_eq!(run_args(&["run", "--watch"]).watch, Some(30));
        let args = run_args(&["run", "--watch", "5"]);
        assert_eq!(args.watch, Some(5));
        assert_eq!(args.stock_config().unwrap().refresh_minutes(), 5);

        let too_long = ["picker", "run", "--watch", "45"];
        assert!(Cli::try_parse_from(too_long).is_err());
        let too_short = ["picker", "run", "--watch", "0"];
        assert!(Cli::try_parse_from(too_short).is_err());
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        assert!(Cli::try_parse_from(["picker", "run", "--model", "weighted"]).is_err());
    }

    #[test]
    fn test_check_subcommand() {
        assert!(matches!(parse(&["check"]).command, Command::Check));
    }
}
