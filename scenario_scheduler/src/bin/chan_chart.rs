use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use bar_feed::models::period::Period;
use bar_feed::providers::eastmoney::EastmoneyProvider;
use bar_feed::range::{self, DateSpec};
use chrono::Utc;
use scenario_scheduler::config::{PipelineConfig, load_config_path};
use scenario_scheduler::presentation::csv_file::CsvFileRenderer;
use scenario_scheduler::presentation::{Presentation, present};
use scenario_scheduler::scenario::{EXCHANGE_TZ, Scenario};
use scenario_scheduler::scheduler::Scheduler;

#[derive(Parser)]
#[command(version, about = "Multi-scenario index bar loader")]
struct Cli {
    /// Path to a TOML pipeline config; built-in presets are used when omitted.
    #[arg(long, value_name = "FILE")]
    config: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Fetch every configured scenario concurrently and write an artifact
    /// for each one that becomes ready.
    Run {
        /// Overrides the config's symbol.
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Fetch one ad hoc scenario from explicit date specs.
    Custom {
        #[arg(long)]
        symbol: Option<String>,

        /// Bar granularity: 1, 5, 30, or daily.
        #[arg(long, default_value = "30")]
        period: String,

        /// Window start, MM-DD or YYYY-MM-DD.
        #[arg(long)]
        start: String,

        /// Window end, MM-DD or YYYY-MM-DD.
        #[arg(long)]
        end: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config_path(path)?,
        None => PipelineConfig::presets(),
    };
    let today = Utc::now().with_timezone(&EXCHANGE_TZ).date_naive();

    let (symbol, scenarios) = match &cli.cmd {
        Cmd::Run { symbol } => {
            let symbol = symbol.clone().unwrap_or_else(|| config.symbol.clone());
            (symbol, config.scenarios(today)?)
        }
        Cmd::Custom {
            symbol,
            period,
            start,
            end,
        } => {
            let symbol = symbol.clone().unwrap_or_else(|| config.symbol.clone());
            let period: Period = period.parse()?;
            // Resolve before anything is scheduled; bad input dies here.
            let start: DateSpec = start.parse()?;
            let end: DateSpec = end.parse()?;
            let window = range::resolve(start, end, today)?;
            (
                symbol,
                vec![Scenario::absolute("custom", period, window)],
            )
        }
    };

    let provider = Arc::new(EastmoneyProvider::new()?);
    let scheduler = Scheduler::new(provider, symbol, scenarios, config.timeout());

    scheduler.start_all();
    wait_until_settled(&scheduler).await;

    let renderer = CsvFileRenderer::in_temp_dir();
    for label in scheduler.labels() {
        match present(&scheduler, &label, &renderer).await? {
            Presentation::Rendered(path) => println!("{label}: {}", path.display()),
            Presentation::Failed(error) => println!("{label}: failed: {error}"),
            Presentation::NotReady(phase) => println!("{label}: not ready ({phase:?})"),
        }
    }

    Ok(())
}

/// Poll until every scenario has reached a terminal phase. The per-fetch
/// timeout guarantees this loop ends.
async fn wait_until_settled(scheduler: &Scheduler) {
    loop {
        let settled = scheduler.labels().iter().all(|label| {
            scheduler
                .query(label)
                .is_none_or(|snapshot| snapshot.is_terminal())
        });
        if settled {
            return;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}
