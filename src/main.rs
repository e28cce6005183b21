//! Probable Markets order book scanner entry point.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use rust_decimal::Decimal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use probable_book::alert::{message, TelegramNotifier};
use probable_book::api::{self, AppState};
use probable_book::arbitrage::{MarketProcessor, Scanner};
use probable_book::config::Config;
use probable_book::error::{AppError, MarketError, WatchError};
use probable_book::market::{sort_markets, DiscoveryService, Market, OrderBookClient, Outcome};
use probable_book::metrics;
use probable_book::report::{pretty, JsonlWriter};
use probable_book::utils::{shutdown_channel, sleep_or_shutdown};
use probable_book::watch::{select_target, TriggerOp, WatchSettings, Watcher};

/// Probable Markets order book scanner.
#[derive(Parser, Debug)]
#[command(name = "probable-book")]
#[command(about = "Scans Probable binary markets for best-ask sums below 1 and alerts on Telegram")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,

    /// Run one cycle and exit.
    #[arg(long)]
    once: bool,

    /// Seconds between cycle starts.
    #[arg(long, default_value_t = 60)]
    interval: u64,

    /// Append JSON lines records to this file.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print a human-readable summary.
    #[arg(long)]
    pretty: bool,

    /// Maximum markets to discover (0 = unbounded).
    #[arg(long)]
    max_events: Option<usize>,

    /// Alias of --max-events.
    #[arg(long)]
    max_markets: Option<usize>,

    /// Alert when the best sum of asks is below this value.
    #[arg(long)]
    alert_sum_threshold: Option<Decimal>,

    /// Telegram bot token (overrides TG_BOT_TOKEN).
    #[arg(long)]
    tg_token: Option<String>,

    /// Telegram chat id (overrides TG_CHAT_ID).
    #[arg(long)]
    tg_chat_id: Option<String>,

    /// Print the indexed market list and exit.
    #[arg(long)]
    list_markets: bool,

    /// Watch market at this index of the list.
    #[arg(long)]
    watch_index: Option<usize>,

    /// Side to watch (YES or NO).
    #[arg(long)]
    side: Option<Outcome>,

    /// Best bid trigger price.
    #[arg(long)]
    trigger_price: Option<Decimal>,

    /// Trigger comparison: >=, >, <= or <.
    #[arg(long, default_value = ">=")]
    trigger_op: TriggerOp,

    /// Seconds between watch alerts (0 = no cooldown).
    #[arg(long, default_value_t = 300)]
    alert_cooldown: u64,

    /// Send a Telegram test message and exit.
    #[arg(long)]
    test_telegram: bool,

    /// Serve health and metrics on this port (scan mode only).
    #[arg(long)]
    port: Option<u16>,
}

impl Args {
    /// Discovery bound: the first non-zero of --max-events, --max-markets.
    fn market_limit(&self) -> Option<usize> {
        self.max_events.filter(|&n| n > 0).or(self.max_markets)
    }

    /// No one-shot or watch mode was requested.
    fn is_scan(&self) -> bool {
        !self.test_telegram && !self.list_markets && self.watch_index.is_none()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let loaded = Config::load();
    let level = loaded.as_ref().map_or("info", |c| c.rust_log.as_str());
    init_tracing(args.verbose, args.log_json, level);

    let config = loaded
        .map_err(|e| {
            error!("Failed to load configuration: {}", e);
            AppError::from(e)
        })?
        .with_telegram_overrides(args.tg_token.clone(), args.tg_chat_id.clone());

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(AppError::InvalidConfig(e).into());
    }

    info!(
        tg_token = config.tg_bot_token.as_deref().is_some_and(|t| !t.is_empty()),
        tg_chat_id = config.tg_chat_id.as_deref().is_some_and(|c| !c.is_empty()),
        "Telegram credentials detected"
    );
    if let Some(threshold) = args.alert_sum_threshold {
        info!("Alert sum threshold: {}", threshold);
    }

    if args.port.is_some() && !args.is_scan() {
        warn!("--port only applies to scan mode; no HTTP server will be started");
    }

    if args.test_telegram {
        return cmd_test_telegram(&config).await;
    }
    if args.list_markets {
        return cmd_list_markets(&config, &args).await;
    }
    if let Some(index) = args.watch_index {
        return cmd_watch(&config, &args, index).await;
    }
    cmd_scan(&config, &args).await
}

fn init_tracing(verbose: bool, json: bool, level: &str) {
    let filter = if verbose {
        EnvFilter::new("probable_book=debug,info")
    } else {
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Discover markets and sort them by (title, slug). Empty is an error.
async fn discover_sorted(config: &Config, args: &Args) -> anyhow::Result<Vec<Market>> {
    let discovery = DiscoveryService::new(config)?;
    let mut markets = discovery.discover(args.market_limit()).await;

    if markets.is_empty() {
        error!("No markets found.");
        return Err(AppError::from(MarketError::NoMarketsFound).into());
    }

    sort_markets(&mut markets);
    Ok(markets)
}

/// Send a test message with the configured credentials.
async fn cmd_test_telegram(config: &Config) -> anyhow::Result<()> {
    println!(
        "TG_BOT_TOKEN detected: {}",
        config.tg_bot_token.as_deref().is_some_and(|t| !t.is_empty())
    );
    println!(
        "TG_CHAT_ID detected: {}",
        config.tg_chat_id.as_deref().is_some_and(|c| !c.is_empty())
    );

    let notifier = TelegramNotifier::new(config)?;
    notifier.send(message::TEST_MESSAGE).await.map_err(|e| {
        error!(error = %e, "Telegram test failed");
        AppError::from(e)
    })?;

    println!("Telegram test message sent");
    Ok(())
}

/// Print the indexed market list.
async fn cmd_list_markets(config: &Config, args: &Args) -> anyhow::Result<()> {
    let markets = discover_sorted(config, args).await?;
    println!("{}", pretty::market_list(&markets));
    Ok(())
}

/// Watch one side of one market.
async fn cmd_watch(config: &Config, args: &Args, index: usize) -> anyhow::Result<()> {
    let side = args.side.ok_or(WatchError::MissingArgument("side"))?;
    let trigger_price = args
        .trigger_price
        .ok_or(WatchError::MissingArgument("trigger-price"))?;

    let markets = discover_sorted(config, args).await?;
    let target = select_target(&markets, index, side).map_err(|e| {
        error!("{}", e);
        AppError::from(e)
    })?;

    let settings = WatchSettings {
        trigger_price,
        op: args.trigger_op,
        cooldown: Duration::from_secs(args.alert_cooldown),
        interval: Duration::from_secs(args.interval),
        once: args.once,
        pretty: args.pretty,
    };

    let mut watcher = Watcher::new(
        OrderBookClient::new(config)?,
        target,
        settings,
        TelegramNotifier::new(config)?,
    );

    let mut shutdown = shutdown_channel();
    watcher.run(&mut shutdown).await;
    Ok(())
}

/// Poll every market each interval and alert on the best sum.
async fn cmd_scan(config: &Config, args: &Args) -> anyhow::Result<()> {
    let app_state = match args.port {
        Some(_) => AppState::new().with_prometheus(metrics::install_prometheus()?),
        None => {
            metrics::init_metrics();
            AppState::new()
        }
    };

    let markets = discover_sorted(config, args).await?;

    let processor = MarketProcessor::new(OrderBookClient::new(config)?, config.batch_size);
    let mut scanner = Scanner::new(processor, TelegramNotifier::new(config)?)
        .with_threshold(args.alert_sum_threshold)
        .with_pretty(args.pretty);
    if let Some(path) = &args.out {
        scanner = scanner.with_output(JsonlWriter::new(path));
    }

    let mut shutdown = shutdown_channel();

    if let Some(port) = args.port {
        let state = app_state.clone();
        let mut server_shutdown = shutdown.clone();
        tokio::spawn(async move {
            let stop = async move {
                let _ = server_shutdown.wait_for(|stop| *stop).await;
            };
            if let Err(e) = api::serve(state, port, stop).await {
                warn!(error = %e, "HTTP server stopped");
            }
        });
    }

    info!("Starting fetch loop for {} markets...", markets.len());
    let interval = Duration::from_secs(args.interval);

    loop {
        let started = Instant::now();
        let outcome = scanner.run_cycle(&markets).await;
        app_state.record_cycle(markets.len(), &outcome).await;

        if args.once {
            break;
        }

        let sleep = interval.saturating_sub(started.elapsed());
        if !sleep.is_zero() {
            info!("Sleeping for {:.2}s...", sleep.as_secs_f64());
        }
        if sleep_or_shutdown(sleep, &mut shutdown).await {
            info!("Shutting down");
            break;
        }
    }

    Ok(())
}
