mod config;
mod filter;
mod health;
mod model;
mod notifier;
mod parser;
mod poller;
mod scheduler;
mod scraper;
mod storage;

use config::{load_config, AppConfig};
use health::ServiceStatus;
use model::Severity;
use notifier::{DiscordNotifier, Sink};
use parser::OlxParser;
use poller::PollCycle;
use scheduler::Scheduler;
use scraper::HttpScraper;
use std::fmt::Display;
use std::process;
use std::sync::Arc;
use storage::IdentityStore;
use tokio::sync::Notify;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Log details about any panic before the scheduler absorbs it
    std::panic::set_hook(Box::new(|panic_info| {
        error!("😱 Panic occurred: {}", panic_info);
    }));

    let config = load_config().unwrap_or_else(|e| fatal("Configuration error", e));

    let notifier = DiscordNotifier::new(config.webhook_url.clone(), config.webhook_timeout)
        .unwrap_or_else(|e| fatal("Notifier setup failed", e));
    let sink: Arc<dyn Sink> = Arc::new(notifier);

    info!("Sending connection test...");
    if let Err(e) = sink
        .notify_status("Connection test: OLX Sniper is starting up.", Severity::Success)
        .await
    {
        fatal("Webhook self-test failed, fix DISCORD_WEBHOOK before restarting", e);
    }

    let backend = storage::open_backend(&config.store_path)
        .unwrap_or_else(|e| fatal("Cannot open identity store", e));
    let store = IdentityStore::open(backend).unwrap_or_else(|e| fatal("Cannot load identity store", e));

    let scraper = HttpScraper::new(config.search_url.clone(), config.fetch_timeout)
        .unwrap_or_else(|e| fatal("Scraper setup failed", e));
    let parser = OlxParser::new(config.base_url.clone()).unwrap_or_else(|e| fatal("Parser setup failed", e));

    log_banner(&config, &store);

    let cycle = PollCycle::new(
        Box::new(scraper),
        parser,
        store,
        config.keywords.clone(),
        sink.clone(),
    )
    .with_debug_html_dir(config.debug_html_dir.clone());
    if cycle.baseline_pending() {
        info!("Cold start: the first check only records what is already listed.");
    }

    let status = Arc::new(ServiceStatus::new());
    tokio::spawn(health::serve(config.health_addr.clone(), status.clone()));

    let shutdown = Arc::new(Notify::new());
    tokio::spawn(wait_for_signal(shutdown.clone()));

    Scheduler::new(cycle, sink, config.poll_interval, status)
        .run(shutdown)
        .await;
    info!("OLX Sniper stopped.");
}

fn log_banner(config: &AppConfig, store: &IdentityStore) {
    info!("🚀 OLX Sniper started");
    info!("Search URL: {}", config.search_url);
    info!("Keywords ({}): {}", config.keywords.len(), config.keywords.join(", "));
    info!("Interval: {}s", config.poll_interval.as_secs());
    info!("Identity store: {} ({} known)", store.describe(), store.len());
}

fn fatal<E: Display>(context: &str, e: E) -> ! {
    error!("{}: {}", context, e);
    eprintln!("{}: {}", context, e);
    process::exit(1);
}

async fn wait_for_signal(shutdown: Arc<Notify>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("Signal received, finishing current cycle...");
    shutdown.notify_one();
}
