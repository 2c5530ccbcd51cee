// One fetch -> extract -> classify -> notify pass over the search page.
use crate::filter;
use crate::model::{CycleError, Listing, Severity};
use crate::notifier::Sink;
use crate::parser::OlxParser;
use crate::scraper::Scraper;
use crate::storage::IdentityStore;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// First pass after a cold start: everything listed was recorded, nothing sent.
    Baseline { recorded: usize },
    Completed { new: usize, matched: usize, sent: usize },
    /// The page held no recognisable listings; stored state was left alone.
    NoListings,
    /// Already reported to the sink by the cycle itself.
    FetchFailed,
}

impl CycleOutcome {
    pub fn sent(&self) -> usize {
        match self {
            CycleOutcome::Completed { sent, .. } => *sent,
            _ => 0,
        }
    }
}

pub struct PollCycle {
    scraper: Box<dyn Scraper>,
    parser: OlxParser,
    store: IdentityStore,
    keywords: Vec<String>,
    sink: Arc<dyn Sink>,
    baseline_pending: bool,
    debug_html_dir: Option<PathBuf>,
}

impl PollCycle {
    pub fn new(
        scraper: Box<dyn Scraper>,
        parser: OlxParser,
        store: IdentityStore,
        keywords: Vec<String>,
        sink: Arc<dyn Sink>,
    ) -> Self {
        let baseline_pending = store.is_empty();
        Self {
            scraper,
            parser,
            store,
            keywords,
            sink,
            baseline_pending,
            debug_html_dir: None,
        }
    }

    pub fn with_debug_html_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.debug_html_dir = dir;
        self
    }

    pub fn known_count(&self) -> usize {
        self.store.len()
    }

    pub fn baseline_pending(&self) -> bool {
        self.baseline_pending
    }

    pub async fn run(&mut self) -> Result<CycleOutcome, CycleError> {
        info!("Fetching search page...");
        let html = match self.scraper.fetch().await {
            Ok(html) => html,
            Err(e) => {
                warn!("Scraper error: {}", e);
                let message = format!("Failed to fetch the search page: {}", e);
                if let Err(e) = self.sink.notify_status(&message, Severity::Error).await {
                    warn!("Failed to report fetch error: {}", e);
                }
                return Ok(CycleOutcome::FetchFailed);
            }
        };

        info!("Parsing HTML...");
        let (listings, cards) = {
            let document = OlxParser::parse_document(&html);
            let listings: Vec<Listing> = self.parser.listings(&document).collect();
            (listings, self.parser.card_count(&document))
        };
        info!("Extracted {} listings from {} cards", listings.len(), cards);

        if listings.is_empty() {
            warn!("No listings recognised on the page; keeping previous state");
            if let Some(dir) = &self.debug_html_dir {
                save_debug_html(dir, &html);
            }
            return Ok(CycleOutcome::NoListings);
        }

        let mut fresh: Vec<&Listing> = Vec::new();
        for listing in &listings {
            if self.store.contains(&listing.id) {
                debug!("Already known: {}", listing.id);
                continue;
            }
            // Recorded whether or not it matches, so it is never evaluated twice.
            self.store.insert(&listing.id);
            fresh.push(listing);
        }

        // Persist before any notification goes out.
        self.store.flush()?;

        if self.baseline_pending {
            self.baseline_pending = false;
            info!("Baseline recorded: {} listings, notifications suppressed", fresh.len());
            return Ok(CycleOutcome::Baseline {
                recorded: fresh.len(),
            });
        }

        let new = fresh.len();
        let mut matched = 0;
        let mut sent = 0;
        for listing in filter::select_matching(fresh, &self.keywords) {
            matched += 1;
            info!("Sending notification for {} ({})", listing.id, listing.title);
            match self.sink.notify_listing(listing).await {
                Ok(()) => sent += 1,
                Err(e) => warn!("Notification for {} dropped: {}", listing.id, e),
            }
        }

        info!("Cycle done: {} new, {} matched, {} notified", new, matched, sent);
        Ok(CycleOutcome::Completed { new, matched, sent })
    }
}

const DEBUG_HTML_FILE: &str = "debug-latest.html";

/// Saves the fetched page for selector debugging, replacing the previous dump.
fn save_debug_html(folder: &Path, html: &str) {
    if let Err(e) = fs::create_dir_all(folder) {
        warn!("Failed to create debug folder: {}", e);
        return;
    }
    let filename = folder.join(DEBUG_HTML_FILE);
    if let Err(e) = fs::write(&filename, html) {
        warn!("Failed to write debug HTML: {}", e);
    } else {
        info!("Saved debug HTML: {}", filename.display());
    }
}
