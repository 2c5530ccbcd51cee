// Read-only liveness endpoint for uptime pingers.
use axum::extract::State;
use axum::routing::get;
use axum::Router;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tracing::{error, info};

/// Counters published by the poll loop. Readers only ever load them.
#[derive(Debug)]
pub struct ServiceStatus {
    known: AtomicUsize,
    cycles: AtomicU64,
    notified: AtomicU64,
    start_time: Instant,
}

impl Default for ServiceStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceStatus {
    pub fn new() -> Self {
        Self {
            known: AtomicUsize::new(0),
            cycles: AtomicU64::new(0),
            notified: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn set_known(&self, count: usize) {
        self.known.store(count, Ordering::Relaxed);
    }

    pub fn record_cycle(&self, sent: usize) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.notified.fetch_add(sent as u64, Ordering::Relaxed);
    }

    pub fn known(&self) -> usize {
        self.known.load(Ordering::Relaxed)
    }

    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    pub fn notified(&self) -> u64 {
        self.notified.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

pub fn router(status: Arc<ServiceStatus>) -> Router {
    Router::new()
        .route("/", get(status_page))
        .route("/health", get(|| async { "ok" }))
        .with_state(status)
}

async fn status_page(State(status): State<Arc<ServiceStatus>>) -> String {
    format!(
        "OLX Sniper is running.\nKnown listings: {}\nCycles: {}\nNotifications sent: {}\nUptime: {}\n",
        status.known(),
        status.cycles(),
        status.notified(),
        format_uptime(status.uptime())
    )
}

/// Serves until the process exits. Bind or serve errors are logged, never fatal.
pub async fn serve(addr: String, status: Arc<ServiceStatus>) {
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Health endpoint could not bind {}: {}", addr, e);
            return;
        }
    };
    info!("▶️ Health endpoint listening on {}", addr);
    if let Err(e) = axum::serve(listener, router(status)).await {
        error!("Health endpoint stopped: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{self, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt as _;

    const BODY_LIMIT: usize = 64 * 1024;

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let req = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .expect("build request");
        let resp = app.oneshot(req).await.expect("oneshot");
        let status = resp.status();
        let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
            .await
            .expect("read body");
        (status, String::from_utf8(bytes.to_vec()).expect("utf8"))
    }

    #[tokio::test]
    async fn status_page_reports_snapshot() {
        let status = Arc::new(ServiceStatus::new());
        status.set_known(42);
        status.record_cycle(2);
        status.record_cycle(1);

        let (code, body) = get_body(router(status), "/").await;

        assert_eq!(code, StatusCode::OK);
        assert!(body.contains("Known listings: 42"));
        assert!(body.contains("Cycles: 2"));
        assert!(body.contains("Notifications sent: 3"));
        assert!(body.contains("Uptime: 00:00:"));
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let (code, body) = get_body(router(Arc::new(ServiceStatus::new())), "/health").await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[test]
    fn uptime_is_hours_minutes_seconds() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_uptime(Duration::from_secs(3 * 3600 + 25 * 60 + 7)), "03:25:07");
        assert_eq!(format_uptime(Duration::from_secs(100 * 3600)), "100:00:00");
    }
}
