use std::io::{stderr, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::time::{interval, Duration, Instant};

#[derive(Default)]
pub struct Metrics {
    pub total: AtomicU64,
    pub sent: AtomicU64,
    pub ok: AtomicU64,
    pub failed: AtomicU64,
    pub found: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn finished(&self) -> u64 {
        self.ok.load(Ordering::Relaxed) + self.failed.load(Ordering::Relaxed)
    }
}

fn colorize(enabled: bool, code: &str, s: String) -> String {
    if enabled { format!("\x1b[{}m{}\x1b[0m", code, s) } else { s }
}

/// Periodic `\r[stat]` line on stderr: percent, counters, rate, ETA.
pub fn spawn_reporter(m: Arc<Metrics>, interval_secs: u64, color: bool) {
    tokio::spawn(async move {
        let mut last_sent = 0u64;
        let start = Instant::now();
        let mut tick = interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            tick.tick().await;
            let total = m.total.load(Ordering::Relaxed);
            let sent = m.sent.load(Ordering::Relaxed);
            let ok = m.ok.load(Ordering::Relaxed);
            let failed = m.failed.load(Ordering::Relaxed);
            let found = m.found.load(Ordering::Relaxed);
            let finished = ok + failed;
            let d_sent = sent.saturating_sub(last_sent);
            last_sent = sent;

            let rate = d_sent as f64 / (interval_secs.max(1) as f64);
            let remain = total.saturating_sub(finished) as f64;
            let eta_secs = if rate > 0.0 { (remain / rate) as u64 } else { 0 };
            let percent = if total > 0 { (finished as f64 / total as f64) * 100.0 } else { 0.0 };
            let inflight = sent.saturating_sub(finished);
            let elapsed = start.elapsed().as_secs();

            let pct = colorize(color, "32", format!("{:>5.1}%", percent));
            let fnd = colorize(color, "33", format!("{}", found));
            let mut err = stderr();
            let _ = write!(
                err,
                "\r[stat] {} | total={} fin={} inflight={} found={} fail={} rate/s={:.0} ETA={}s elapsed={}s",
                pct, total, finished, inflight, fnd, failed, rate, eta_secs, elapsed
            );
            let _ = err.flush();
        }
    });
}
