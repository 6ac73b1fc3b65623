use crate::calibrate::{self, is_ok_status, Baseline};
use crate::metrics::{spawn_reporter, Metrics};
use crate::options::Options;
use crate::output::{build_writers, Finding};
use crate::probe::Prober;
use crate::similarity::similarity;
use crate::transport;
use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Summary returned to the caller after the full dictionary has been processed.
pub struct FuzzOutcome {
    pub threshold: f64,
    pub baseline_status: u16,
    pub findings: Vec<Finding>,
    pub probed: u64,
    pub failed: u64,
}

/// Calibration-only entry point: derive and report the baseline, no
/// dictionary pass.
pub async fn run_calibration(opt: Options) -> Result<Baseline> {
    opt.check()?;
    let client = transport::build_client(&opt)?;
    let prober = Prober::new(client, &opt)?;
    let baseline = calibrate::calibrate(&prober, &opt).await?;
    if !opt.silent {
        println!("Similarity threshold is {}", baseline.threshold);
        if !is_ok_status(baseline.reference.status) {
            println!(
                "Non-existent virtual hosts answer with status {}.",
                baseline.reference.status
            );
        }
    }
    Ok(baseline)
}

/// Full run: calibrate, then probe the whole dictionary under the
/// `max_connections` cap and report every candidate that deviates from the
/// baseline by status code or content similarity.
pub async fn run(opt: Options) -> Result<FuzzOutcome> {
    opt.check()?;
    let client = transport::build_client(&opt)?;
    let prober = Arc::new(Prober::new(client, &opt)?);
    let writers = Arc::new(build_writers(
        opt.output.clone(),
        &opt.output_type,
        !opt.not_print,
        opt.gzip,
        opt.append,
    )?);

    // hard barrier: no dictionary probe starts before the baseline exists
    let baseline = calibrate::calibrate(&prober, &opt).await?;
    if !opt.silent {
        println!("Similarity threshold is {}", baseline.threshold);
        if !is_ok_status(baseline.reference.status) {
            println!(
                "Non-existent virtual hosts answer with status {}.",
                baseline.reference.status
            );
        }
        println!("Found virtual hosts:");
    }
    let baseline = Arc::new(baseline);

    let metrics = Metrics::new();
    metrics.total.store(opt.dictionary.len() as u64, Ordering::Relaxed);
    if !opt.silent && opt.progress {
        spawn_reporter(metrics.clone(), opt.progress_interval, false);
    }

    let findings = Arc::new(Mutex::new(Vec::<Finding>::new()));
    let sem = Arc::new(Semaphore::new(opt.max_connections));
    let mut tasks = FuturesUnordered::new();

    for word in opt.dictionary.iter() {
        let word = word.trim().to_string();
        // admission in dictionary order; the owned permit keeps the number of
        // in-flight probe units at or below max_connections
        let permit = sem.clone().acquire_owned().await.unwrap();
        let prober = prober.clone();
        let baseline = baseline.clone();
        let writers = writers.clone();
        let metrics = metrics.clone();
        let findings = findings.clone();
        let debug = opt.debug;
        tasks.push(tokio::spawn(async move {
            let _p = permit;
            metrics.sent.fetch_add(1, Ordering::Relaxed);
            let result = prober.probe(&word).await;
            if !result.success {
                // transport failure carries no signal, never a finding
                metrics.failed.fetch_add(1, Ordering::Relaxed);
                return;
            }
            let score = similarity(&baseline.reference.content, &result.content);
            if result.status != baseline.reference.status || score < baseline.threshold {
                let f = Finding { host: word.clone(), status: result.status, similarity: score };
                for ow in writers.iter() {
                    if let Err(e) = ow.write(&f) {
                        eprintln!("[output] write error: {}", e);
                    }
                }
                metrics.found.fetch_add(1, Ordering::Relaxed);
                findings.lock().unwrap().push(f);
            }
            metrics.ok.fetch_add(1, Ordering::Relaxed);
            if debug {
                eprintln!("[debug] finished {}", word);
            }
        }));
    }

    while let Some(res) = tasks.next().await {
        if let Err(e) = res {
            eprintln!("task join error: {}", e);
        }
    }

    for ow in writers.iter() {
        let _ = ow.close();
    }
    if !opt.silent && opt.progress {
        eprintln!();
    }
    if !opt.silent {
        println!("Virtual hosts fuzzing finished.");
    }

    let findings = findings.lock().unwrap().clone();
    Ok(FuzzOutcome {
        threshold: baseline.threshold,
        baseline_status: baseline.reference.status,
        findings,
        probed: metrics.sent.load(Ordering::Relaxed),
        failed: metrics.failed.load(Ordering::Relaxed),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::atomic::AtomicUsize;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::{Duration, Instant};

    async fn read_host(sock: &mut TcpStream) -> Option<String> {
        let mut buf = vec![0u8; 4096];
        let mut read = 0usize;
        loop {
            match sock.read(&mut buf[read..]).await {
                Ok(0) => break,
                Ok(n) => {
                    read += n;
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                    if read == buf.len() {
                        break;
                    }
                }
                Err(_) => return None,
            }
        }
        let req = String::from_utf8_lossy(&buf[..read]).to_string();
        let host = req.lines().find_map(|l| {
            let (name, value) = l.split_once(':')?;
            if name.eq_ignore_ascii_case("host") {
                Some(value.trim().to_string())
            } else {
                None
            }
        })?;
        // strip :port
        Some(host.split(':').next().unwrap_or("").to_string())
    }

    async fn answer(sock: &mut TcpStream, status: u16, body: &str) {
        let reason = match status {
            200 => "OK",
            404 => "Not Found",
            _ => "Other",
        };
        let resp = format!(
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            reason,
            body.len(),
            body
        );
        let _ = sock.write_all(resp.as_bytes()).await;
        let _ = sock.shutdown().await;
    }

    /// One canned response per connection, chosen by Host header.
    /// `pick` returning None drops the connection without a response.
    async fn spawn_server<F>(pick: F) -> SocketAddr
    where
        F: Fn(&str) -> Option<(u16, String)> + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let pick = Arc::new(pick);
        tokio::spawn(async move {
            loop {
                let (mut sock, _) = match listener.accept().await {
                    Ok(x) => x,
                    Err(_) => break,
                };
                let pick = pick.clone();
                tokio::spawn(async move {
                    let host = match read_host(&mut sock).await {
                        Some(h) => h,
                        None => return,
                    };
                    match pick(&host) {
                        Some((status, body)) => answer(&mut sock, status, &body).await,
                        None => drop(sock),
                    }
                });
            }
        });
        addr
    }

    fn opts_for(addr: SocketAddr, dict: &[&str]) -> Options {
        Options {
            target_ip: "127.0.0.1".into(),
            base_domain: "example.com".into(),
            dictionary: dict.iter().map(|s| s.to_string()).collect(),
            scheme: "http".into(),
            port: Some(addr.port()),
            random_hosts_count: 3,
            max_connections: 10,
            connect_timeout_ms: 2_000,
            read_timeout_ms: 2_000,
            silent: true,
            not_print: true,
            progress: false,
            ..Options::default()
        }
    }

    const CATCH_ALL: &str = "<html><body>default backend - 404 not found</body></html>";

    #[tokio::test]
    async fn uniform_catch_all_yields_no_findings() {
        let addr = spawn_server(|_| Some((404, CATCH_ALL.to_string()))).await;
        let opt = opts_for(addr, &["www", "admin", "test"]);
        let out = run(opt).await.unwrap();
        assert!(out.findings.is_empty(), "unexpected findings: {:?}", out.findings);
        // identical calibration bodies: min pairwise similarity is exactly 1.0
        assert!((out.threshold - 0.9).abs() < 1e-12);
        assert_eq!(out.baseline_status, 404);
        assert_eq!(out.probed, 3);
        assert_eq!(out.failed, 0);
    }

    #[tokio::test]
    async fn distinct_vhost_is_reported() {
        let addr = spawn_server(|host| {
            if host.starts_with("admin.") {
                Some((200, "<html><head><title>Admin Portal</title></head><body>please sign in to continue</body></html>".to_string()))
            } else {
                Some((404, CATCH_ALL.to_string()))
            }
        })
        .await;
        let opt = opts_for(addr, &["www", "admin", "test"]);
        let out = run(opt).await.unwrap();
        assert_eq!(out.findings.len(), 1);
        let f = &out.findings[0];
        assert_eq!(f.host, "admin");
        assert_eq!(f.status, 200);
        assert!(f.similarity < out.threshold);
        assert_eq!(out.probed, 3);
    }

    #[tokio::test]
    async fn dropped_connection_is_skipped_not_reported() {
        let addr = spawn_server(|host| {
            if host.starts_with("bad.") {
                None
            } else {
                Some((404, CATCH_ALL.to_string()))
            }
        })
        .await;
        let opt = opts_for(addr, &["bad", "www", "test"]);
        let out = run(opt).await.unwrap();
        assert!(out.findings.is_empty());
        assert_eq!(out.probed, 3);
        assert_eq!(out.failed, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn inflight_probes_never_exceed_cap() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        {
            let active = active.clone();
            let peak = peak.clone();
            tokio::spawn(async move {
                loop {
                    let (mut sock, _) = match listener.accept().await {
                        Ok(x) => x,
                        Err(_) => break,
                    };
                    let active = active.clone();
                    let peak = peak.clone();
                    tokio::spawn(async move {
                        let cur = active.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(cur, Ordering::SeqCst);
                        if read_host(&mut sock).await.is_some() {
                            tokio::time::sleep(Duration::from_millis(100)).await;
                            answer(&mut sock, 404, CATCH_ALL).await;
                        }
                        active.fetch_sub(1, Ordering::SeqCst);
                    });
                }
            });
        }
        let mut opt = opts_for(addr, &["a", "b", "c", "d", "e"]);
        opt.max_connections = 2;
        opt.random_hosts_count = 1;
        let start = Instant::now();
        let out = run(opt).await.unwrap();
        assert!(out.findings.is_empty());
        assert_eq!(out.probed, 5);
        assert!(peak.load(Ordering::SeqCst) <= 2, "peak concurrency {} > 2", peak.load(Ordering::SeqCst));
        // 1 calibration wave + ceil(5/2) dictionary waves at ~100ms each
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test]
    async fn calibration_only_reports_threshold() {
        let addr = spawn_server(|_| Some((404, CATCH_ALL.to_string()))).await;
        let opt = opts_for(addr, &["www"]);
        let b = run_calibration(opt).await.unwrap();
        assert!((b.threshold - 0.9).abs() < 1e-12);
        assert_eq!(b.reference.status, 404);
    }

    #[tokio::test]
    async fn unreachable_target_fails_calibration() {
        // bind then drop: nothing listens on this port
        let addr = {
            let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
            l.local_addr().unwrap()
        };
        let mut opt = opts_for(addr, &["www"]);
        opt.connect_timeout_ms = 500;
        opt.read_timeout_ms = 500;
        assert!(run(opt).await.is_err());
    }
}
