use crate::options::Options;
use crate::probe::{ProbeResult, Prober};
use crate::similarity::similarity;
use anyhow::Result;
use futures::future::join_all;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Calibrated reference for "this virtual host does not exist".
/// Computed once before the dictionary pass, read-only afterwards.
#[derive(Debug, Clone)]
pub struct Baseline {
    pub reference: ProbeResult,
    pub threshold: f64,
}

const LABEL_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Random labels that almost certainly do not exist as subdomains.
pub fn random_labels(count: usize, length: usize) -> Vec<String> {
    let mut rng = ChaCha20Rng::from_entropy();
    (0..count)
        .map(|_| {
            (0..length)
                .map(|_| LABEL_CHARSET[rng.gen_range(0..LABEL_CHARSET.len())] as char)
                .collect()
        })
        .collect()
}

/// Probe the random labels concurrently, wait for all of them, then derive
/// the similarity threshold from their pairwise agreement. This is a hard
/// barrier: no dictionary probe starts before it returns.
pub async fn calibrate(prober: &Prober, opt: &Options) -> Result<Baseline> {
    let labels = random_labels(opt.random_hosts_count, opt.random_hosts_length);
    let results = join_all(labels.iter().map(|l| prober.probe(l))).await;
    build_baseline(results, opt.threshold_multiplier, opt.debug)
}

/// Reduce calibration probes to a baseline. Failed probes carry no signal and
/// are dropped first; if nothing is left the run cannot be calibrated and
/// must abort. The pairwise scores are reduced by minimum: the threshold has
/// to tolerate the worst agreement seen among known-absent hosts, and the
/// multiplier then loosens it further against nondeterministic responses.
pub fn build_baseline(results: Vec<ProbeResult>, multiplier: f64, debug: bool) -> Result<Baseline> {
    let ok: Vec<ProbeResult> = results.into_iter().filter(|r| r.success).collect();
    if ok.is_empty() {
        anyhow::bail!("calibration failed: all random host probes failed, no baseline available");
    }
    let mut min_similarity = 1.0f64;
    for i in ok.iter() {
        for j in ok.iter() {
            let s = similarity(&i.content, &j.content);
            if debug {
                eprintln!("[calib] similarity of {} and {} = {:.4}", i.candidate, j.candidate, s);
            }
            if s < min_similarity {
                min_similarity = s;
            }
        }
    }
    let threshold = min_similarity * multiplier;
    let reference = ok.into_iter().next().unwrap();
    Ok(Baseline { reference, threshold })
}

pub fn is_ok_status(status: u16) -> bool {
    (200..=299).contains(&status)
}
