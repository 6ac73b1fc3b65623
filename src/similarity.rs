use std::collections::HashSet;

/// Shingle (n-gram) length used for the Jaccard comparison.
const SHINGLE_LEN: usize = 3;

/// Jaccard similarity over byte shingles, in [0, 1].
/// Exact equality short-circuits to 1.0, which also covers two empty strings.
/// For inputs shorter than `SHINGLE_LEN` the shingle length shrinks to the
/// shorter input so that disjoint short strings still score 0.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let k = SHINGLE_LEN.min(a.len()).min(b.len()).max(1);
    let sa = shingles(a.as_bytes(), k);
    let sb = shingles(b.as_bytes(), k);
    let inter = sa.intersection(&sb).count();
    // a != b and k <= min(len), so at least one side has a shingle
    let union = sa.len() + sb.len() - inter;
    inter as f64 / union as f64
}

fn shingles(s: &[u8], k: usize) -> HashSet<&[u8]> {
    s.windows(k).collect()
}
