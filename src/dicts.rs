//! Embedded default dictionary.
//! Uses include_str! to embed wordlists/vhosts.txt at compile time.

const EMBEDDED_VHOSTS_TXT: &str = include_str!("../wordlists/vhosts.txt");

/// Return the embedded dictionary as owned Strings (one candidate per line).
pub fn default_wordlist() -> Vec<String> {
    EMBEDDED_VHOSTS_TXT
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.to_string())
        .collect()
}
