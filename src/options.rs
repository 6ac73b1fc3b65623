use anyhow::Result;
use std::net::IpAddr;
use std::path::PathBuf;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/73.0.3683.103 Safari/537.36";

#[derive(Debug, Clone)]
pub struct Options {
    pub target_ip: String,
    pub base_domain: String,
    pub dictionary: Vec<String>,
    pub method: String,
    pub scheme: String,
    pub path: String,
    pub port: Option<u16>,
    pub user_agent: String,
    pub threshold_multiplier: f64,
    pub random_hosts_count: usize,
    pub random_hosts_length: usize,
    pub max_connections: usize,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub debug: bool,
    pub silent: bool,
    pub not_print: bool,
    pub output: Option<PathBuf>,
    pub output_type: String,
    pub gzip: bool,
    pub append: bool,
    pub progress: bool,
    pub progress_interval: u64,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            target_ip: String::new(),
            base_domain: String::new(),
            dictionary: vec![],
            method: "GET".into(),
            scheme: "https".into(),
            path: "/".into(),
            port: None,
            user_agent: DEFAULT_USER_AGENT.into(),
            threshold_multiplier: 0.9,
            random_hosts_count: 5,
            random_hosts_length: 10,
            max_connections: 50,
            connect_timeout_ms: 10_000,
            read_timeout_ms: 10_000,
            debug: false,
            silent: false,
            not_print: false,
            output: None,
            output_type: "txt".into(),
            gzip: false,
            append: false,
            progress: true,
            progress_interval: 1,
        }
    }
}

impl Options {
    /// Validate inputs before any network activity begins.
    pub fn check(&self) -> Result<()> {
        if self.target_ip.parse::<IpAddr>().is_err() {
            anyhow::bail!("invalid target IP: {}", self.target_ip);
        }
        if self.base_domain.trim().is_empty() {
            anyhow::bail!("base domain must not be empty");
        }
        if self.scheme != "http" && self.scheme != "https" {
            anyhow::bail!("unsupported scheme: {}", self.scheme);
        }
        if self.dictionary.is_empty() {
            anyhow::bail!("dictionary is empty");
        }
        if self.random_hosts_count == 0 {
            anyhow::bail!("random hosts count must be > 0");
        }
        if self.random_hosts_length == 0 {
            anyhow::bail!("random host length must be > 0");
        }
        if self.max_connections == 0 {
            anyhow::bail!("max connections must be > 0");
        }
        if !(0.0..=1.0).contains(&self.threshold_multiplier) {
            anyhow::bail!("threshold multiplier must be within [0, 1]");
        }
        Ok(())
    }

    pub fn target_ip_addr(&self) -> Result<IpAddr> {
        Ok(self.target_ip.parse::<IpAddr>()?)
    }
}
