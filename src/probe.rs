use crate::options::Options;
use anyhow::Result;
use reqwest::{Client, Method};

/// Status recorded when the request itself failed.
pub const FAILED_STATUS: u16 = 0;

/// Outcome of one probe attempt. Created once, never mutated.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub candidate: String,
    pub content: String,
    pub status: u16,
    pub success: bool,
}

impl ProbeResult {
    pub fn failed(candidate: &str) -> Self {
        ProbeResult {
            candidate: candidate.to_string(),
            content: String::new(),
            status: FAILED_STATUS,
            success: false,
        }
    }
}

/// Issues one request per candidate through the shared transport.
pub struct Prober {
    client: Client,
    method: Method,
    scheme: String,
    base_domain: String,
    path: String,
    port: Option<u16>,
}

impl Prober {
    pub fn new(client: Client, opt: &Options) -> Result<Self> {
        let method = Method::from_bytes(opt.method.as_bytes())
            .map_err(|_| anyhow::anyhow!("invalid HTTP method: {}", opt.method))?;
        Ok(Prober {
            client,
            method,
            scheme: opt.scheme.clone(),
            base_domain: opt.base_domain.trim().trim_end_matches('.').to_string(),
            path: opt.path.clone(),
            port: opt.port,
        })
    }

    /// `scheme://<candidate>.<base_domain>[:port]<path>`. The port must live
    /// in the URL: the resolver override carries no port information.
    pub fn url_for(&self, candidate: &str) -> String {
        match self.port {
            Some(p) => format!("{}://{}.{}:{}{}", self.scheme, candidate, self.base_domain, p, self.path),
            None => format!("{}://{}.{}{}", self.scheme, candidate, self.base_domain, self.path),
        }
    }

    /// Any transport-level error (refused, timeout, TLS, bad response) is
    /// downgraded to a failed result; a single broken host never aborts the run.
    pub async fn probe(&self, candidate: &str) -> ProbeResult {
        let url = self.url_for(candidate);
        let resp = match self.client.request(self.method.clone(), &url).send().await {
            Ok(r) => r,
            Err(e) => {
                eprintln!("[probe] {}: {}", candidate, e);
                return ProbeResult::failed(candidate);
            }
        };
        let status = resp.status().as_u16();
        match resp.text().await {
            Ok(content) => ProbeResult {
                candidate: candidate.to_string(),
                content,
                status,
                success: true,
            },
            Err(e) => {
                eprintln!("[probe] {}: read body: {}", candidate, e);
                ProbeResult::failed(candidate)
            }
        }
    }
}
