use crate::options::Options;
use crate::resolver::FixedResolver;
use anyhow::Result;
use reqwest::{redirect, Client};
use std::sync::Arc;
use std::time::Duration;

/// Build the shared probe client. Constructed once per run; every probe task
/// holds a clone (reqwest clients are cheap handles over one pool).
///
/// Certificate and hostname checks are off on purpose: colocated vhosts
/// rarely present a certificate matching a fuzzed name. At most one redirect
/// is followed so a catch-all redirect still yields comparable content.
pub fn build_client(opt: &Options) -> Result<Client> {
    let resolver = Arc::new(FixedResolver::new(opt.target_ip_addr()?));
    let client = Client::builder()
        .dns_resolver(resolver)
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .redirect(redirect::Policy::limited(1))
        .connect_timeout(Duration::from_millis(opt.connect_timeout_ms))
        .timeout(Duration::from_millis(opt.read_timeout_ms))
        .user_agent(opt.user_agent.clone())
        .pool_max_idle_per_host(1)
        .tcp_nodelay(true)
        .build()?;
    Ok(client)
}
