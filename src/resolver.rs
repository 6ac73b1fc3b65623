use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use std::net::{IpAddr, SocketAddr};

/// DNS resolver that maps every hostname to one fixed address.
///
/// The Host header / SNI value varies per probe but all traffic must reach the
/// configured target IP, so real DNS is never consulted. Resolution cannot
/// fail. The port is a placeholder; reqwest takes the port from the URL.
#[derive(Debug, Clone)]
pub struct FixedResolver {
    addr: SocketAddr,
}

impl FixedResolver {
    pub fn new(ip: IpAddr) -> Self {
        FixedResolver { addr: SocketAddr::new(ip, 0) }
    }

    pub fn ip(&self) -> IpAddr {
        self.addr.ip()
    }
}

impl Resolve for FixedResolver {
    fn resolve(&self, _name: Name) -> Resolving {
        let addr = self.addr;
        Box::pin(async move {
            let addrs: Addrs = Box::new(std::iter::once(addr));
            Ok(addrs)
        })
    }
}
