//! Internet reachability check run before network-bound commands.

use std::time::Duration;

use tokio::net::{TcpStream, lookup_host};

pub const DEFAULT_PROBE_ADDRESS: &str = "one.one.one.one:80";
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Resolve `address` and open a TCP connection to it within `timeout`.
pub async fn check_internet_connection(address: &str, timeout: Duration) -> bool {
    let attempt = async {
        let target = lookup_host(address).await?.next().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses resolved")
        })?;
        TcpStream::connect(target).await?;
        Ok::<_, std::io::Error>(())
    };

    match tokio::time::timeout(timeout, attempt).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::debug!(address, error = %e, "Connectivity check failed");
            false
        }
        Err(_) => {
            tracing::debug!(address, timeout_ms = timeout.as_millis() as u64, "Connectivity check timed out");
            false
        }
    }
}
