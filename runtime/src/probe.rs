//! TCP readiness prober.
//!
//! Gates the container entrypoint: the server process is never started
//! against a database that has not yet accepted a connection. Blocking
//! retry loop with fixed spacing; the attempt budget is exact.

use std::time::Duration;

use tokio::net::TcpStream;
use tracing::{debug, info};

use valhalla_core::error::{DeployError, Result};

/// Default attempt ceiling (one minute at the default spacing).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

/// Default spacing between attempts.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Per-attempt connect timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Wait until `host:port` accepts a TCP connection.
///
/// Returns as soon as a connect succeeds. After exactly `max_attempts`
/// failed attempts returns [`DeployError::Timeout`]. No attempt is
/// made after the budget is spent.
pub async fn wait_for(
    host: &str,
    port: u16,
    max_attempts: u32,
    interval: Duration,
) -> Result<()> {
    let addr = format!("{host}:{port}");
    let target = addr.as_str();
    poll_loop(max_attempts, interval, move || async move {
        match tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(target)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!("connect to {target} failed: {e}");
                false
            }
            Err(_) => {
                debug!("connect to {target} timed out");
                false
            }
        }
    })
    .await
    .map_err(|attempts| DeployError::Timeout {
        host: host.to_string(),
        port,
        attempts,
    })?;
    info!("{addr} is accepting connections");
    Ok(())
}

/// Retry an attempt closure up to `max_attempts` times with fixed
/// spacing. On exhaustion returns the attempt count as the error.
async fn poll_loop<F, Fut>(
    max_attempts: u32,
    interval: Duration,
    mut attempt: F,
) -> std::result::Result<(), u32>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for n in 1..=max_attempts {
        if attempt().await {
            return Ok(());
        }
        if n < max_attempts {
            tokio::time::sleep(interval).await;
        }
    }
    Err(max_attempts)
}
