//! Health report for the animal API endpoints.

use url::Url;

use crate::category::Category;
use crate::client::{BackoffCalculator, BackoffConfig, Client};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointStatus {
    pub category: Category,
    pub endpoint: Url,
    pub status_code: u16,
    pub reason: String,
}

impl EndpointStatus {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Probe every endpoint in `categories` once, pausing between probes.
///
/// Endpoints whose request fails outright are logged and left out of the
/// result.
#[tracing::instrument(skip_all, fields(count = categories.len()))]
pub async fn check_endpoints(
    client: &Client,
    categories: &[Category],
    pacing: &BackoffConfig,
) -> Result<Vec<EndpointStatus>> {
    let mut backoff = BackoffCalculator::new(pacing)?;
    let mut statuses = Vec::with_capacity(categories.len());

    for (i, &category) in categories.iter().enumerate() {
        let endpoint = client.endpoint(category)?;
        match client.probe(&endpoint).await {
            Ok((status_code, reason)) => {
                tracing::debug!(category = %category, status_code, "Probed endpoint");
                statuses.push(EndpointStatus {
                    category,
                    endpoint,
                    status_code,
                    reason,
                });
            }
            Err(e) => {
                tracing::error!(category = %category, endpoint = %endpoint, error = %e, "Endpoint unreachable");
            }
        }

        if i + 1 < categories.len() {
            tokio::time::sleep(backoff.next_delay()).await;
        }
    }

    Ok(statuses)
}
