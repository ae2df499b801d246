//! Network reachability probe

use std::time::Duration;

use async_trait::async_trait;

use crate::Result;
use crate::transcribe::Connectivity;

/// Decides whether the network is reachable by fetching a well-known URL
///
/// Fails closed: any error (DNS, connect, timeout) counts as offline.
/// Any HTTP response at all, including an error status, counts as online;
/// the probe measures reachability, not service health.
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    /// Create a new probe
    ///
    /// # Errors
    ///
    /// Returns error if the client can't be built
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Connectivity for HttpProbe {
    async fn is_online(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "connectivity probe failed, assuming offline");
                false
            }
        }
    }
}
