pub mod ratelimit;

use std::{future::IntoFuture, time::Duration};

use tokio::time::timeout;

#[derive(Debug, thiserror::Error)]
pub enum ClientFail {
    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Default)]
pub struct ThreatControlService;

impl ThreatControlService {
    pub fn new() -> Self {
        Self {}
    }

    /// A `timeout` wrapper that turns an expired deadline into a client failure.
    ///
    /// On expiry the inner future is dropped together with any stream it borrows
    /// or owns.
    pub async fn nuisance<F>(&self, duration: Duration, future: F) -> Result<F::Output, ClientFail>
    where
        F: IntoFuture,
    {
        match timeout(duration, future.into_future()).await {
            Ok(v) => Ok(v),
            Err(_) => Err(ClientFail::Timeout(duration)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn nuisance_passes_through_fast_futures() {
        let threat = ThreatControlService::new();
        let value = threat
            .nuisance(Duration::from_secs(1), async { 7 })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn nuisance_times_out_silent_peers() {
        let threat = ThreatControlService::new();
        let limit = Duration::from_millis(10);
        let result = threat
            .nuisance(limit, std::future::pending::<()>())
            .await;
        assert!(matches!(result, Err(ClientFail::Timeout(d)) if d == limit));
    }
}
