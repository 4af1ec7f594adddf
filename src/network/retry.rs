//! Endpoint rotation with bounded, backed-off retries

use std::future::Future;
use std::time::Duration;
use tracing::warn;
use crate::{
    errors::{BotError, BotResult},
    network::{
        client::{ChainClient, Connector},
        pool::EndpointPool,
    },
};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Upper bound on attempts; never more than the pool size.
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub exponential_base: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: u32::MAX,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            exponential_base: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn attempts_for(&self, pool: &EndpointPool) -> u32 {
        let pool_size = u32::try_from(pool.len()).unwrap_or(u32::MAX);
        self.max_attempts.clamp(1, pool_size.max(1))
    }

    pub(crate) fn next_delay(&self, delay: u64) -> u64 {
        let delay = (delay as f64 * self.exponential_base) as u64;
        let delay = delay.min(self.max_delay_ms);
        let jitter = (delay as f64 * 0.1 * (rand::random::<f64>() - 0.5)) as i64;
        delay.saturating_add_signed(jitter)
    }
}

/// Runs `operation` against the pool, one freshly connected endpoint per attempt.
///
/// Each attempt advances the pool once. Transient failures rotate to the next endpoint;
/// any other error is returned immediately. Exhausting the attempts is a `Network` error.
pub async fn with_rotation<K, F, Fut, T>(
    pool: &EndpointPool,
    connector: &K,
    config: &RetryConfig,
    context: &str,
    operation: F,
) -> BotResult<(K::Client, T)>
where
    K: Connector,
    F: Fn(K::Client) -> Fut,
    Fut: Future<Output = BotResult<T>>,
{
    let max_attempts = config.attempts_for(pool);
    let mut delay = config.initial_delay_ms;
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        let endpoint = pool.next();
        let client = connector.connect(endpoint)?;

        match operation(client.clone()).await {
            Ok(value) => return Ok((client, value)),
            Err(e) if e.is_transient() => {
                warn!(
                    "Attempt {}/{} failed for {} on {}: {}",
                    attempt, max_attempts, context, endpoint, e
                );
                last_error = Some(e);
                if attempt < max_attempts && delay > 0 {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    delay = config.next_delay(delay);
                }
            }
            Err(e) => return Err(e),
        }
    }

    Err(BotError::Network {
        message: format!("{} failed after {} attempts", context, max_attempts),
        source: last_error.map(anyhow::Error::from),
        retry_count: max_attempts,
    })
}

/// Checks that some endpoint in the pool answers, returning the client and head block.
pub async fn check_connection<K: Connector>(
    pool: &EndpointPool,
    connector: &K,
    config: &RetryConfig,
) -> BotResult<(K::Client, u64)> {
    with_rotation(pool, connector, config, "connection check", |client| async move {
        client.block_number().await
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::pool::Endpoint;

    fn pool(n: usize) -> EndpointPool {
        let endpoints = (0..n)
            .map(|i| Endpoint::parse(format!("rpc-{}", i), &format!("http://node{}.local", i)).unwrap())
            .collect();
        EndpointPool::new(endpoints).unwrap()
    }

    #[test]
    fn attempts_are_capped_at_pool_size() {
        let config = RetryConfig::default();
        assert_eq!(config.attempts_for(&pool(4)), 4);

        let config = RetryConfig { max_attempts: 2, ..Default::default() };
        assert_eq!(config.attempts_for(&pool(4)), 2);

        let config = RetryConfig { max_attempts: 0, ..Default::default() };
        assert_eq!(config.attempts_for(&pool(3)), 1);
    }

    #[test]
    fn delay_grows_but_respects_ceiling() {
        let config = RetryConfig {
            max_attempts: 5,
            initial_delay_ms: 100,
            max_delay_ms: 1000,
            exponential_base: 2.0,
        };
        let next = config.next_delay(100);
        assert!((190..=210).contains(&next), "got {}", next);
        assert!(config.next_delay(5000) <= 1050);
    }
}
