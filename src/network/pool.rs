//! Round-robin pool of RPC endpoints

use reqwest::Url;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use crate::errors::{BotError, BotResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Where the URL came from, e.g. `ETH_MAINNET_RPC_URL`. Safe to log.
    pub label: String,
    pub url: Url,
}

impl Endpoint {
    pub fn parse(label: impl Into<String>, raw: &str) -> BotResult<Self> {
        let label = label.into();
        let url = Url::parse(raw.trim()).map_err(|e| {
            BotError::config(format!("Invalid RPC URL for {}: {}", label, e))
        })?;
        Ok(Self { label, url })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // URLs often embed API keys, so only the label and host are shown
        match self.url.host_str() {
            Some(host) => write!(f, "{} ({})", self.label, host),
            None => write!(f, "{}", self.label),
        }
    }
}

/// Fixed, ordered, non-empty set of endpoints traversed cyclically.
///
/// Not health-aware: callers that hit a failure simply ask for `next()` again.
/// The cursor is atomic so the pool can be shared behind an `Arc`.
#[derive(Debug)]
pub struct EndpointPool {
    endpoints: Vec<Endpoint>,
    cursor: AtomicUsize,
    rotations: AtomicU64,
}

impl EndpointPool {
    pub fn new(endpoints: Vec<Endpoint>) -> BotResult<Self> {
        if endpoints.is_empty() {
            return Err(BotError::config("Endpoint pool needs at least one RPC endpoint"));
        }
        Ok(Self {
            endpoints,
            cursor: AtomicUsize::new(0),
            rotations: AtomicU64::new(0),
        })
    }

    /// Builds a pool from `(label, url)` pairs, skipping unset or blank entries.
    pub fn from_urls<I, L, U>(entries: I) -> BotResult<Self>
    where
        I: IntoIterator<Item = (L, Option<U>)>,
        L: Into<String>,
        U: AsRef<str>,
    {
        let mut endpoints = Vec::new();
        for (label, url) in entries {
            let Some(url) = url else { continue };
            if url.as_ref().trim().is_empty() {
                continue;
            }
            endpoints.push(Endpoint::parse(label, url.as_ref())?);
        }
        if endpoints.is_empty() {
            return Err(BotError::config(
                "No RPC endpoint configured: every endpoint entry is empty or unset",
            ));
        }
        Self::new(endpoints)
    }

    /// Starts the rotation at `offset` (modulo the pool size).
    pub fn with_offset(self, offset: usize) -> Self {
        self.cursor.store(offset % self.endpoints.len(), Ordering::Relaxed);
        self
    }

    /// Returns the endpoint under the cursor and advances it, wrapping after the last one.
    pub fn next(&self) -> &Endpoint {
        let len = self.endpoints.len();
        let index = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some((c + 1) % len))
            .unwrap_or_else(|c| c);
        self.rotations.fetch_add(1, Ordering::Relaxed);
        &self.endpoints[index]
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Index the next call to `next()` will return.
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// Total number of `next()` calls so far.
    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(n: usize) -> EndpointPool {
        let endpoints = (0..n)
            .map(|i| Endpoint::parse(format!("rpc-{}", i), &format!("http://node{}.local:8545", i)).unwrap())
            .collect();
        EndpointPool::new(endpoints).unwrap()
    }

    #[test]
    fn cycles_in_definition_order() {
        let pool = pool(3);
        let first: Vec<_> = (0..3).map(|_| pool.next().label.clone()).collect();
        let second: Vec<_> = (0..3).map(|_| pool.next().label.clone()).collect();
        assert_eq!(first, vec!["rpc-0", "rpc-1", "rpc-2"]);
        assert_eq!(first, second);
        assert_eq!(pool.rotations(), 6);
        assert_eq!(pool.cursor(), 0);
    }

    #[test]
    fn restarts_from_offset() {
        let pool = pool(4).with_offset(6);
        let labels: Vec<_> = (0..4).map(|_| pool.next().label.clone()).collect();
        assert_eq!(labels, vec!["rpc-2", "rpc-3", "rpc-0", "rpc-1"]);
    }

    #[test]
    fn single_endpoint_always_returned() {
        let pool = pool(1);
        for _ in 0..5 {
            assert_eq!(pool.next().label, "rpc-0");
        }
    }

    #[test]
    fn rejects_all_empty_entries() {
        let entries = vec![
            ("ETH_MAINNET_RPC_URL", None),
            ("OPTIMISM_RPC_URL", Some("")),
            ("FORK_RPC_URL", Some("   ")),
        ];
        let err = EndpointPool::from_urls(entries).unwrap_err();
        assert!(matches!(err, BotError::Configuration { .. }));
    }

    #[test]
    fn skips_empty_entries() {
        let entries = vec![
            ("ETH_MAINNET_RPC_URL", Some("http://a.local:8545")),
            ("OPTIMISM_RPC_URL", None),
            ("FORK_RPC_URL", Some("http://b.local:8545")),
        ];
        let pool = EndpointPool::from_urls(entries).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.next().label, "ETH_MAINNET_RPC_URL");
        assert_eq!(pool.next().label, "FORK_RPC_URL");
    }

    #[test]
    fn rejects_invalid_url() {
        let entries = vec![("RPC_URLS[0]", Some("not a url"))];
        assert!(EndpointPool::from_urls(entries).is_err());
    }

    #[test]
    fn display_hides_credentials() {
        let endpoint = Endpoint::parse("ETH", "https://mainnet.example.io/v3/secretkey").unwrap();
        let shown = endpoint.to_string();
        assert_eq!(shown, "ETH (mainnet.example.io)");
    }
}
