//! URL verification for the rules that need an HTTP status.
//!
//! Rules never perform network I/O themselves; they ask a [`UrlVerifier`].
//! [`HttpVerifier`] does real blocking requests, [`OfflineVerifier`] answers
//! [`Reachability::Disabled`] for everything, and [`FixedVerifier`] serves canned
//! statuses for tests and replays.

use crate::config::NetworkConfig;
use crate::error::Result;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Result of checking one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reachability {
    /// Final HTTP status after redirects.
    Status(u16),
    /// Network error or timeout. Inconclusive.
    Unreachable(String),
    /// Verification is switched off.
    Disabled,
}

impl Reachability {
    pub fn is_success(&self) -> bool {
        matches!(self, Reachability::Status(s) if (200..300).contains(s))
    }
}

pub trait UrlVerifier: Send + Sync {
    fn verify(&self, url: &str) -> Reachability;
}

/// Blocking HTTP verifier with a per-request timeout and a response cache.
pub struct HttpVerifier {
    client: reqwest::blocking::Client,
    cache: Mutex<HashMap<String, Reachability>>,
}

impl HttpVerifier {
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(HttpVerifier {
            client,
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn fetch(&self, url: &str) -> Reachability {
        match self.client.head(url).send() {
            // Some servers refuse HEAD outright; ask again with GET.
            Ok(resp) if matches!(resp.status().as_u16(), 403 | 405 | 501) => {
                match self.client.get(url).send() {
                    Ok(resp) => Reachability::Status(resp.status().as_u16()),
                    Err(e) => Reachability::Unreachable(e.to_string()),
                }
            }
            Ok(resp) => Reachability::Status(resp.status().as_u16()),
            Err(head_err) => match self.client.get(url).send() {
                Ok(resp) => Reachability::Status(resp.status().as_u16()),
                Err(get_err) => {
                    Reachability::Unreachable(format!("HEAD failed: {head_err}; GET failed: {get_err}"))
                }
            },
        }
    }
}

impl UrlVerifier for HttpVerifier {
    fn verify(&self, url: &str) -> Reachability {
        if let Ok(cache) = self.cache.lock() {
            if let Some(hit) = cache.get(url) {
                return hit.clone();
            }
        }

        let outcome = self.fetch(url);
        match &outcome {
            Reachability::Status(status) => tracing::debug!(url, status, "verified url"),
            Reachability::Unreachable(reason) => tracing::warn!(url, %reason, "url verification failed"),
            Reachability::Disabled => {}
        }

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(url.to_string(), outcome.clone());
        }
        outcome
    }
}

/// Verifier used when network access is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineVerifier;

impl UrlVerifier for OfflineVerifier {
    fn verify(&self, _url: &str) -> Reachability {
        Reachability::Disabled
    }
}

/// Serves fixed statuses; unknown URLs are unreachable.
#[derive(Debug, Default, Clone)]
pub struct FixedVerifier {
    statuses: HashMap<String, u16>,
}

impl FixedVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, status: u16) -> Self {
        self.statuses.insert(url.to_string(), status);
        self
    }
}

impl UrlVerifier for FixedVerifier {
    fn verify(&self, url: &str) -> Reachability {
        match self.statuses.get(url) {
            Some(status) => Reachability::Status(*status),
            None => Reachability::Unreachable("no canned response".to_string()),
        }
    }
}

/// Builds the verifier matching the network configuration.
pub fn from_config(config: &NetworkConfig) -> Result<Box<dyn UrlVerifier>> {
    if config.enabled {
        Ok(Box::new(HttpVerifier::new(config)?))
    } else {
        Ok(Box::new(OfflineVerifier))
    }
}
