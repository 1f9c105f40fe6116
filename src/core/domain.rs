use std::time::Duration;
use serde::{Deserialize, Serialize};

// Identifiable defines common traits that can be shared by catalog records
pub trait Identifiable : Sync + Send {
    fn id(&self) -> String;
}

pub const SAVE_LATENCY_ENV: &str = "LMS_SAVE_LATENCY_MS";
pub const SEARCH_TIMEOUT_ENV: &str = "LMS_SEARCH_TIMEOUT_MS";
pub const REQUEST_CAPACITY_ENV: &str = "LMS_REQUEST_CAPACITY";
pub const ACTIVITY_CAPACITY_ENV: &str = "LMS_ACTIVITY_CAPACITY";

// Configuration abstracts config options for the catalog manager
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct Configuration {
    pub branch_id: String,
    // simulated storage delay awaited by every mutating catalog operation
    pub save_latency: Duration,
    // upper bound on waiting for a search worker reply
    pub search_timeout: Duration,
    // capacity of the search worker inbox
    pub request_capacity: usize,
    // capacity of the activity log ring buffer
    pub activity_capacity: usize,
}

impl Configuration {
    pub fn new(branch_id: &str) -> Self {
        Configuration {
            branch_id: branch_id.to_string(),
            save_latency: Duration::from_millis(300),
            search_timeout: Duration::from_secs(5),
            request_capacity: 16,
            activity_capacity: 64,
        }
    }

    /// Builds the defaults for `branch_id`, then applies any `LMS_*` overrides
    /// found in the environment. Unparseable values are ignored.
    pub fn from_env(branch_id: &str) -> Self {
        Self::from_lookup(branch_id, |key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(branch_id: &str, lookup: F) -> Self
        where F: Fn(&str) -> Option<String> {
        let mut config = Self::new(branch_id);
        let parse = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());
        if let Some(ms) = parse(SAVE_LATENCY_ENV) {
            config.save_latency = Duration::from_millis(ms);
        }
        if let Some(ms) = parse(SEARCH_TIMEOUT_ENV) {
            config.search_timeout = Duration::from_millis(ms);
        }
        if let Some(n) = parse(REQUEST_CAPACITY_ENV).filter(|n| *n > 0) {
            config.request_capacity = n as usize;
        }
        if let Some(n) = parse(ACTIVITY_CAPACITY_ENV).filter(|n| *n > 0) {
            config.activity_capacity = n as usize;
        }
        config
    }

    pub fn with_save_latency(mut self, latency: Duration) -> Self {
        self.save_latency = latency;
        self
    }

    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;
    use crate::core::domain::{ACTIVITY_CAPACITY_ENV, Configuration, REQUEST_CAPACITY_ENV, SAVE_LATENCY_ENV, SEARCH_TIMEOUT_ENV};

    #[tokio::test]
    async fn test_should_build_config() {
        let config = Configuration::new("test");
        assert_eq!("test", config.branch_id.as_str());
        assert_eq!(Duration::from_millis(300), config.save_latency);
        assert_eq!(Duration::from_secs(5), config.search_timeout);
        assert_eq!(16, config.request_capacity);
        assert_eq!(64, config.activity_capacity);
    }

    #[tokio::test]
    async fn test_should_apply_overrides() {
        let vars = HashMap::from([
            (SAVE_LATENCY_ENV, "5"),
            (SEARCH_TIMEOUT_ENV, "250"),
            (REQUEST_CAPACITY_ENV, "2"),
            (ACTIVITY_CAPACITY_ENV, "0"),
        ]);
        let config = Configuration::from_lookup("test", |k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(Duration::from_millis(5), config.save_latency);
        assert_eq!(Duration::from_millis(250), config.search_timeout);
        assert_eq!(2, config.request_capacity);
        // zero capacity is rejected by tokio channels, keep the default
        assert_eq!(64, config.activity_capacity);
    }

    #[tokio::test]
    async fn test_should_ignore_garbage_overrides() {
        let config = Configuration::from_lookup("test", |_| Some("soon".to_string()));
        assert_eq!(Configuration::new("test"), config);
    }
}
