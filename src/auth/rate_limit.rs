use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use chrono::{DateTime, Utc, Duration};

use crate::config::{AuthConfig, MAX_LOGIN_WINDOW_SECS};

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window_size: Duration,
    pub max_attempts: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_size: Duration::minutes(1),
            max_attempts: 10,  // 10 failed logins per window
        }
    }
}

impl From<&AuthConfig> for RateLimitConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            window_size: Duration::seconds(config.login_window_secs.clamp(1, MAX_LOGIN_WINDOW_SECS)),
            max_attempts: config.login_attempts_per_window,
        }
    }
}

#[derive(Debug)]
struct RequestWindow {
    timestamps: Vec<DateTime<Utc>>,
}

impl RequestWindow {
    fn new() -> Self {
        Self {
            timestamps: Vec::new(),
        }
    }

    fn cleanup_old_requests(&mut self, now: DateTime<Utc>, window_size: Duration) {
        let cutoff = now - window_size;
        self.timestamps.retain(|ts| *ts > cutoff);
    }
}

/// Sliding-window counter of failed attempts per key. Only failures are
/// recorded, and a success clears the key.
#[derive(Debug)]
pub struct RateLimiter {
    windows: Arc<RwLock<HashMap<String, RequestWindow>>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Whether `key` has used up its failures inside the current window.
    pub async fn is_limited(&self, key: &str, now: DateTime<Utc>) -> bool {
        let mut windows = self.windows.write().await;

        match windows.get_mut(key) {
            Some(window) => {
                window.cleanup_old_requests(now, self.config.window_size);
                window.timestamps.len() >= self.config.max_attempts as usize
            }
            None => false,
        }
    }

    pub async fn record_failure(&self, key: &str, now: DateTime<Utc>) {
        let mut windows = self.windows.write().await;

        let window = windows.entry(key.to_string()).or_insert_with(RequestWindow::new);
        window.cleanup_old_requests(now, self.config.window_size);
        window.timestamps.push(now);
    }

    pub async fn reset(&self, key: &str) {
        self.windows.write().await.remove(key);
    }

    /// Drops windows with no attempts left inside the window.
    pub async fn cleanup(&self, now: DateTime<Utc>) {
        let mut windows = self.windows.write().await;

        windows.retain(|_, window| {
            window.cleanup_old_requests(now, self.config.window_size);
            !window.timestamps.is_empty()
        });
    }

    pub async fn tracked_keys(&self) -> usize {
        self.windows.read().await.len()
    }
}
