use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};
use tokio::{sync::Mutex, time::Instant};

use crate::error::AppError;
use crate::AppState;

/// Per-client submission counter over fixed windows. Counts live in memory,
/// so each instance enforces its own limit.
#[derive(Clone)]
pub struct RateLimitState {
    windows: Arc<Mutex<HashMap<String, SubmitWindow>>>,
    max_requests: u32,
    window: Duration,
}

struct SubmitWindow {
    submitted: u32,
    opened_at: Instant,
}

impl RateLimitState {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Count one submission for `key`. Returns the submissions left in the
    /// current window, or how long until the window reopens.
    pub async fn check(&self, key: &str) -> Result<u32, Duration> {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();

        let slot = windows.entry(key.to_string()).or_insert(SubmitWindow {
            submitted: 0,
            opened_at: now,
        });

        let elapsed = now.duration_since(slot.opened_at);
        if elapsed > self.window {
            slot.submitted = 0;
            slot.opened_at = now;
        } else if slot.submitted >= self.max_requests {
            return Err(self.window.saturating_sub(elapsed));
        }

        slot.submitted += 1;
        Ok(self.max_requests - slot.submitted)
    }

    /// Forget clients idle for two windows.
    pub async fn cleanup(&self) {
        let idle_after = self.window * 2;
        let now = Instant::now();
        self.windows
            .lock()
            .await
            .retain(|_, slot| now.duration_since(slot.opened_at) < idle_after);
    }

    #[cfg(test)]
    pub async fn tracked_keys(&self) -> usize {
        self.windows.lock().await.len()
    }

    pub fn spawn_cleanup_worker(&self) {
        let limiter = self.clone();
        tokio::spawn(async move {
            let period = (limiter.window * 2).max(Duration::from_secs(1));
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                limiter.cleanup().await;
            }
        });
    }
}

/// Throttle mood submissions per client IP.
pub async fn rate_limit_submissions(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = addr.ip();
    let key = format!("{}:{}", client, req.uri().path());

    match state.rate_limiter.check(&key).await {
        Ok(remaining) => {
            tracing::debug!(%client, remaining, "Submission accepted by rate limiter");
            Ok(next.run(req).await)
        }
        Err(retry_after) => {
            tracing::warn!(
                %client,
                retry_after_secs = retry_after.as_secs(),
                "Submission rate limit exceeded"
            );
            Err(AppError::RateLimited)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBMIT_KEY: &str = "127.0.0.1:/api/moods";

    #[tokio::test]
    async fn test_sixth_submission_in_window_is_refused() {
        let limiter = RateLimitState::new(5, 60);

        let mut remaining = Vec::new();
        for _ in 0..5 {
            remaining.push(limiter.check(SUBMIT_KEY).await.unwrap());
        }
        assert_eq!(remaining, vec![4, 3, 2, 1, 0]);

        let retry_after = limiter.check(SUBMIT_KEY).await.unwrap_err();
        assert!(retry_after <= Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_clients_are_limited_independently() {
        let limiter = RateLimitState::new(1, 60);

        assert_eq!(limiter.check(SUBMIT_KEY).await, Ok(0));
        assert!(limiter.check(SUBMIT_KEY).await.is_err());
        assert_eq!(limiter.check("10.0.0.7:/api/moods").await, Ok(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_reopens_after_expiry() {
        let limiter = RateLimitState::new(2, 60);
        limiter.check(SUBMIT_KEY).await.unwrap();
        limiter.check(SUBMIT_KEY).await.unwrap();

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(
            limiter.check(SUBMIT_KEY).await,
            Err(Duration::from_secs(30))
        );

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(limiter.check(SUBMIT_KEY).await, Ok(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_forgets_idle_clients_only() {
        let limiter = RateLimitState::new(5, 60);
        limiter.check("10.0.0.7:/api/moods").await.unwrap();

        tokio::time::advance(Duration::from_secs(100)).await;
        limiter.check(SUBMIT_KEY).await.unwrap();
        limiter.cleanup().await;
        assert_eq!(limiter.tracked_keys().await, 2);

        tokio::time::advance(Duration::from_secs(30)).await;
        limiter.cleanup().await;
        assert_eq!(limiter.tracked_keys().await, 1);
    }
}
