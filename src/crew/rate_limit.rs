use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// 滑动窗口限速器，限制每个窗口内的模型调用次数
pub struct RpmLimiter {
    max_calls: u32,
    window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl RpmLimiter {
    /// 每分钟最多 `max_rpm` 次调用，0 表示不限制
    pub fn new(max_rpm: u32) -> Self {
        Self::with_window(max_rpm, Duration::from_secs(60))
    }

    pub fn with_window(max_calls: u32, window: Duration) -> Self {
        Self {
            max_calls,
            window,
            calls: Mutex::new(VecDeque::new()),
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_calls == 0
    }

    /// 等待直到窗口内有空位，然后占用一个
    pub async fn acquire(&self) {
        if self.is_unlimited() {
            return;
        }

        loop {
            let wait = {
                let mut calls = self.calls.lock().await;
                let now = Instant::now();
                while calls
                    .front()
                    .is_some_and(|oldest| now.duration_since(*oldest) >= self.window)
                {
                    calls.pop_front();
                }

                if calls.len() < self.max_calls as usize {
                    calls.push_back(now);
                    return;
                }

                match calls.front() {
                    Some(oldest) => self.window.saturating_sub(now.duration_since(*oldest)),
                    None => Duration::ZERO,
                }
            };

            tracing::debug!(
                wait_ms = wait.as_millis() as u64,
                max_calls = self.max_calls,
                "rate limit reached, waiting for a free slot"
            );
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RpmLimiter;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_unlimited_never_waits() {
        let limiter = RpmLimiter::new(0);
        let start = Instant::now();
        for _ in 0..100 {
            limiter.acquire().await;
        }
        assert!(limiter.is_unlimited());
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_calls_within_budget_do_not_wait() {
        let limiter = RpmLimiter::with_window(3, Duration::from_secs(5));
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_call_over_budget_waits_for_window() {
        let limiter = RpmLimiter::with_window(2, Duration::from_millis(200));
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(150));
    }
}
