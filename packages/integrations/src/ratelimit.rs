// ABOUTME: Client-side request gate sized by each vendor's per-minute limit
// ABOUTME: Refuses before calling the vendor instead of burning a throttled request

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

use crate::error::{ProviderError, ProviderResult};

/// Sliding one-minute window over outbound vendor requests
///
/// A capacity of 0 disables the gate.
pub struct RateGate {
    capacity: u32,
    window: Duration,
    stamps: Mutex<VecDeque<Instant>>,
}

impl RateGate {
    pub fn per_minute(capacity: u32) -> Self {
        Self {
            capacity,
            window: Duration::from_secs(60),
            stamps: Mutex::new(VecDeque::new()),
        }
    }

    #[cfg(test)]
    fn with_window(capacity: u32, window: Duration) -> Self {
        Self {
            capacity,
            window,
            stamps: Mutex::new(VecDeque::new()),
        }
    }

    /// Claim a slot in the window, or fail with `RateLimited`
    pub async fn check(&self) -> ProviderResult<()> {
        if self.capacity == 0 {
            return Ok(());
        }

        let now = Instant::now();
        let mut stamps = self.stamps.lock().await;
        while let Some(oldest) = stamps.front() {
            if now.duration_since(*oldest) >= self.window {
                stamps.pop_front();
            } else {
                break;
            }
        }

        if stamps.len() >= self.capacity as usize {
            warn!("Client-side rate gate full ({} per window)", self.capacity);
            return Err(ProviderError::RateLimited);
        }
        stamps.push_back(now);
        Ok(())
    }
}
