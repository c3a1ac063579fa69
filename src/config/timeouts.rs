// ABOUTME: Wait limits for polled stages, read from the timeouts section.
// ABOUTME: Durations use humantime syntax such as 5m or 2s.

use serde::Deserialize;
use std::time::Duration;

use crate::deploy::{BUILD_QUEUE_ALLOWANCE, Timeouts};
use crate::poll::PollSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    #[serde(with = "humantime_serde")]
    pub api_enable: Duration,
    #[serde(with = "humantime_serde")]
    pub repository: Duration,
    #[serde(with = "humantime_serde")]
    pub build: Duration,
    #[serde(with = "humantime_serde")]
    pub address: Duration,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub max_poll_interval: Duration,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            api_enable: Duration::from_secs(5 * 60),
            repository: Duration::from_secs(5 * 60),
            build: Duration::from_secs(20 * 60),
            address: Duration::from_secs(10 * 60),
            poll_interval: Duration::from_secs(2),
            max_poll_interval: Duration::from_secs(30),
        }
    }
}

impl TimeoutsConfig {
    /// Poll limits per stage. The build wait covers the build service's
    /// limit plus queue time.
    pub fn to_timeouts(&self) -> Timeouts {
        let poll = |timeout| {
            PollSettings::new(timeout, self.poll_interval).max_interval(self.max_poll_interval)
        };
        Timeouts {
            api_enable: poll(self.api_enable),
            repository: poll(self.repository),
            build: poll(self.build.saturating_add(BUILD_QUEUE_ALLOWANCE)),
            address: poll(self.address),
        }
    }
}
