// self
use crate::_prelude::*;

/// Tunables for [`AuthorizationCoordinator`](crate::coordinator::AuthorizationCoordinator).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
	/// Assumed total lifetime of an access token; 10% of it is kept as a safety margin.
	pub validity_window: Duration,
	/// Delay before the single retry of a failed refresh.
	pub retry_delay: Duration,
}
impl CoordinatorConfig {
	const DEFAULT_RETRY_DELAY: Duration = Duration::milliseconds(100);
	const DEFAULT_VALIDITY_WINDOW: Duration = Duration::milliseconds(3_600_000);

	/// Overrides the validity window; negative values clamp to zero.
	pub fn with_validity_window(mut self, window: Duration) -> Self {
		self.validity_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	/// Overrides the retry delay; negative values clamp to zero.
	pub fn with_retry_delay(mut self, delay: Duration) -> Self {
		self.retry_delay = if delay.is_negative() { Duration::ZERO } else { delay };

		self
	}
}
impl Default for CoordinatorConfig {
	fn default() -> Self {
		Self {
			validity_window: Self::DEFAULT_VALIDITY_WINDOW,
			retry_delay: Self::DEFAULT_RETRY_DELAY,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_and_clamping() {
		let config = CoordinatorConfig::default();

		assert_eq!(config.validity_window, Duration::hours(1));
		assert_eq!(config.retry_delay, Duration::milliseconds(100));

		let clamped = config
			.with_validity_window(Duration::seconds(-5))
			.with_retry_delay(Duration::milliseconds(-1));

		assert_eq!(clamped.validity_window, Duration::ZERO);
		assert_eq!(clamped.retry_delay, Duration::ZERO);
	}
}
