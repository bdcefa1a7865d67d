// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for refresh cycles handled by one coordinator.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	cycles: AtomicU64,
	joins: AtomicU64,
	retries: AtomicU64,
	successes: AtomicU64,
	race_resolved: AtomicU64,
	transient_failures: AtomicU64,
	rejections: AtomicU64,
}
impl RefreshMetrics {
	/// Returns the number of refresh cycles started.
	pub fn cycles(&self) -> u64 {
		self.cycles.load(Ordering::Relaxed)
	}

	/// Returns the number of callers that joined an in-flight cycle.
	pub fn joins(&self) -> u64 {
		self.joins.load(Ordering::Relaxed)
	}

	/// Returns the number of retried exchanges.
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	/// Returns the number of cycles that refreshed successfully.
	pub fn successes(&self) -> u64 {
		self.successes.load(Ordering::Relaxed)
	}

	/// Returns the number of failed cycles resolved by an already-valid token.
	pub fn race_resolved(&self) -> u64 {
		self.race_resolved.load(Ordering::Relaxed)
	}

	/// Returns the number of cycles that failed with a network or server error.
	pub fn transient_failures(&self) -> u64 {
		self.transient_failures.load(Ordering::Relaxed)
	}

	/// Returns the number of cycles rejected by the token endpoint.
	pub fn rejections(&self) -> u64 {
		self.rejections.load(Ordering::Relaxed)
	}

	pub(crate) fn record_cycle(&self) {
		self.cycles.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_join(&self) {
		self.joins.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_retry(&self) {
		self.retries.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.successes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_race_resolved(&self) {
		self.race_resolved.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_transient_failure(&self) {
		self.transient_failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_rejection(&self) {
		self.rejections.fetch_add(1, Ordering::Relaxed);
	}
}
