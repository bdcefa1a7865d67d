//! Optional observability helpers for the refresh coordinator.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `leerling_auth.refresh` with a `stage` field,
//!   plus one event per refresh outcome.
//! - Enable `metrics` to increment the `leerling_auth_refresh_total` counter for every outcome,
//!   labeled by `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded while handing out authorization headers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshOutcome {
	/// A new refresh cycle started.
	Attempt,
	/// A caller joined a refresh cycle that was already in flight.
	Joined,
	/// The first exchange failed and the single retry is scheduled.
	Retry,
	/// The refresh succeeded.
	Success,
	/// Both exchanges failed but the session already held a valid token.
	RaceResolved,
	/// The refresh failed with a network or server error.
	Transient,
	/// The refresh was rejected and the session can no longer be refreshed.
	Rejected,
}
impl RefreshOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshOutcome::Attempt => "attempt",
			RefreshOutcome::Joined => "joined",
			RefreshOutcome::Retry => "retry",
			RefreshOutcome::Success => "success",
			RefreshOutcome::RaceResolved => "race_resolved",
			RefreshOutcome::Transient => "transient",
			RefreshOutcome::Rejected => "rejected",
		}
	}

	/// Returns `true` for outcomes that end a cycle with an error.
	pub const fn is_failure(self) -> bool {
		matches!(self, RefreshOutcome::Transient | RefreshOutcome::Rejected)
	}
}
impl Display for RefreshOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
