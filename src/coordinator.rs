//! Single-flight authorization header coordinator.
//!
//! [`AuthorizationCoordinator::get_valid_authorization_header`] hands out the session's current
//! `Authorization` header while the access token is comfortably valid. Once the token enters the
//! safety margin (10% of the validity window before `expires_at - clock_skew`), the first caller
//! starts a refresh cycle and every later caller joins it instead of starting another one. A cycle
//! runs at most two refresh exchanges, `retry_delay` apart, and resolves every waiter with the same
//! outcome. Definite failures (the token endpoint answered with a non-5xx status) are broadcast as
//! [`RefreshFailed`] events so session teardown can force a logout; network and server errors
//! are only returned to the callers.

mod config;
mod metrics;

pub use config::CoordinatorConfig;
pub use metrics::RefreshMetrics;

// std
use std::{
	panic::{self, AssertUnwindSafe},
	sync::Weak,
};
// crates.io
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::broadcast;
// self
use crate::{
	_prelude::*,
	auth::AuthorizationHeader,
	error::RefreshError,
	obs::{self, RefreshOutcome, RefreshSpan},
	session::OAuthSession,
};

type CycleOutput = Result<AuthorizationHeader, RefreshError>;
type RefreshCycle = Shared<BoxFuture<'static, CycleOutput>>;

const REFRESH_ERROR_CAPACITY: usize = 16;

/// Event broadcast when a refresh cycle ends in a definite failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshFailed {
	/// The failure of the last refresh exchange.
	pub error: RefreshError,
	/// When the cycle gave up.
	pub occurred_at: OffsetDateTime,
}

/// Returns `true` when a token expiring at `expires_at` is still usable at `now`.
///
/// The token stays usable while `expires_at - clock_skew - validity_window / 10` lies strictly after
/// `now`; a missing expiry is never usable.
pub fn is_access_token_valid_at(
	expires_at: Option<OffsetDateTime>,
	clock_skew: Duration,
	validity_window: Duration,
	now: OffsetDateTime,
) -> bool {
	let Some(expires_at) = expires_at else {
		return false;
	};
	let Some(margin) = clock_skew.checked_add(validity_window / 10) else {
		return false;
	};

	match expires_at.checked_sub(margin) {
		Some(deadline) => deadline > now,
		// Only a negative margin can push the deadline past the representable maximum.
		None => margin.is_negative(),
	}
}

/// Hands out valid `Authorization` headers for one [`OAuthSession`].
///
/// Clones share the in-flight refresh cycle, the error stream, and the metrics.
pub struct AuthorizationCoordinator<S>
where
	S: ?Sized + OAuthSession + 'static,
{
	session: Arc<S>,
	config: CoordinatorConfig,
	in_flight: Arc<Mutex<Option<RefreshCycle>>>,
	refresh_errors: broadcast::Sender<RefreshFailed>,
	metrics: Arc<RefreshMetrics>,
}
impl<S> AuthorizationCoordinator<S>
where
	S: ?Sized + OAuthSession + 'static,
{
	/// Creates a coordinator with the default [`CoordinatorConfig`].
	pub fn new(session: Arc<S>) -> Self {
		Self::with_config(session, CoordinatorConfig::default())
	}

	/// Creates a coordinator with explicit tunables.
	pub fn with_config(session: Arc<S>, config: CoordinatorConfig) -> Self {
		let (refresh_errors, _) = broadcast::channel(REFRESH_ERROR_CAPACITY);

		Self {
			session,
			config,
			in_flight: Arc::new(Mutex::new(None)),
			refresh_errors,
			metrics: Arc::new(RefreshMetrics::default()),
		}
	}

	/// Session this coordinator refreshes through.
	pub fn session(&self) -> &Arc<S> {
		&self.session
	}

	/// Tunables in effect.
	pub fn config(&self) -> &CoordinatorConfig {
		&self.config
	}

	/// Counters for the refresh cycles handled so far.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}

	/// Returns a valid header using the configured validity window.
	pub async fn get_valid_authorization_header(&self) -> Result<AuthorizationHeader> {
		self.get_valid_authorization_header_within(self.config.validity_window).await
	}

	/// Returns a valid header, refreshing first when the token is inside the margin derived from
	/// `validity_window`.
	///
	/// Callers arriving while a refresh is in flight wait for that refresh and receive its outcome.
	/// Dropping the returned future does not cancel the refresh for the other waiters.
	pub async fn get_valid_authorization_header_within(
		&self,
		validity_window: Duration,
	) -> Result<AuthorizationHeader> {
		let cycle = {
			let mut in_flight = self.in_flight.lock();

			match in_flight.as_ref() {
				Some(cycle) => {
					self.metrics.record_join();
					obs::record_refresh_outcome(RefreshOutcome::Joined);
					obs::trace_refresh_outcome(RefreshOutcome::Joined, None);

					cycle.clone()
				},
				None => {
					if is_access_token_valid_at(
						self.session.access_token_expiration(),
						self.session.clock_skew(),
						validity_window,
						OffsetDateTime::now_utc(),
					) {
						return Ok(self.session.authorization_header());
					}

					let cycle = self.start_cycle();

					*in_flight = Some(cycle.clone());

					cycle
				},
			}
		};

		Ok(cycle.await?)
	}

	/// Returns `true` when the session holds a refresh token.
	pub fn is_refreshable(&self) -> bool {
		self.session.stored_refresh_token().is_some()
	}

	/// Returns `true` while a refresh cycle is in flight.
	pub fn is_refreshing(&self) -> bool {
		self.in_flight.lock().is_some()
	}

	/// Subscribes to definite refresh failures.
	///
	/// Only events emitted after subscribing are delivered.
	pub fn subscribe_refresh_errors(&self) -> broadcast::Receiver<RefreshFailed> {
		self.refresh_errors.subscribe()
	}

	fn start_cycle(&self) -> RefreshCycle {
		let session = self.session.clone();
		let in_flight = Arc::downgrade(&self.in_flight);
		let refresh_errors = self.refresh_errors.clone();
		let metrics = self.metrics.clone();
		let retry_delay = self.config.retry_delay.unsigned_abs();
		let span = RefreshSpan::new("refresh_cycle");
		let cycle = async move {
			let output = AssertUnwindSafe(run_cycle(
				session.as_ref(),
				retry_delay,
				&refresh_errors,
				metrics.as_ref(),
			))
			.catch_unwind()
			.await;

			// Cleared before any waiter observes the output, including a panic.
			clear_in_flight(&in_flight);

			match output {
				Ok(output) => output,
				Err(payload) => panic::resume_unwind(payload),
			}
		};

		span.instrument(cycle).boxed().shared()
	}
}
impl<S> Clone for AuthorizationCoordinator<S>
where
	S: ?Sized + OAuthSession + 'static,
{
	fn clone(&self) -> Self {
		Self {
			session: self.session.clone(),
			config: self.config,
			in_flight: self.in_flight.clone(),
			refresh_errors: self.refresh_errors.clone(),
			metrics: self.metrics.clone(),
		}
	}
}
impl<S> Debug for AuthorizationCoordinator<S>
where
	S: ?Sized + OAuthSession + 'static,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationCoordinator")
			.field("config", &self.config)
			.field("refreshing", &self.is_refreshing())
			.field("metrics", &self.metrics)
			.finish()
	}
}

fn clear_in_flight(in_flight: &Weak<Mutex<Option<RefreshCycle>>>) {
	if let Some(slot) = in_flight.upgrade() {
		slot.lock().take();
	}
}

async fn run_cycle<S>(
	session: &S,
	retry_delay: std::time::Duration,
	refresh_errors: &broadcast::Sender<RefreshFailed>,
	metrics: &RefreshMetrics,
) -> CycleOutput
where
	S: ?Sized + OAuthSession,
{
	metrics.record_cycle();
	obs::record_refresh_outcome(RefreshOutcome::Attempt);
	obs::trace_refresh_outcome(RefreshOutcome::Attempt, None);

	let exchange = match session.refresh_token().await {
		Ok(()) => Ok(()),
		Err(e) => {
			metrics.record_retry();
			obs::record_refresh_outcome(RefreshOutcome::Retry);
			obs::trace_refresh_outcome(RefreshOutcome::Retry, Some(&e));

			tokio::time::sleep(retry_delay).await;

			session.refresh_token().await
		},
	};
	let Err(e) = exchange else {
		metrics.record_success();
		obs::record_refresh_outcome(RefreshOutcome::Success);
		obs::trace_refresh_outcome(RefreshOutcome::Success, None);

		return Ok(session.authorization_header());
	};

	// Another client may have installed a fresh token while both exchanges failed.
	if session.has_valid_access_token() {
		metrics.record_race_resolved();
		obs::record_refresh_outcome(RefreshOutcome::RaceResolved);
		obs::trace_refresh_outcome(RefreshOutcome::RaceResolved, Some(&e));

		return Ok(session.authorization_header());
	}

	if e.is_transient() {
		metrics.record_transient_failure();
		obs::record_refresh_outcome(RefreshOutcome::Transient);
		obs::trace_refresh_outcome(RefreshOutcome::Transient, Some(&e));
	} else {
		metrics.record_rejection();
		obs::record_refresh_outcome(RefreshOutcome::Rejected);
		obs::trace_refresh_outcome(RefreshOutcome::Rejected, Some(&e));

		// No receivers is not an error for the cycle.
		let _ = refresh_errors
			.send(RefreshFailed { error: e.clone(), occurred_at: OffsetDateTime::now_utc() });
	}

	Err(e)
}
