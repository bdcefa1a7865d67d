// self
use crate::{_prelude::*, obs::RefreshOutcome};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRefresh<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRefresh<F> = F;

/// A span builder used around refresh cycles.
#[derive(Clone, Debug)]
pub struct RefreshSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RefreshSpan {
	/// Creates a new span tagged with the provided stage.
	pub fn new(stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("leerling_auth.refresh", stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRefresh<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a structured event for a refresh outcome; failures are logged at `warn`.
pub fn trace_refresh_outcome(outcome: RefreshOutcome, detail: Option<&dyn Display>) {
	#[cfg(feature = "tracing")]
	{
		let detail = detail.map(ToString::to_string);

		if outcome.is_failure() {
			tracing::warn!(
				outcome = outcome.as_str(),
				detail = detail.as_deref(),
				"refresh cycle failed"
			);
		} else {
			tracing::debug!(
				outcome = outcome.as_str(),
				detail = detail.as_deref(),
				"refresh cycle progressed"
			);
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (outcome, detail);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn trace_refresh_outcome_noop_without_tracing() {
		trace_refresh_outcome(RefreshOutcome::Transient, Some(&"503"));
		trace_refresh_outcome(RefreshOutcome::Success, None);
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = RefreshSpan::new("instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
