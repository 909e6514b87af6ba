// self
use crate::{
	_prelude::*,
	obs::{self, FlowKind, FlowOutcome, FlowStage},
};

/// Counts one call outcome in `spotify_auth_flow_total` (when enabled).
pub fn record_flow_outcome(kind: FlowKind, stage: FlowStage, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"spotify_auth_flow_total",
		"flow" => kind.as_str(),
		"stage" => stage.as_str(),
		"outcome" => outcome.as_str()
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, stage, outcome);
}

/// Counts one failure by error class in `spotify_auth_flow_errors_total` (when enabled).
pub fn record_flow_error(kind: FlowKind, stage: FlowStage, error: &Error) {
	let class = obs::error_class(error);

	#[cfg(feature = "metrics")]
	metrics::counter!(
		"spotify_auth_flow_errors_total",
		"flow" => kind.as_str(),
		"stage" => stage.as_str(),
		"error" => class
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, stage, class);
}
