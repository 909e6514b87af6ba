// self
use crate::{
	_prelude::*,
	obs::{FlowKind, FlowStage},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by authorization flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: FlowStage) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"spotify_auth.flow",
				flow = kind.as_str(),
				stage = stage.as_str()
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
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

/// Logs a failed flow operation by error class; the message itself may quote provider data.
pub(crate) fn log_flow_failure(kind: FlowKind, stage: FlowStage, error: &Error) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		flow = kind.as_str(),
		stage = stage.as_str(),
		error = super::error_class(error),
		"authorization flow failed"
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (kind, stage, error);
}

/// Logs why a refresh call did or did not reach the network.
pub(crate) fn log_refresh_decision(kind: FlowKind, decision: &'static str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(flow = kind.as_str(), decision, "refresh decision");
	#[cfg(not(feature = "tracing"))]
	let _ = (kind, decision);
}

/// Logs a provider protocol violation (missing or undecodable token fields).
pub(crate) fn log_protocol_violation(kind: FlowKind, message: &str) {
	#[cfg(feature = "tracing")]
	tracing::error!(
		flow = kind.as_str(),
		message,
		"provider returned a malformed token response"
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (kind, message);
}

/// Logs an `error` parameter returned through the redirect URI.
pub(crate) fn log_redirect_error(kind: FlowKind, error: &str, description: Option<&str>) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		flow = kind.as_str(),
		error,
		description,
		"authorization redirect carried an error"
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (kind, error, description);
}

/// Logs an outgoing form body with secrets already redacted.
pub(crate) fn log_token_request(kind: FlowKind, redacted_body: &str) {
	#[cfg(feature = "tracing")]
	tracing::trace!(flow = kind.as_str(), body = redacted_body, "sending token request");
	#[cfg(not(feature = "tracing"))]
	let _ = (kind, redacted_body);
}
