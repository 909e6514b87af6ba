//! Observability for authorization flows.
//!
//! Every public flow operation runs through [`observe`]. With the `tracing` feature it opens a
//! `spotify_auth.flow` span carrying `flow` and `stage`, and logs failures at `warn` together
//! with their error class. With the `metrics` feature it increments
//! `spotify_auth_flow_total{flow, stage, outcome}` and, on failure,
//! `spotify_auth_flow_errors_total{flow, stage, error}`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Authorization flow variants observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Authorization Code grant with a client secret.
	AuthorizationCode,
	/// Authorization Code grant with PKCE (public client).
	AuthorizationCodePkce,
	/// Client Credentials grant for app-only tokens.
	ClientCredentials,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::AuthorizationCode => "authorization_code",
			FlowKind::AuthorizationCodePkce => "authorization_code_pkce",
			FlowKind::ClientCredentials => "client_credentials",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Manager operation a span or counter belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowStage {
	/// Initial grant: code exchange or client credentials request.
	RequestTokens,
	/// Call into the refresh coordinator, including skipped and joined calls.
	RefreshTokens,
}
impl FlowStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowStage::RequestTokens => "request_tokens",
			FlowStage::RefreshTokens => "refresh_tokens",
		}
	}
}

/// Outcome labels recorded for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}

/// Stable label naming the class of `error`, without any of its payload.
pub fn error_class(error: &Error) -> &'static str {
	match error {
		Error::Config(_) => "config",
		Error::Transport(_) => "transport",
		Error::Unauthorized { .. } => "unauthorized",
		Error::InvalidState { .. } => "invalid_state",
		Error::InsufficientScope { .. } => "insufficient_scope",
		Error::AuthorizationDenied { .. } => "authorization_denied",
		Error::MalformedRedirect { .. } => "malformed_redirect",
		Error::MalformedResponse { .. } => "malformed_response",
		Error::RateLimited { .. } => "rate_limited",
		Error::Api { .. } => "api",
		Error::UnexpectedStatus { .. } => "unexpected_status",
		Error::Other { .. } => "other",
	}
}

/// Runs `operation` inside a flow span, counting the call and its outcome.
pub(crate) async fn observe<T, Fut>(kind: FlowKind, stage: FlowStage, operation: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = FlowSpan::new(kind, stage);

	record_flow_outcome(kind, stage, FlowOutcome::Attempt);

	let result = span.instrument(operation).await;

	match &result {
		Ok(_) => record_flow_outcome(kind, stage, FlowOutcome::Success),
		Err(e) => {
			record_flow_outcome(kind, stage, FlowOutcome::Failure);
			record_flow_error(kind, stage, e);
			log_flow_failure(kind, stage, e);
		},
	}

	result
}
