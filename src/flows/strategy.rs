//! Per-flow behavior plugged into [`AuthorizationManager`](crate::flows::AuthorizationManager).

// self
use crate::{
	_prelude::*,
	auth::{ClientIdentity, TokenState},
	error::ConfigError,
	flows::common::TokenForm,
	obs::FlowKind,
};

/// Whether a token response must carry a `refresh_token`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshTokenRequirement {
	/// Missing refresh tokens are a protocol violation.
	Required,
	/// A missing refresh token keeps the previously stored one, if any.
	Optional,
}

/// Fields a token response must carry for one flow step.
///
/// `access_token` and a positive `expires_in` are always required.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenRequirements {
	/// Refresh token policy.
	pub refresh_token: RefreshTokenRequirement,
	/// Whether the `scope` field must be present.
	pub scopes: bool,
}

/// Flow-specific hooks shared by the grant exchange and the refresh coordinator.
///
/// The three implementations are zero-sized markers; everything stateful lives on the manager.
pub trait FlowStrategy
where
	Self: 'static + Send + Sync,
{
	/// Label used in spans, metrics, and logs.
	const KIND: FlowKind;
	/// Fields required from the initial grant exchange.
	const GRANT_REQUIREMENTS: TokenRequirements;
	/// Fields required from a refresh response.
	const REFRESH_REQUIREMENTS: TokenRequirements;

	/// Rejects client identities the flow cannot work with.
	fn validate_client(identity: &ClientIdentity) -> Result<(), ConfigError>;

	/// Builds the request body that renews `tokens`.
	///
	/// Fails with [`Error::Unauthorized`] when nothing usable for a refresh is available.
	fn refresh_form(identity: &ClientIdentity, tokens: &TokenState) -> Result<TokenForm>;

	/// Adjusts `tokens` after a failed refresh, returning `true` when they changed.
	fn on_refresh_failure(tokens: &mut TokenState, error: &Error) -> bool {
		let _ = (tokens, error);

		false
	}
}

pub(crate) fn require_secret(
	identity: &ClientIdentity,
	flow: &'static str,
) -> Result<(), ConfigError> {
	if identity.is_confidential() {
		Ok(())
	} else {
		Err(ConfigError::MissingClientSecret { flow })
	}
}
