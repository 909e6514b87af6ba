//! Client Credentials flow for app-only access without a user.
//!
//! There is no consent step and no refresh token. Refreshing re-runs the grant, so
//! [`AuthorizationManager::ensure_valid_token`] transparently obtains the first token too.

// self
use crate::{
	_prelude::*,
	auth::{ClientIdentity, TokenState},
	error::ConfigError,
	flows::{
		AuthorizationManager, FlowStrategy, RefreshTokenRequirement, TokenForm, TokenRequirements,
		strategy,
	},
	http::TokenHttpClient,
	obs::{self, FlowKind, FlowStage},
	provider::GrantType,
};

/// Marker for the Client Credentials grant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ClientCredentials;
impl ClientCredentials {
	fn grant_form(identity: &ClientIdentity) -> TokenForm {
		TokenForm::new(GrantType::ClientCredentials).client(identity)
	}
}
impl FlowStrategy for ClientCredentials {
	const GRANT_REQUIREMENTS: TokenRequirements =
		TokenRequirements { refresh_token: RefreshTokenRequirement::Optional, scopes: false };
	const KIND: FlowKind = FlowKind::ClientCredentials;
	const REFRESH_REQUIREMENTS: TokenRequirements = Self::GRANT_REQUIREMENTS;

	fn validate_client(identity: &ClientIdentity) -> Result<(), ConfigError> {
		strategy::require_secret(identity, "client_credentials")
	}

	fn refresh_form(identity: &ClientIdentity, _: &TokenState) -> Result<TokenForm> {
		Ok(Self::grant_form(identity))
	}
}

impl<C> AuthorizationManager<ClientCredentials, C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Requests a new app-only access token, replacing any stored one.
	pub async fn request_tokens(&self) -> Result<()> {
		let grant = self.exchange_grant(ClientCredentials::grant_form(self.client_identity()));

		obs::observe(ClientCredentials::KIND, FlowStage::RequestTokens, grant).await
	}
}
