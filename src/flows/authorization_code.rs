//! Authorization Code flow for confidential clients holding a client secret.
//!
//! The application sends the user to [`make_authorization_url`], receives the redirect, and
//! passes it to [`request_tokens`]. The grant always yields a refresh token; refresh responses
//! may omit a new one, in which case the previous refresh token is kept.
//!
//! [`make_authorization_url`]: AuthorizationManager::make_authorization_url
//! [`request_tokens`]: AuthorizationManager::request_tokens

// self
use crate::{
	_prelude::*,
	auth::{ClientIdentity, ScopeSet, TokenState},
	error::ConfigError,
	flows::{
		AuthorizationManager, FlowStrategy, RefreshTokenRequirement, TokenForm, TokenRequirements,
		common, strategy,
	},
	http::TokenHttpClient,
	obs::{self, FlowKind, FlowStage},
	provider::GrantType,
};

/// Marker for the Authorization Code grant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AuthorizationCode;
impl FlowStrategy for AuthorizationCode {
	const GRANT_REQUIREMENTS: TokenRequirements =
		TokenRequirements { refresh_token: RefreshTokenRequirement::Required, scopes: true };
	const KIND: FlowKind = FlowKind::AuthorizationCode;
	const REFRESH_REQUIREMENTS: TokenRequirements =
		TokenRequirements { refresh_token: RefreshTokenRequirement::Optional, scopes: true };

	fn validate_client(identity: &ClientIdentity) -> Result<(), ConfigError> {
		strategy::require_secret(identity, "authorization_code")
	}

	fn refresh_form(identity: &ClientIdentity, tokens: &TokenState) -> Result<TokenForm> {
		let refresh_token = tokens
			.refresh_token
			.clone()
			.ok_or_else(|| Error::unauthorized("no refresh token is available"))?;

		Ok(TokenForm::new(GrantType::RefreshToken)
			.secret("refresh_token", refresh_token)
			.client(identity))
	}
}

impl<C> AuthorizationManager<AuthorizationCode, C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Consent URL the user must open to authorize this application for `scopes`.
	///
	/// `redirect` must exactly match a URI registered for the client. Pass a random `state` and
	/// hand the same value to [`request_tokens`](Self::request_tokens).
	pub fn make_authorization_url(
		&self,
		redirect: &Url,
		show_dialog: bool,
		state: Option<&str>,
		scopes: &ScopeSet,
	) -> Url {
		common::authorization_url(
			&self.endpoints().authorization,
			&self.client_identity().client_id,
			redirect,
			show_dialog,
			state,
			scopes,
			None,
		)
	}

	/// Exchanges the code carried by `redirect_with_query` for access and refresh tokens.
	///
	/// `state` must equal the value passed to
	/// [`make_authorization_url`](Self::make_authorization_url). The stored tokens are only
	/// replaced when the exchange succeeds.
	pub async fn request_tokens(
		&self,
		redirect_with_query: &Url,
		state: Option<&str>,
	) -> Result<()> {
		const KIND: FlowKind = FlowKind::AuthorizationCode;

		obs::observe(KIND, FlowStage::RequestTokens, async move {
			let code = common::authorization_code_from_redirect(KIND, redirect_with_query, state)?;
			let form = TokenForm::new(GrantType::AuthorizationCode)
				.secret("code", code)
				.param("redirect_uri", common::base_redirect_uri(redirect_with_query))
				.client(self.client_identity());

			self.exchange_grant(form).await
		})
		.await
	}
}
