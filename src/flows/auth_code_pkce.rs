//! Authorization Code flow with PKCE for public clients that cannot keep a secret.
//!
//! Callers generate a code verifier with [`generate_code_verifier`], derive the challenge with
//! [`make_code_challenge`], and send the user to the consent URL. The same verifier is then
//! passed to [`request_tokens`](AuthorizationManager::request_tokens).
//!
//! Spotify issues single-use refresh tokens to PKCE clients, so every refresh must return a new
//! one. A refresh response without it clears the stored tokens.

mod pkce;

pub use pkce::*;

// self
use crate::{
	_prelude::*,
	auth::{ClientIdentity, ScopeSet, TokenState},
	error::ConfigError,
	flows::{
		AuthorizationManager, FlowStrategy, RefreshTokenRequirement, TokenForm, TokenRequirements,
		common,
	},
	http::TokenHttpClient,
	obs::{self, FlowKind, FlowStage},
	provider::GrantType,
};

/// Marker for the Authorization Code grant with PKCE.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AuthorizationCodePkce;
impl FlowStrategy for AuthorizationCodePkce {
	const GRANT_REQUIREMENTS: TokenRequirements =
		TokenRequirements { refresh_token: RefreshTokenRequirement::Required, scopes: true };
	const KIND: FlowKind = FlowKind::AuthorizationCodePkce;
	const REFRESH_REQUIREMENTS: TokenRequirements =
		TokenRequirements { refresh_token: RefreshTokenRequirement::Required, scopes: true };

	fn validate_client(_: &ClientIdentity) -> Result<(), ConfigError> {
		Ok(())
	}

	fn refresh_form(identity: &ClientIdentity, tokens: &TokenState) -> Result<TokenForm> {
		let refresh_token = tokens
			.refresh_token
			.clone()
			.ok_or_else(|| Error::unauthorized("no refresh token is available"))?;

		Ok(TokenForm::new(GrantType::RefreshToken)
			.secret("refresh_token", refresh_token)
			.param("client_id", identity.client_id.to_string()))
	}

	fn on_refresh_failure(tokens: &mut TokenState, error: &Error) -> bool {
		// The old refresh token was consumed by the provider.
		if matches!(error, Error::MalformedResponse { .. }) {
			*tokens = TokenState::default();

			true
		} else {
			false
		}
	}
}

impl<C> AuthorizationManager<AuthorizationCodePkce, C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Consent URL carrying `code_challenge` with method `S256`.
	pub fn make_authorization_url(
		&self,
		redirect: &Url,
		show_dialog: bool,
		code_challenge: &str,
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
			Some(code_challenge),
		)
	}

	/// Exchanges the code carried by `redirect_with_query`, proving possession of
	/// `code_verifier`.
	///
	/// The verifier is checked before any network activity.
	pub async fn request_tokens(
		&self,
		redirect_with_query: &Url,
		code_verifier: &str,
		state: Option<&str>,
	) -> Result<()> {
		const KIND: FlowKind = FlowKind::AuthorizationCodePkce;

		obs::observe(KIND, FlowStage::RequestTokens, async move {
			validate_code_verifier(code_verifier)?;

			let code = common::authorization_code_from_redirect(KIND, redirect_with_query, state)?;
			let form = TokenForm::new(GrantType::AuthorizationCode)
				.secret("code", code)
				.param("redirect_uri", common::base_redirect_uri(redirect_with_query))
				.param("client_id", self.client_identity().client_id.to_string())
				.secret("code_verifier", code_verifier);

			self.exchange_grant(form).await
		})
		.await
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::{
		auth::{Scope, TokenSecret},
		flows::AuthorizationEvent,
		http::testing::ScriptedHttpClient,
	};

	const GRANT: &str = r#"{"access_token":"access","token_type":"Bearer","scope":"user-read-private","expires_in":3600,"refresh_token":"refresh"}"#;

	type Manager = AuthorizationManager<AuthorizationCodePkce, ScriptedHttpClient>;

	fn manager(http: ScriptedHttpClient) -> Manager {
		Manager::with_http_client(ClientIdentity::public("client").expect("Identity fixture."), http)
			.expect("Public clients are valid for PKCE.")
	}

	fn url(raw: &str) -> Url {
		Url::parse(raw).expect("Fixture URL should parse.")
	}

	#[test]
	fn authorization_url_appends_the_challenge() {
		let verifier = generate_code_verifier(128);
		let challenge = make_code_challenge(&verifier);
		let built = manager(ScriptedHttpClient::default()).make_authorization_url(
			&url("http://127.0.0.1:8080/callback"),
			false,
			&challenge,
			None,
			&ScopeSet::new([Scope::UserReadPrivate]),
		);
		let pairs = built.query_pairs().into_owned().collect::<Vec<_>>();

		assert!(pairs.contains(&("code_challenge_method".into(), "S256".into())));
		assert!(pairs.contains(&("code_challenge".into(), challenge)));
		assert!(!pairs.iter().any(|(k, _)| k == "state"));
	}

	#[tokio::test]
	async fn request_tokens_sends_the_verifier_without_a_secret() {
		let http = ScriptedHttpClient::default().respond(200, GRANT);
		let manager = manager(http.clone());
		let verifier = "v".repeat(64);
		let redirect = url("http://127.0.0.1:8080/callback?code=abc&state=s");

		manager
			.request_tokens(&redirect, &verifier, Some("s"))
			.await
			.expect("Complete grants should be stored.");

		let body = &http.requests()[0].body;

		assert_eq!(
			*body,
			format!(
				"grant_type=authorization_code&code=abc&redirect_uri=http%3A%2F%2F127.0.0.1%3A8080%2Fcallback&client_id=client&code_verifier={verifier}"
			)
		);
		assert!(!body.contains("client_secret"));
		assert_eq!(manager.refresh_token(), Some(TokenSecret::new("refresh")));
	}

	#[tokio::test]
	async fn short_verifiers_are_rejected_locally() {
		let manager = manager(ScriptedHttpClient::default());
		let err = manager
			.request_tokens(&url("http://127.0.0.1:8080/callback?code=abc"), "too-short", None)
			.await
			.expect_err("Short verifiers must fail.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidCodeVerifier { length: 9 })));
		assert_eq!(manager.http_client().calls(), 0);
	}

	#[tokio::test]
	async fn refresh_without_new_refresh_token_deauthorizes() {
		let http = ScriptedHttpClient::default().respond(200, GRANT).respond(
			200,
			r#"{"access_token":"access-2","token_type":"Bearer","scope":"user-read-private","expires_in":3600}"#,
		);
		let manager = manager(http.clone());
		let deauthorized = Arc::new(AtomicUsize::new(0));
		let seen = deauthorized.clone();

		manager.subscribe(move |event| {
			if event == AuthorizationEvent::Deauthorized {
				seen.fetch_add(1, Ordering::SeqCst);
			}
		});
		manager
			.request_tokens(&url("http://127.0.0.1:8080/callback?code=abc"), &"v".repeat(43), None)
			.await
			.expect("Complete grants should be stored.");

		let err = manager
			.refresh_tokens(false, Duration::ZERO)
			.await
			.expect_err("Single-use refresh tokens must be replaced.");

		assert!(matches!(err, Error::MalformedResponse { .. }));
		assert_eq!(
			http.requests()[1].body,
			"grant_type=refresh_token&refresh_token=refresh&client_id=client"
		);
		assert!(manager.access_token().is_none());
		assert!(manager.refresh_token().is_none());
		assert_eq!(deauthorized.load(Ordering::SeqCst), 1);
	}
}
