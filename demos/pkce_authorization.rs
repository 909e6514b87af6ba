//! Walks through the Authorization Code + PKCE flow: build the consent URL, pretend the user
//! approved it, exchange the code, then refresh the single-use refresh token.
//!
//! The accounts service is mocked locally so the demo runs without a Spotify account.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use time::Duration;
use url::Url;
// self
use spotify_auth::{
	auth::{ClientIdentity, Scope, ScopeSet},
	flows::{self, AuthorizationCodePkce, ReqwestAuthorizationManager},
	provider::Endpoints,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let manager =
		ReqwestAuthorizationManager::<AuthorizationCodePkce>::new(ClientIdentity::public(
			"demo-public-client",
		)?)?
		.with_endpoints(Endpoints::new(
			Url::parse(&server.url("/authorize"))?,
			Url::parse(&server.url("/api/token"))?,
		)?);
	let verifier = flows::generate_code_verifier(128);
	let state = flows::random_state();
	let callback = Url::parse("http://127.0.0.1:8888/callback")?;
	let consent = manager.make_authorization_url(
		&callback,
		false,
		&flows::make_code_challenge(&verifier),
		Some(&state),
		&ScopeSet::new([Scope::UserReadPrivate, Scope::UserLibraryRead]),
	);

	println!("Open this URL to authorize: {consent}");

	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/token")
				.form_urlencoded_tuple("grant_type", "authorization_code");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-1\",\"token_type\":\"Bearer\",\"scope\":\"user-read-private user-library-read\",\"expires_in\":3600,\"refresh_token\":\"refresh-1\"}",
			);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/token")
				.form_urlencoded_tuple("grant_type", "refresh_token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-2\",\"token_type\":\"Bearer\",\"scope\":\"user-read-private user-library-read\",\"expires_in\":3600,\"refresh_token\":\"refresh-2\"}",
			);
		})
		.await;

	let mut redirect = callback.clone();

	redirect.query_pairs_mut().append_pair("code", "demo-code").append_pair("state", &state);
	manager.request_tokens(&redirect, &verifier, Some(&state)).await?;

	println!("Authorized: {manager:?}");

	let outcome = manager.refresh_tokens(false, Duration::ZERO).await?;

	println!("Refresh outcome: {outcome:?}; scopes: {:?}.", manager.scopes());

	Ok(())
}
