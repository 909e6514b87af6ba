//! Obtains an app-only token with the Client Credentials flow against a local mock of the
//! accounts service, then signs a Web API request with it.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use spotify_auth::{
	auth::{ClientIdentity, ScopeSet},
	flows::{ClientCredentials, ReqwestAuthorizationManager},
	provider::{ClientAuthMethod, Endpoints},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token").body("grant_type=client_credentials");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let manager = ReqwestAuthorizationManager::<ClientCredentials>::new(
		ClientIdentity::confidential("demo-client", "demo-secret")?,
	)?
	.with_endpoints(Endpoints::new(
		Url::parse(&server.url("/authorize"))?,
		Url::parse(&server.url("/api/token"))?,
	)?)
	.with_client_auth_method(ClientAuthMethod::ClientSecretBasic);

	manager.subscribe(|event| println!("Token event: {event:?}."));

	// The first call runs the grant; later calls reuse the cached token.
	let request = manager
		.authorize(
			manager.http_client().get("https://api.spotify.com/v1/browse/new-releases"),
			&ScopeSet::default(),
		)
		.await?
		.build()?;

	manager.ensure_valid_token().await?;
	token_mock.assert_calls_async(1).await;

	println!("Signed request headers: {:?}.", request.headers());
	println!("Persist this: {}.", serde_json::to_string(&manager)?);

	Ok(())
}
