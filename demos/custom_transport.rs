//! Plugs a non-reqwest transport into the manager.
//!
//! 1. Implement [`TokenHttpClient`] and hand out a handle implementing [`AsyncHttpClient`].
//! 2. Turn each [`HttpRequest`] into an [`HttpResponse`]; transport failures go through
//!    [`HttpClientError`].
//! 3. Build the manager with [`AuthorizationManager::with_http_client`].

// std
use std::{
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	future::Future,
	pin::Pin,
};
// crates.io
use color_eyre::Result;
// self
use spotify_auth::{
	auth::{ClientIdentity, ScopeSet},
	error::Error,
	flows::{AuthorizationManager, ClientCredentials},
	http::TokenHttpClient,
	oauth2::{
		AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
		http::{Method, StatusCode},
	},
};

#[derive(Debug)]
struct OfflineError;
impl Display for OfflineError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("The canned transport only knows the token endpoint.")
	}
}
impl StdError for OfflineError {}

/// Answers token requests with a canned grant and fails everything else.
#[derive(Clone, Copy, Debug, Default)]
struct CannedHttpClient;
impl TokenHttpClient for CannedHttpClient {
	type Handle = Self;
	type TransportError = OfflineError;

	fn handle(&self) -> Self::Handle {
		*self
	}
}
impl<'c> AsyncHttpClient<'c> for CannedHttpClient {
	type Error = HttpClientError<OfflineError>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			if request.method() != Method::POST || request.uri().path() != "/api/token" {
				return Err(HttpClientError::Reqwest(Box::new(OfflineError)));
			}

			let mut response = HttpResponse::new(
				b"{\"access_token\":\"canned\",\"token_type\":\"Bearer\",\"expires_in\":3600}".to_vec(),
			);

			*response.status_mut() = StatusCode::OK;

			Ok(response)
		})
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let manager = AuthorizationManager::<ClientCredentials, _>::with_http_client(
		ClientIdentity::confidential("demo-client", "demo-secret")?,
		CannedHttpClient,
	)?;

	println!("Header: {}.", manager.authorization_header_value(&ScopeSet::default()).await?);

	let request = spotify_auth::oauth2::http::Request::builder()
		.uri("https://api.spotify.com/v1/markets")
		.body(Vec::new())?;

	match manager.send_authorized::<serde_json::Value>(request, &ScopeSet::default()).await {
		Err(Error::Transport(e)) => println!("Transport failure as expected: {e}."),
		other => println!("Unexpected result: {other:?}."),
	}

	Ok(())
}
