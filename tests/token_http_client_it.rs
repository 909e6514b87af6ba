// std
use std::collections::VecDeque;
// self
use spotify_auth::{
	auth::{ClientIdentity, Scope, ScopeSet},
	error::{Error, TransportError},
	flows::{AuthorizationManager, ClientCredentials},
	http::TokenHttpClient,
	oauth2::{
		AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
		http::{StatusCode, header::AUTHORIZATION},
	},
};

#[derive(Debug)]
struct LinkDown;
impl std::fmt::Display for LinkDown {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		f.write_str("Link is down.")
	}
}
impl std::error::Error for LinkDown {}

/// Transport that answers from a queue and remembers what it was asked.
#[derive(Clone, Default)]
struct QueueHttpClient {
	replies: std::sync::Arc<std::sync::Mutex<VecDeque<Option<&'static str>>>>,
	seen: std::sync::Arc<std::sync::Mutex<Vec<HttpRequest>>>,
}
impl QueueHttpClient {
	fn reply(self, body: Option<&'static str>) -> Self {
		self.replies.lock().expect("Reply queue lock should not be poisoned.").push_back(body);

		self
	}
}
impl TokenHttpClient for QueueHttpClient {
	type Handle = Self;
	type TransportError = LinkDown;

	fn handle(&self) -> Self::Handle {
		self.clone()
	}
}
impl<'c> AsyncHttpClient<'c> for QueueHttpClient {
	type Error = HttpClientError<LinkDown>;
	type Future = std::pin::Pin<
		Box<dyn std::future::Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>,
	>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.seen.lock().expect("Request log lock should not be poisoned.").push(request);

			let reply = self
				.replies
				.lock()
				.expect("Reply queue lock should not be poisoned.")
				.pop_front()
				.flatten();
			let body = reply.ok_or_else(|| HttpClientError::Reqwest(Box::new(LinkDown)))?;
			let mut response = HttpResponse::new(body.as_bytes().to_vec());

			*response.status_mut() = StatusCode::OK;

			Ok(response)
		})
	}
}

fn identity() -> ClientIdentity {
	ClientIdentity::confidential("custom-client", "custom-secret")
		.expect("Identity fixture should be valid.")
}

#[tokio::test]
async fn custom_transport_drives_grant_and_signed_calls() {
	let http = QueueHttpClient::default()
		.reply(Some(
			"{\"access_token\":\"custom-access\",\"token_type\":\"Bearer\",\"expires_in\":3600}",
		))
		.reply(Some("{\"display_name\":\"Listener\"}"));
	let manager =
		AuthorizationManager::<ClientCredentials, _>::with_http_client(identity(), http.clone())
			.expect("Manager should accept the custom transport.");
	let request = spotify_auth::oauth2::http::Request::builder()
		.uri("https://api.spotify.com/v1/me")
		.body(Vec::new())
		.expect("Request fixture should build.");
	let profile: serde_json::Value = manager
		.send_authorized(request, &ScopeSet::default())
		.await
		.expect("Signed request should decode.");

	assert_eq!(profile["display_name"], "Listener");

	let seen = http.seen.lock().expect("Request log lock should not be poisoned.");

	assert_eq!(seen.len(), 2);
	assert_eq!(seen[0].uri(), "https://accounts.spotify.com/api/token");
	assert_eq!(
		seen[1].headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
		Some("Bearer custom-access")
	);
}

#[tokio::test]
async fn transport_failures_map_to_network_errors() {
	let manager = AuthorizationManager::<ClientCredentials, _>::with_http_client(
		identity(),
		QueueHttpClient::default().reply(None),
	)
	.expect("Manager should accept the custom transport.");
	let err = manager
		.authorization_header_value(&ScopeSet::new([Scope::UserReadEmail]))
		.await
		.expect_err("Client credentials tokens carry no user scopes.");

	assert!(matches!(err, Error::InsufficientScope { .. }));

	let err = manager.request_tokens().await.expect_err("The link is down.");

	assert!(matches!(err, Error::Transport(TransportError::Network { .. })));
	assert!(manager.access_token().is_none());
}
