#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use spotify_auth::{
	_preludet::*,
	auth::Scope,
	flows::{AuthorizationCode, AuthorizationEvent},
};

const CLIENT_ID: &str = "client-it";
const CLIENT_SECRET: &str = "secret-it";

fn redirect(raw: &str) -> Url {
	Url::parse(raw).expect("Redirect fixture should parse successfully.")
}

#[tokio::test]
async fn authorize_then_exchange_stores_tokens() {
	let server = MockServer::start_async().await;
	let manager = build_reqwest_test_manager::<AuthorizationCode>(
		mock_endpoints(&server.base_url()),
		CLIENT_ID,
		Some(CLIENT_SECRET),
	);
	let updates = Arc::new(Mutex::new(Vec::new()));
	let seen = updates.clone();

	manager.subscribe(move |event| seen.lock().push(event));

	let requested = scopes([Scope::UserReadPrivate, Scope::PlaylistModifyPrivate]);
	let consent = manager.make_authorization_url(
		&redirect("https://app.example.com/callback"),
		false,
		Some("state-it"),
		&requested,
	);
	let pairs: HashMap<_, _> = consent.query_pairs().into_owned().collect();

	assert_eq!(consent.path(), "/authorize");
	assert_eq!(pairs.get("client_id").map(String::as_str), Some(CLIENT_ID));
	assert_eq!(
		pairs.get("scope").map(String::as_str),
		Some("user-read-private playlist-modify-private")
	);
	assert_eq!(pairs.get("show_dialog").map(String::as_str), Some("false"));
	assert!(!pairs.contains_key("code_challenge"));

	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/token")
				.header("content-type", "application/x-www-form-urlencoded")
				.form_urlencoded_tuple("grant_type", "authorization_code")
				.form_urlencoded_tuple("code", "code-it")
				.form_urlencoded_tuple("redirect_uri", "https://app.example.com/callback")
				.form_urlencoded_tuple("client_secret", CLIENT_SECRET);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-it\",\"token_type\":\"Bearer\",\"scope\":\"user-read-private playlist-modify-private\",\"expires_in\":3600,\"refresh_token\":\"refresh-it\"}",
			);
		})
		.await;

	manager
		.request_tokens(
			&redirect("https://app.example.com/callback?code=code-it&state=state-it"),
			Some("state-it"),
		)
		.await
		.expect("Authorization code exchange should succeed.");
	mock.assert_async().await;

	assert!(manager.is_authorized_for(&requested));
	assert_eq!(manager.access_token().map(|t| t.expose().to_owned()), Some("access-it".into()));
	assert_eq!(*updates.lock(), [AuthorizationEvent::TokensUpdated]);
	assert_eq!(
		manager
			.authorization_header_value(&scopes([Scope::UserReadPrivate]))
			.await
			.expect("Fresh tokens should sign requests."),
		"Bearer access-it"
	);
}

#[tokio::test]
async fn provider_denials_keep_previous_state() {
	let server = MockServer::start_async().await;
	let manager = build_reqwest_test_manager::<AuthorizationCode>(
		mock_endpoints(&server.base_url()),
		CLIENT_ID,
		Some(CLIENT_SECRET),
	);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(400).header("content-type", "application/json").body(
				"{\"error\":\"invalid_grant\",\"error_description\":\"Invalid authorization code\"}",
			);
		})
		.await;
	let err = manager
		.request_tokens(&redirect("https://app.example.com/callback?code=stale"), None)
		.await
		.expect_err("Rejected codes must fail.");

	mock.assert_async().await;

	assert!(matches!(
		err,
		Error::AuthorizationDenied { ref error, description: Some(ref description), .. }
			if error == "invalid_grant" && description == "Invalid authorization code"
	));
	assert!(manager.access_token().is_none());
}

#[tokio::test]
async fn user_denial_in_redirect_skips_the_token_endpoint() {
	let server = MockServer::start_async().await;
	let manager = build_reqwest_test_manager::<AuthorizationCode>(
		mock_endpoints(&server.base_url()),
		CLIENT_ID,
		Some(CLIENT_SECRET),
	);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token");
			then.status(500);
		})
		.await;
	let err = manager
		.request_tokens(
			&redirect("https://app.example.com/callback?error=access_denied&state=abc"),
			Some("abc"),
		)
		.await
		.expect_err("Denied consent must fail.");

	mock.assert_calls_async(0).await;

	assert!(err.access_was_denied());
	assert!(err.is_authorization_failure());
}
