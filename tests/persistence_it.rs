#![cfg(feature = "reqwest")]

// self
use spotify_auth::{
	_preludet::*,
	auth::{Scope, TokenSecret, TokenState},
	error::ConfigError,
	flows::{AuthorizationCodePkce, ClientCredentials, ReqwestAuthorizationManager},
};

const PERSISTED: &str = r#"{
	"client_id": "persisted-client",
	"access_token": "access",
	"refresh_token": "refresh",
	"expiration_date": "2031-05-01T12:00:00Z",
	"scopes": ["user-read-email", "user-top-read"]
}"#;

#[test]
fn persisted_pkce_manager_round_trips() {
	let manager: ReqwestAuthorizationManager<AuthorizationCodePkce> =
		serde_json::from_str(PERSISTED).expect("Persisted managers should load.");

	assert_eq!(manager.client_identity().client_id.as_ref(), "persisted-client");
	assert!(manager.client_identity().client_secret.is_none());
	assert!(manager.is_authorized_for(&scopes([Scope::UserTopRead])));
	assert_eq!(
		manager.expiration_date(),
		Some(time::macros::datetime!(2031-05-01 12:00 UTC))
	);

	let json = serde_json::to_string(&manager).expect("Managers should serialize.");

	assert!(!json.contains("client_secret"));

	let reloaded: ReqwestAuthorizationManager<AuthorizationCodePkce> =
		serde_json::from_str(&json).expect("Serialized managers should load again.");

	assert_eq!(reloaded, manager);
}

#[test]
fn persisted_state_must_satisfy_flow_invariants() {
	let missing_refresh = r#"{
		"client_id": "persisted-client",
		"access_token": "access",
		"expiration_date": "2031-05-01T12:00:00Z",
		"scopes": []
	}"#;
	let err = serde_json::from_str::<ReqwestAuthorizationManager<AuthorizationCodePkce>>(
		missing_refresh,
	)
	.expect_err("PKCE tokens without a refresh token must be rejected.");

	assert!(err.to_string().contains("refresh"));

	let err = serde_json::from_str::<ReqwestAuthorizationManager<ClientCredentials>>(PERSISTED)
		.expect_err("Client credentials managers need a secret.");

	assert!(err.to_string().contains("secret"));
}

#[test]
fn seeded_tokens_are_validated_before_use() {
	let manager = build_reqwest_test_manager::<ClientCredentials>(
		mock_endpoints("http://127.0.0.1:9"),
		"seeded",
		Some("secret"),
	);
	let err = manager
		.with_tokens(TokenState {
			access_token: Some(TokenSecret::new("access")),
			expiration_date: None,
			..Default::default()
		})
		.expect_err("Access tokens need an expiration date.");

	assert!(matches!(err, Error::Config(ConfigError::InconsistentTokenState { .. })));
}
