//! Authorization core for the Spotify Web API: Authorization Code, Authorization Code + PKCE,
//! and Client Credentials flows sharing one thread-safe token state with de-duplicated refresh.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod exchange;
pub mod ext;
pub mod flows;
pub mod http;
pub mod obs;
pub mod provider;
#[cfg(feature = "reqwest")]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers shared by the integration tests and demos.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{ClientIdentity, Scope, ScopeSet, TokenSecret},
		flows::{AuthorizationManager, FlowStrategy},
		http::ReqwestHttpClient,
		provider::Endpoints,
	};

	/// Manager type alias used by reqwest-backed integration tests.
	pub type ReqwestTestManager<F> = AuthorizationManager<F, ReqwestHttpClient>;

	/// Builds a reqwest HTTP client that tolerates the self-signed certificates a local mock
	/// server may present.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Points both the authorize and token endpoints at a mock server base URL.
	pub fn mock_endpoints(base_url: &str) -> Endpoints {
		Endpoints::new(
			Url::parse(&format!("{base_url}/authorize"))
				.expect("Mock authorize endpoint should parse successfully."),
			Url::parse(&format!("{base_url}/api/token"))
				.expect("Mock token endpoint should parse successfully."),
		)
		.expect("Mock endpoints should pass validation.")
	}

	/// Constructs a manager for flow `F` backed by the test reqwest transport.
	pub fn build_reqwest_test_manager<F>(
		endpoints: Endpoints,
		client_id: &str,
		client_secret: Option<&str>,
	) -> ReqwestTestManager<F>
	where
		F: FlowStrategy,
	{
		let identity = ClientIdentity::new(client_id, client_secret.map(TokenSecret::from))
			.expect("Client identity fixture should be valid.");

		AuthorizationManager::with_http_client(identity, test_reqwest_http_client())
			.expect("Manager fixture should accept the client identity.")
			.with_endpoints(endpoints)
	}

	/// Scope set fixture built from known scopes.
	pub fn scopes<I>(values: I) -> ScopeSet
	where
		I: IntoIterator<Item = Scope>,
	{
		ScopeSet::new(values)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeSet, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::{Hash, Hasher},
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
