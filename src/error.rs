//! Authorization error taxonomy shared by flows, the refresh coordinator, and the exchange helper.

// self
use crate::{_prelude::*, auth::ScopeSet};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Shared, clonable error source.
///
/// Sources live behind `Arc` so a single refresh outcome can be handed to every waiter.
pub type SharedError = Arc<dyn StdError + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// Local configuration or validation problem raised before any network call.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, I/O), surfaced untouched.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// No valid or refreshable access token is available.
	#[error("Authorization has not been granted: {message}.")]
	Unauthorized {
		/// Explanation of what is missing.
		message: String,
	},
	/// The `state` returned by the provider does not match the one supplied by the caller.
	#[error(
		"The state parameter supplied when requesting tokens ({}) does not match the value received in the redirect URI ({}).",
		display_opt(supplied),
		display_opt(received)
	)]
	InvalidState {
		/// Value the caller supplied when requesting tokens.
		supplied: Option<String>,
		/// Value found in the redirect URI query string.
		received: Option<String>,
	},
	/// The endpoint requires scopes the current token was not granted.
	#[error("The request requires the scopes [{required}] but only [{authorized}] are authorized.")]
	InsufficientScope {
		/// Scopes required by the endpoint.
		required: ScopeSet,
		/// Scopes granted to the current access token.
		authorized: ScopeSet,
	},
	/// The provider reported a denial (user declined consent, invalid grant, ...).
	#[error("The provider denied the authorization request: {error}.")]
	AuthorizationDenied {
		/// Provider error code (e.g. `access_denied`, `invalid_grant`).
		error: String,
		/// Optional `error_description` supplied by the provider.
		description: Option<String>,
		/// `state` found alongside the error, if any.
		state: Option<String>,
	},
	/// A redirect URI carried neither a `code` nor an `error` parameter.
	#[error("Expected a `code` or `error` parameter in the redirect URI: {redirect}.")]
	MalformedRedirect {
		/// Redirect URI that was handed back to the flow.
		redirect: String,
	},
	/// A successful response lacked fields required by the flow or failed to decode.
	#[error("The provider returned a malformed response: {message}.")]
	MalformedResponse {
		/// Description of the protocol violation.
		message: String,
	},
	/// The provider throttled the request (HTTP 429).
	#[error("The provider rate limited the request.")]
	RateLimited {
		/// Retry-After hint, when supplied.
		retry_after: Option<Duration>,
	},
	/// The provider returned its regular API error object.
	#[error("The provider returned an error ({status}): {message}.")]
	Api {
		/// Status reported inside the error object.
		status: u16,
		/// Message reported inside the error object.
		message: String,
	},
	/// Non-success status without a recognised error envelope.
	#[error("The provider responded with HTTP {status}: {body}.")]
	UnexpectedStatus {
		/// HTTP status code.
		status: u16,
		/// Truncated body preview.
		body: String,
	},
	/// Catch-all for defensive checks.
	#[error("{message}")]
	Other {
		/// Human-readable message.
		message: String,
	},
}
impl Error {
	/// Returns `true` if the user declined the authorization request.
	pub fn access_was_denied(&self) -> bool {
		matches!(self, Self::AuthorizationDenied { error, .. } if error == "access_denied")
	}

	/// Returns `true` for failures that require the user to authorize again, as opposed to
	/// transport or decoding problems.
	pub fn is_authorization_failure(&self) -> bool {
		matches!(
			self,
			Self::Unauthorized { .. } | Self::InvalidState { .. } | Self::AuthorizationDenied { .. }
		)
	}

	pub(crate) fn unauthorized(message: impl Into<String>) -> Self {
		Self::Unauthorized { message: message.into() }
	}

	pub(crate) fn malformed(message: impl Into<String>) -> Self {
		Self::MalformedResponse { message: message.into() }
	}
}

/// Configuration and local validation failures.
#[derive(Clone, Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: SharedError,
	},
	/// HTTP request construction failed.
	#[error("HTTP request could not be constructed.")]
	HttpRequest {
		/// Underlying `http` builder failure.
		#[source]
		source: Arc<oauth2::http::Error>,
	},
	/// A header value contained characters HTTP does not allow.
	#[error("Header value for `{name}` is invalid.")]
	InvalidHeader {
		/// Header name.
		name: &'static str,
	},
	/// Endpoint URL uses a scheme other than `http`/`https`.
	#[error("The {endpoint} endpoint must use http or https: {url}.")]
	UnsupportedEndpointScheme {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Offending URL.
		url: String,
	},
	/// Client identifier failed validation.
	#[error(transparent)]
	InvalidClientId(#[from] crate::auth::ClientIdError),
	/// The flow needs a client secret but none was configured.
	#[error("The {flow} flow requires a client secret.")]
	MissingClientSecret {
		/// Flow label.
		flow: &'static str,
	},
	/// PKCE code verifier violates RFC 7636 length or alphabet rules.
	#[error(
		"The code verifier must be 43-128 characters from the URL-safe alphabet (received {length} characters)."
	)]
	InvalidCodeVerifier {
		/// Character count of the rejected verifier.
		length: usize,
	},
	/// Restored token state violates the flow's invariants.
	#[error("Token state is inconsistent: {reason}.")]
	InconsistentTokenState {
		/// Which invariant was violated.
		reason: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Arc::new(src) }
	}
}
impl From<oauth2::http::Error> for ConfigError {
	fn from(e: oauth2::http::Error) -> Self {
		Self::HttpRequest { source: Arc::new(e) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, I/O).
#[derive(Clone, Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: SharedError,
	},
	/// Underlying I/O failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io {
		/// I/O failure.
		#[source]
		source: Arc<std::io::Error>,
	},
	/// Transport reported a failure without a typed source.
	#[error("HTTP client error occurred while calling the provider: {message}.")]
	Other {
		/// Transport-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Arc::new(src) }
	}
}
impl From<std::io::Error> for TransportError {
	fn from(e: std::io::Error) -> Self {
		Self::Io { source: Arc::new(e) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

fn display_opt(value: &Option<String>) -> &str {
	value.as_deref().unwrap_or("nil")
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::Scope;

	#[test]
	fn access_denied_is_detected() {
		let denied = Error::AuthorizationDenied {
			error: "access_denied".into(),
			description: None,
			state: Some("xyz".into()),
		};
		let invalid_grant = Error::AuthorizationDenied {
			error: "invalid_grant".into(),
			description: Some("Invalid refresh token".into()),
			state: None,
		};

		assert!(denied.access_was_denied());
		assert!(!invalid_grant.access_was_denied());
		assert!(invalid_grant.is_authorization_failure());
		assert!(!Error::malformed("missing access_token").is_authorization_failure());
	}

	#[test]
	fn invalid_state_message_names_both_values() {
		let err = Error::InvalidState { supplied: Some("xyz123".into()), received: None };
		let message = err.to_string();

		assert!(message.contains("xyz123"));
		assert!(message.contains("nil"));
	}

	#[test]
	fn insufficient_scope_lists_scopes() {
		let err = Error::InsufficientScope {
			required: ScopeSet::new([Scope::UserReadPrivate, Scope::Streaming]),
			authorized: ScopeSet::new([Scope::Streaming]),
		};

		assert_eq!(
			err.to_string(),
			"The request requires the scopes [streaming user-read-private] but only [streaming] are authorized."
		);
	}

	#[test]
	fn errors_clone_with_shared_sources() {
		let err: Error =
			TransportError::from(std::io::Error::other("connection reset by peer")).into();
		let cloned = err.clone();
		let source = StdError::source(&cloned).expect("Transport errors should expose a source.");

		assert!(source.to_string().contains("connection reset"));
	}
}
