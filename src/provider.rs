//! Accounts-service endpoints and client authentication settings.

// self
use crate::{_prelude::*, error::ConfigError};

/// Default authorization endpoint of the Spotify accounts service.
pub const SPOTIFY_AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
/// Default token endpoint of the Spotify accounts service.
pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// OAuth 2.0 grant types sent in the `grant_type` form field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Authorization Code grant (with or without PKCE).
	AuthorizationCode,
	/// Refresh Token grant.
	RefreshToken,
	/// Client Credentials grant for app-only tokens.
	ClientCredentials,
}
impl GrantType {
	/// Returns the RFC 6749 identifier for the grant type.
	pub fn as_str(self) -> &'static str {
		match self {
			GrantType::AuthorizationCode => "authorization_code",
			GrantType::RefreshToken => "refresh_token",
			GrantType::ClientCredentials => "client_credentials",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How confidential clients present their secret to the token endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	/// Form body parameters `client_id`/`client_secret`.
	#[default]
	ClientSecretPost,
	/// HTTP Basic `Authorization` header built from `client_id:client_secret`.
	ClientSecretBasic,
}

/// Authorization and token endpoints used by every flow.
///
/// Both URLs must use `http` or `https`; plain `http` exists for local mock servers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEndpoints")]
pub struct Endpoints {
	/// Page the user is sent to for consent.
	pub authorization: Url,
	/// Endpoint accepting grant exchanges and refreshes.
	pub token: Url,
}
impl Endpoints {
	/// Validates and pairs the two endpoints.
	pub fn new(authorization: Url, token: Url) -> Result<Self, ConfigError> {
		validate_scheme("authorization", &authorization)?;
		validate_scheme("token", &token)?;

		Ok(Self { authorization, token })
	}

	/// Production Spotify accounts-service endpoints.
	pub fn spotify() -> Result<Self> {
		let authorization = Url::parse(SPOTIFY_AUTHORIZE_URL)
			.map_err(|e| Error::Other { message: format!("Invalid authorize URL: {e}.") })?;
		let token = Url::parse(SPOTIFY_TOKEN_URL)
			.map_err(|e| Error::Other { message: format!("Invalid token URL: {e}.") })?;

		Ok(Self::new(authorization, token)?)
	}
}

#[derive(Deserialize)]
struct RawEndpoints {
	authorization: Url,
	token: Url,
}
impl TryFrom<RawEndpoints> for Endpoints {
	type Error = ConfigError;

	fn try_from(raw: RawEndpoints) -> Result<Self, Self::Error> {
		Self::new(raw.authorization, raw.token)
	}
}

fn validate_scheme(endpoint: &'static str, url: &Url) -> Result<(), ConfigError> {
	match url.scheme() {
		"http" | "https" => Ok(()),
		_ => Err(ConfigError::UnsupportedEndpointScheme { endpoint, url: url.to_string() }),
	}
}
