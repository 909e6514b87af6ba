//! Application credentials registered with the Spotify developer dashboard.

// std
use std::ops::Deref;
// self
use crate::{_prelude::*, auth::TokenSecret};

const CLIENT_ID_MAX_LEN: usize = 128;

/// Error returned when client identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ClientIdError {
	/// The identifier was empty.
	#[error("Client identifier cannot be empty.")]
	Empty,
	/// The identifier contains whitespace characters.
	#[error("Client identifier contains whitespace.")]
	ContainsWhitespace,
	/// The identifier exceeded the allowed character count.
	#[error("Client identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Validated OAuth client identifier.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientId(String);
impl ClientId {
	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, ClientIdError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Deref for ClientId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for ClientId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<ClientId> for String {
	fn from(value: ClientId) -> Self {
		value.0
	}
}
impl TryFrom<String> for ClientId {
	type Error = ClientIdError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl Debug for ClientId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "ClientId({})", self.0)
	}
}
impl Display for ClientId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for ClientId {
	type Err = ClientIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

/// Client id plus optional secret, fixed for the lifetime of a manager.
///
/// Confidential clients (Authorization Code, Client Credentials) carry a secret; public PKCE
/// clients do not.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity {
	/// Registered client identifier.
	pub client_id: ClientId,
	/// Registered client secret, when the application is confidential.
	pub client_secret: Option<TokenSecret>,
}
impl ClientIdentity {
	/// Validates `client_id` and pairs it with an optional secret.
	pub fn new(
		client_id: impl AsRef<str>,
		client_secret: Option<TokenSecret>,
	) -> Result<Self, ClientIdError> {
		Ok(Self { client_id: ClientId::new(client_id)?, client_secret })
	}

	/// Identity for a public client without a secret.
	pub fn public(client_id: impl AsRef<str>) -> Result<Self, ClientIdError> {
		Self::new(client_id, None)
	}

	/// Identity for a confidential client.
	pub fn confidential(
		client_id: impl AsRef<str>,
		client_secret: impl Into<TokenSecret>,
	) -> Result<Self, ClientIdError> {
		Self::new(client_id, Some(client_secret.into()))
	}

	/// Returns true when a client secret is configured.
	pub fn is_confidential(&self) -> bool {
		self.client_secret.is_some()
	}
}
impl Debug for ClientIdentity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientIdentity")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret)
			.finish()
	}
}

fn validate_view(view: &str) -> Result<(), ClientIdError> {
	if view.is_empty() {
		return Err(ClientIdError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(ClientIdError::ContainsWhitespace);
	}
	if view.len() > CLIENT_ID_MAX_LEN {
		return Err(ClientIdError::TooLong { max: CLIENT_ID_MAX_LEN });
	}

	Ok(())
}
