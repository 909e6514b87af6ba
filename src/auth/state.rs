//! Mutable token record owned by one authorization manager.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret},
	error::ConfigError,
	flows::{RefreshTokenRequirement, TokenRequirements},
};

/// Access/refresh token pair plus expiry and granted scopes.
///
/// Whenever `access_token` is set, `expiration_date` is set too. Code flows additionally
/// require `refresh_token` and `scopes`; [`TokenState::validate`] checks those rules for a
/// given flow.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TokenState {
	/// Bearer token sent with API requests.
	#[serde(default)]
	pub access_token: Option<TokenSecret>,
	/// Token used to obtain a new access token (absent for Client Credentials).
	#[serde(default)]
	pub refresh_token: Option<TokenSecret>,
	/// Instant after which the access token is no longer accepted.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub expiration_date: Option<OffsetDateTime>,
	/// Scopes granted to the access token (absent for Client Credentials).
	#[serde(default)]
	pub scopes: Option<ScopeSet>,
}
impl TokenState {
	/// Returns true when an access token is present.
	pub fn is_authorized(&self) -> bool {
		self.access_token.is_some()
	}

	/// Returns true if the access token is missing, has no expiry, or expires within
	/// `tolerance` of `now`.
	///
	/// A deadline outside the representable date range counts as expired.
	pub fn is_expired_at(&self, now: OffsetDateTime, tolerance: Duration) -> bool {
		match (&self.access_token, self.expiration_date) {
			(Some(_), Some(expiration)) =>
				expiration.checked_sub(tolerance).is_none_or(|deadline| now >= deadline),
			_ => true,
		}
	}

	/// [`is_expired_at`](Self::is_expired_at) against the current UTC instant.
	pub fn is_expired(&self, tolerance: Duration) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc(), tolerance)
	}

	/// Scopes granted to the current token, empty when none were recorded.
	pub fn granted_scopes(&self) -> ScopeSet {
		self.scopes.clone().unwrap_or_default()
	}

	/// Returns true if an access token is present and its scopes cover `required`.
	///
	/// The token's expiry is not considered.
	pub fn is_authorized_for(&self, required: &ScopeSet) -> bool {
		if self.access_token.is_none() {
			return false;
		}

		match &self.scopes {
			Some(granted) => granted.is_superset(required),
			None => required.is_empty(),
		}
	}

	/// Checks the invariants a flow expects of a restored or freshly written state.
	pub fn validate(&self, requirements: &TokenRequirements) -> Result<(), ConfigError> {
		if self.access_token.is_none() {
			return Ok(());
		}
		if self.expiration_date.is_none() {
			return Err(ConfigError::InconsistentTokenState {
				reason: "access token present without an expiration date",
			});
		}
		if matches!(requirements.refresh_token, RefreshTokenRequirement::Required)
			&& self.refresh_token.is_none()
		{
			return Err(ConfigError::InconsistentTokenState {
				reason: "access token present without a refresh token",
			});
		}
		if requirements.scopes && self.scopes.is_none() {
			return Err(ConfigError::InconsistentTokenState {
				reason: "access token present without granted scopes",
			});
		}

		Ok(())
	}

	/// Compares two states field by field, treating expirations less than one second apart as
	/// equal.
	pub fn matches(&self, other: &Self) -> bool {
		let expiration_matches = match (self.expiration_date, other.expiration_date) {
			(Some(lhs), Some(rhs)) => (lhs - rhs).abs() < Duration::SECOND,
			(None, None) => true,
			_ => false,
		};

		self.access_token == other.access_token
			&& self.refresh_token == other.refresh_token
			&& self.scopes == other.scopes
			&& expiration_matches
	}

	/// Feeds every field except the expiration date into `state`.
	///
	/// Expirations compare with a tolerance, so hashing them would break the
	/// `a == b => hash(a) == hash(b)` contract.
	pub(crate) fn hash_stable<H: Hasher>(&self, state: &mut H) {
		self.access_token.hash(state);
		self.refresh_token.hash(state);
		self.scopes.hash(state);
	}
}
