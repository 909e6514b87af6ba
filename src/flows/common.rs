//! Steps shared by the three flows: redirect handling, token forms, and response validation.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use oauth2::HttpRequest;
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{ClientId, ClientIdentity, ScopeSet, TokenSecret, TokenState},
	exchange,
	flows::{RefreshTokenRequirement, TokenRequirements},
	obs::{self, FlowKind},
	provider::{ClientAuthMethod, GrantType},
};

const CLIENT_ID_FIELD: &str = "client_id";
const CLIENT_SECRET_FIELD: &str = "client_secret";

#[derive(Clone)]
enum FormValue {
	Plain(String),
	Secret(TokenSecret),
}
impl FormValue {
	fn expose(&self) -> &str {
		match self {
			Self::Plain(value) => value,
			Self::Secret(secret) => secret.expose(),
		}
	}
}

/// Ordered `application/x-www-form-urlencoded` body for the token endpoint.
///
/// Secret-bearing fields are tracked so the body can be logged with their values redacted.
#[derive(Clone)]
pub struct TokenForm {
	grant_type: GrantType,
	fields: Vec<(&'static str, FormValue)>,
}
impl TokenForm {
	/// Starts a form for `grant_type`.
	pub fn new(grant_type: GrantType) -> Self {
		let fields = vec![("grant_type", FormValue::Plain(grant_type.as_str().into()))];

		Self { grant_type, fields }
	}

	/// Grant type carried by the form.
	pub fn grant_type(&self) -> GrantType {
		self.grant_type
	}

	/// Appends a non-sensitive field.
	pub fn param(mut self, key: &'static str, value: impl Into<String>) -> Self {
		self.fields.push((key, FormValue::Plain(value.into())));

		self
	}

	/// Appends a field whose value must never be logged.
	pub fn secret(mut self, key: &'static str, value: impl Into<TokenSecret>) -> Self {
		self.fields.push((key, FormValue::Secret(value.into())));

		self
	}

	/// Appends `client_id` and, for confidential clients, `client_secret`.
	pub fn client(mut self, identity: &ClientIdentity) -> Self {
		self.fields.push((CLIENT_ID_FIELD, FormValue::Plain(identity.client_id.to_string())));

		if let Some(secret) = &identity.client_secret {
			self.fields.push((CLIENT_SECRET_FIELD, FormValue::Secret(secret.clone())));
		}

		self
	}

	/// Returns the value stored for `key`, if any.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.fields.iter().find(|(k, _)| *k == key).map(|(_, v)| v.expose())
	}

	/// Encodes the body and, for [`ClientAuthMethod::ClientSecretBasic`], the `Authorization`
	/// header that replaces the body credentials.
	pub fn encode(&self, method: ClientAuthMethod) -> (String, Option<String>) {
		let authorization = match method {
			ClientAuthMethod::ClientSecretBasic => self.basic_credentials(),
			ClientAuthMethod::ClientSecretPost => None,
		};
		let mut serializer = form_urlencoded::Serializer::new(String::new());

		for (key, value) in &self.fields {
			if authorization.is_some() && matches!(*key, CLIENT_ID_FIELD | CLIENT_SECRET_FIELD) {
				continue;
			}

			serializer.append_pair(key, value.expose());
		}

		(serializer.finish(), authorization)
	}

	/// Body rendering with secret values replaced by `<redacted>`.
	pub fn redacted(&self) -> String {
		let mut serializer = form_urlencoded::Serializer::new(String::new());

		for (key, value) in &self.fields {
			match value {
				FormValue::Plain(value) => serializer.append_pair(key, value),
				FormValue::Secret(_) => serializer.append_pair(key, "<redacted>"),
			};
		}

		serializer.finish()
	}

	/// Builds the `POST` request against `endpoint`.
	pub fn build_request(
		&self,
		kind: FlowKind,
		endpoint: &Url,
		method: ClientAuthMethod,
	) -> Result<HttpRequest> {
		let (body, authorization) = self.encode(method);

		obs::log_token_request(kind, &self.redacted());

		exchange::form_post(endpoint, body, authorization.as_deref())
	}

	fn basic_credentials(&self) -> Option<String> {
		let id = self.get(CLIENT_ID_FIELD)?;
		let secret = self.get(CLIENT_SECRET_FIELD)?;
		let id = form_urlencoded::byte_serialize(id.as_bytes()).collect::<String>();
		let secret = form_urlencoded::byte_serialize(secret.as_bytes()).collect::<String>();

		Some(format!("Basic {}", STANDARD.encode(format!("{id}:{secret}"))))
	}
}
impl Debug for TokenForm {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenForm").field(&self.redacted()).finish()
	}
}

/// Token endpoint response; every field is optional on the wire.
#[derive(Clone, Default, Deserialize)]
pub struct TokenResponse {
	/// Issued access token.
	#[serde(default)]
	pub access_token: Option<TokenSecret>,
	/// Token type (always `Bearer` for Spotify).
	#[serde(default)]
	pub token_type: Option<String>,
	/// Space-joined granted scopes.
	#[serde(default)]
	pub scope: Option<String>,
	/// Lifetime of the access token in seconds.
	#[serde(default)]
	pub expires_in: Option<i64>,
	/// Issued refresh token.
	#[serde(default)]
	pub refresh_token: Option<TokenSecret>,
}
impl Debug for TokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenResponse")
			.field("access_token", &self.access_token)
			.field("token_type", &self.token_type)
			.field("scope", &self.scope)
			.field("expires_in", &self.expires_in)
			.field("refresh_token", &self.refresh_token)
			.finish()
	}
}

/// Turns a token response into a new [`TokenState`], enforcing `requirements`.
///
/// `previous` supplies the refresh token kept when the response omits an optional one. Nothing
/// is written anywhere; callers replace their state only when this succeeds.
pub fn validate_grant(
	kind: FlowKind,
	response: TokenResponse,
	requirements: &TokenRequirements,
	previous: Option<&TokenState>,
	now: OffsetDateTime,
) -> Result<TokenState> {
	let violation = |message: &str| {
		obs::log_protocol_violation(kind, message);

		Error::malformed(message)
	};
	let access_token =
		response.access_token.ok_or_else(|| violation("missing `access_token`"))?;
	let expires_in = response.expires_in.ok_or_else(|| violation("missing `expires_in`"))?;

	if expires_in <= 0 {
		return Err(violation("non-positive `expires_in`"));
	}

	let expiration_date = now
		.checked_add(Duration::seconds(expires_in))
		.ok_or_else(|| violation("`expires_in` out of range"))?;

	let refresh_token = match (response.refresh_token, requirements.refresh_token) {
		(Some(token), _) => Some(token),
		(None, RefreshTokenRequirement::Required) =>
			return Err(violation("missing `refresh_token`")),
		(None, RefreshTokenRequirement::Optional) =>
			previous.and_then(|state| state.refresh_token.clone()),
	};
	let scopes = if requirements.scopes {
		let raw = response.scope.ok_or_else(|| violation("missing `scope`"))?;

		Some(ScopeSet::from_space_delimited_lenient(&raw))
	} else {
		None
	};

	Ok(TokenState {
		access_token: Some(access_token),
		refresh_token,
		expiration_date: Some(expiration_date),
		scopes,
	})
}

/// Extracts the authorization `code` from a redirect, validating `state` on the way.
///
/// An `error` parameter without a `code` is reported as [`Error::AuthorizationDenied`]; a
/// redirect carrying neither is [`Error::MalformedRedirect`].
pub fn authorization_code_from_redirect(
	kind: FlowKind,
	redirect: &Url,
	supplied_state: Option<&str>,
) -> Result<String> {
	let mut pairs = HashMap::new();

	for (key, value) in redirect.query_pairs() {
		pairs.entry(key.into_owned()).or_insert_with(|| value.into_owned());
	}

	let received_state = pairs.remove("state");

	if let Some(code) = pairs.remove("code") {
		if supplied_state != received_state.as_deref() {
			return Err(Error::InvalidState {
				supplied: supplied_state.map(str::to_owned),
				received: received_state,
			});
		}

		return Ok(code);
	}
	if let Some(error) = pairs.remove("error") {
		let description = pairs.remove("error_description");

		obs::log_redirect_error(kind, &error, description.as_deref());

		return Err(Error::AuthorizationDenied { error, description, state: received_state });
	}

	Err(Error::MalformedRedirect { redirect: redirect.to_string() })
}

/// Redirect URI as registered with the provider: no query, no fragment, no trailing slash.
pub fn base_redirect_uri(redirect: &Url) -> String {
	let mut base = redirect.clone();

	base.set_query(None);
	base.set_fragment(None);

	let mut rendered = String::from(base);

	if rendered.ends_with('/') {
		rendered.pop();
	}

	rendered
}

/// Builds the consent URL shared by both code flows.
///
/// Empty scope sets and a missing `state` are left out of the query entirely.
pub fn authorization_url(
	endpoint: &Url,
	client_id: &ClientId,
	redirect: &Url,
	show_dialog: bool,
	state: Option<&str>,
	scopes: &ScopeSet,
	code_challenge: Option<&str>,
) -> Url {
	let mut url = endpoint.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("client_id", client_id);
	pairs.append_pair("response_type", "code");
	pairs.append_pair("redirect_uri", &base_redirect_uri(redirect));

	if !scopes.is_empty() {
		pairs.append_pair("scope", &scopes.to_space_delimited());
	}

	pairs.append_pair("show_dialog", if show_dialog { "true" } else { "false" });

	if let Some(state) = state {
		pairs.append_pair("state", state);
	}
	if let Some(challenge) = code_challenge {
		pairs.append_pair("code_challenge_method", "S256");
		pairs.append_pair("code_challenge", challenge);
	}

	drop(pairs);

	url
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;
	use crate::auth::Scope;

	const CODE_FLOW: TokenRequirements =
		TokenRequirements { refresh_token: RefreshTokenRequirement::Required, scopes: true };

	fn url(raw: &str) -> Url {
		Url::parse(raw).expect("Fixture URL should parse.")
	}

	fn response() -> TokenResponse {
		TokenResponse {
			access_token: Some(TokenSecret::new("access")),
			token_type: Some("Bearer".into()),
			scope: Some("user-read-private brand-new-scope".into()),
			expires_in: Some(3600),
			refresh_token: Some(TokenSecret::new("refresh")),
		}
	}

	#[test]
	fn redirect_uri_drops_query_and_trailing_slash() {
		for (raw, expected) in [
			("https://app.example.com/cb/?a=1", "https://app.example.com/cb"),
			("https://app.example.com/cb#frag", "https://app.example.com/cb"),
			("http://127.0.0.1:8080/", "http://127.0.0.1:8080"),
		] {
			assert_eq!(base_redirect_uri(&url(raw)), expected);
		}
	}

	#[test]
	fn redirect_state_must_match() {
		let kind = FlowKind::AuthorizationCode;
		let ok = url("https://app.example.com/cb?code=abc&state=xyz123");

		assert_eq!(
			authorization_code_from_redirect(kind, &ok, Some("xyz123")).expect("State matches."),
			"abc"
		);
		assert_eq!(
			authorization_code_from_redirect(kind, &url("https://app.example.com/cb?code=abc"), None)
				.expect("Both states absent is a match."),
			"abc"
		);

		let err = authorization_code_from_redirect(
			kind,
			&url("https://app.example.com/cb?code=abc"),
			Some("xyz123"),
		)
		.expect_err("Missing state must fail.");

		assert!(matches!(
			err,
			Error::InvalidState { supplied: Some(ref s), received: None } if s == "xyz123"
		));
	}

	#[test]
	fn redirect_errors_are_denials() {
		let err = authorization_code_from_redirect(
			FlowKind::AuthorizationCodePkce,
			&url("https://app.example.com/cb?error=access_denied&state=xyz"),
			Some("other"),
		)
		.expect_err("Error redirects must fail.");

		assert!(err.access_was_denied());
		assert!(matches!(err, Error::AuthorizationDenied { state: Some(ref s), .. } if s == "xyz"));

		let err = authorization_code_from_redirect(
			FlowKind::AuthorizationCodePkce,
			&url("https://app.example.com/cb?foo=bar"),
			None,
		)
		.expect_err("Redirects without code or error must fail.");

		assert!(matches!(err, Error::MalformedRedirect { .. }));
	}

	#[test]
	fn grant_validation_enforces_required_fields() {
		let now = datetime!(2030-01-01 0:00 UTC);
		let state =
			validate_grant(FlowKind::AuthorizationCode, response(), &CODE_FLOW, None, now)
				.expect("Complete responses should validate.");

		assert_eq!(state.expiration_date, Some(datetime!(2030-01-01 1:00 UTC)));
		assert_eq!(state.scopes, Some(ScopeSet::new([Scope::UserReadPrivate])));

		for strip in [
			|r: &mut TokenResponse| r.access_token = None,
			|r: &mut TokenResponse| r.refresh_token = None,
			|r: &mut TokenResponse| r.scope = None,
			|r: &mut TokenResponse| r.expires_in = Some(0),
		] {
			let mut partial = response();

			strip(&mut partial);

			let err = validate_grant(FlowKind::AuthorizationCode, partial, &CODE_FLOW, None, now)
				.expect_err("Incomplete responses must be rejected.");

			assert!(matches!(err, Error::MalformedResponse { .. }));
		}
	}

	#[test]
	fn unrepresentable_expiry_is_malformed() {
		let err = validate_grant(
			FlowKind::ClientCredentials,
			TokenResponse { expires_in: Some(i64::MAX), ..response() },
			&CODE_FLOW,
			None,
			datetime!(2030-01-01 0:00 UTC),
		)
		.expect_err("Expiry beyond the representable range must be rejected.");

		assert!(matches!(
			err,
			Error::MalformedResponse { ref message } if message.contains("out of range")
		));
	}

	#[test]
	fn optional_refresh_tokens_carry_over() {
		let previous = TokenState {
			refresh_token: Some(TokenSecret::new("kept")),
			..Default::default()
		};
		let requirements =
			TokenRequirements { refresh_token: RefreshTokenRequirement::Optional, scopes: false };
		let state = validate_grant(
			FlowKind::AuthorizationCode,
			TokenResponse { refresh_token: None, ..response() },
			&requirements,
			Some(&previous),
			OffsetDateTime::now_utc(),
		)
		.expect("Optional refresh tokens may be omitted.");

		assert_eq!(state.refresh_token, Some(TokenSecret::new("kept")));
		assert_eq!(state.scopes, None);
	}

	#[test]
	fn forms_redact_and_switch_to_basic_auth() {
		let identity = ClientIdentity::confidential("client", "s3cret")
			.expect("Confidential identity fixture should be valid.");
		let form = TokenForm::new(GrantType::AuthorizationCode)
			.secret("code", "the-code")
			.param("redirect_uri", "https://app.example.com/cb")
			.client(&identity);
		let (body, authorization) = form.encode(ClientAuthMethod::ClientSecretPost);

		assert_eq!(
			body,
			"grant_type=authorization_code&code=the-code&redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb&client_id=client&client_secret=s3cret"
		);
		assert_eq!(authorization, None);
		assert!(!form.redacted().contains("s3cret"));
		assert!(!format!("{form:?}").contains("the-code"));

		let (body, authorization) = form.encode(ClientAuthMethod::ClientSecretBasic);

		assert!(!body.contains("client_"));
		assert_eq!(authorization.as_deref(), Some("Basic Y2xpZW50OnMzY3JldA=="));
	}

	#[test]
	fn authorization_urls_follow_wire_order() {
		let client_id = ClientId::new("client").expect("Client id fixture should be valid.");
		let built = authorization_url(
			&url("https://accounts.example.com/authorize"),
			&client_id,
			&url("https://app.example.com/cb"),
			false,
			None,
			&ScopeSet::default(),
			Some("challenge"),
		);
		let keys = built.query_pairs().map(|(k, _)| k.into_owned()).collect::<Vec<_>>();

		assert_eq!(
			keys,
			[
				"client_id",
				"response_type",
				"redirect_uri",
				"show_dialog",
				"code_challenge_method",
				"code_challenge"
			]
		);
	}
}
