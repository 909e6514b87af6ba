//! Authorization manager shared by the three OAuth 2.0 flows.
//!
//! [`AuthorizationManager`] owns one [`TokenState`] behind a mutex and is parameterized by a
//! [`FlowStrategy`] marker ([`AuthorizationCode`], [`AuthorizationCodePkce`], or
//! [`ClientCredentials`]). Flow modules add the grant-specific operations (authorization URLs,
//! `request_tokens`); [`refresh`] adds the de-duplicated refresh coordinator.

pub mod auth_code_pkce;
pub mod authorization_code;
pub mod client_credentials;
pub mod common;
pub mod refresh;
pub mod strategy;

pub use auth_code_pkce::*;
pub use authorization_code::*;
pub use client_credentials::*;
pub use common::*;
pub use refresh::*;
pub use strategy::*;

// std
use std::marker::PhantomData;
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError};
// self
use crate::{
	_prelude::*,
	auth::{ClientId, ClientIdentity, ScopeSet, TokenSecret, TokenState},
	exchange,
	http::TokenHttpClient,
	obs::FlowKind,
	provider::{ClientAuthMethod, Endpoints},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Manager specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestAuthorizationManager<F> = AuthorizationManager<F, ReqwestHttpClient>;

type Listener = Arc<dyn Fn(AuthorizationEvent) + Send + Sync>;

/// Change notifications delivered to [`AuthorizationManager::subscribe`] listeners.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthorizationEvent {
	/// New tokens were written (grant exchange or refresh); persist the manager now.
	TokensUpdated,
	/// Tokens were cleared and the user must authorize again.
	Deauthorized,
}

pub(crate) struct ManagerState {
	pub(crate) tokens: TokenState,
	pub(crate) pending: Option<refresh::PendingRefresh>,
	/// Bumped whenever tokens are replaced from outside the refresh coordinator so an in-flight
	/// refresh never overwrites newer state.
	pub(crate) generation: u64,
}

/// Thread-safe holder of one client's tokens for flow `F`.
///
/// Clones share the same token state, listeners, and in-flight refresh. All reads and writes of
/// the state go through a single mutex that is never held across an `.await`.
pub struct AuthorizationManager<F, C>
where
	F: FlowStrategy,
	C: ?Sized + TokenHttpClient,
{
	flow: PhantomData<F>,
	endpoints: Endpoints,
	client_auth_method: ClientAuthMethod,
	identity: Arc<ClientIdentity>,
	http_client: Arc<C>,
	state: Arc<Mutex<ManagerState>>,
	listeners: Arc<RwLock<Vec<Listener>>>,
	refresh_metrics: Arc<RefreshMetrics>,
}
impl<F, C> AuthorizationManager<F, C>
where
	F: FlowStrategy,
	C: ?Sized + TokenHttpClient,
{
	/// Creates an unauthorized manager that talks to the Spotify accounts service through
	/// `http_client`.
	pub fn with_http_client(
		identity: ClientIdentity,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		F::validate_client(&identity)?;

		Ok(Self {
			flow: PhantomData,
			endpoints: Endpoints::spotify()?,
			client_auth_method: ClientAuthMethod::default(),
			identity: Arc::new(identity),
			http_client: http_client.into(),
			state: Arc::new(Mutex::new(ManagerState {
				tokens: TokenState::default(),
				pending: None,
				generation: 0,
			})),
			listeners: Default::default(),
			refresh_metrics: Default::default(),
		})
	}

	/// Rebuilds a manager from persisted state, validating the token invariants of `F`.
	pub fn from_snapshot(
		snapshot: ManagerSnapshot,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		let ManagerSnapshot { client_id, client_secret, tokens } = snapshot;

		Self::with_http_client(ClientIdentity { client_id, client_secret }, http_client)?
			.with_tokens(tokens)
	}

	/// Overrides the accounts-service endpoints.
	pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
		self.endpoints = endpoints;

		self
	}

	/// Overrides how confidential clients authenticate at the token endpoint.
	pub fn with_client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = method;

		self
	}

	/// Seeds the manager with previously obtained tokens.
	pub fn with_tokens(self, tokens: TokenState) -> Result<Self> {
		tokens.validate(&F::GRANT_REQUIREMENTS)?;

		{
			let mut state = self.state.lock();

			state.tokens = tokens;
			state.pending = None;
			state.generation += 1;
		}

		Ok(self)
	}

	/// Client id and optional secret.
	pub fn client_identity(&self) -> &ClientIdentity {
		&self.identity
	}

	/// Endpoints used for consent and token exchanges.
	pub fn endpoints(&self) -> &Endpoints {
		&self.endpoints
	}

	/// Client authentication method used at the token endpoint.
	pub fn client_auth_method(&self) -> ClientAuthMethod {
		self.client_auth_method
	}

	/// Shared transport.
	pub fn http_client(&self) -> &Arc<C> {
		&self.http_client
	}

	/// Counters describing refresh activity.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		&self.refresh_metrics
	}

	/// Copy of the current token state.
	pub fn token_state(&self) -> TokenState {
		self.state.lock().tokens.clone()
	}

	/// Current access token, if any.
	pub fn access_token(&self) -> Option<TokenSecret> {
		self.state.lock().tokens.access_token.clone()
	}

	/// Current refresh token, if any.
	pub fn refresh_token(&self) -> Option<TokenSecret> {
		self.state.lock().tokens.refresh_token.clone()
	}

	/// Expiration instant of the current access token.
	pub fn expiration_date(&self) -> Option<OffsetDateTime> {
		self.state.lock().tokens.expiration_date
	}

	/// Scopes granted to the current access token.
	pub fn scopes(&self) -> Option<ScopeSet> {
		self.state.lock().tokens.scopes.clone()
	}

	/// Returns true if an access token is present and was granted every scope in `required`.
	///
	/// Expiry is not considered; use [`access_token_is_expired`](Self::access_token_is_expired).
	pub fn is_authorized_for(&self, required: &ScopeSet) -> bool {
		self.state.lock().tokens.is_authorized_for(required)
	}

	/// Returns true if the access token is missing or expires within `tolerance`.
	pub fn access_token_is_expired(&self, tolerance: Duration) -> bool {
		self.state.lock().tokens.is_expired(tolerance)
	}

	/// Clears all tokens; the client identity is kept.
	///
	/// An in-flight refresh is abandoned and its result discarded.
	pub fn deauthorize(&self) {
		{
			let mut state = self.state.lock();

			state.tokens = TokenState::default();
			state.pending = None;
			state.generation += 1;
		}

		notify(&self.listeners, AuthorizationEvent::Deauthorized);
	}

	/// Registers a callback invoked after tokens change.
	///
	/// Callbacks run on the task that changed the tokens, after the state lock is released.
	pub fn subscribe<L>(&self, listener: L)
	where
		L: 'static + Fn(AuthorizationEvent) + Send + Sync,
	{
		self.listeners.write().push(Arc::new(listener));
	}

	/// Consistent copy of the persistable state, taken under the lock.
	pub fn snapshot(&self) -> ManagerSnapshot {
		let tokens = self.token_state();

		ManagerSnapshot {
			client_id: self.identity.client_id.clone(),
			client_secret: self.identity.client_secret.clone(),
			tokens,
		}
	}

	/// Returns a `Bearer` header value for an API call that needs `required`, refreshing first
	/// when the token is about to expire.
	///
	/// Scope coverage is checked before any network activity.
	pub async fn authorization_header_value(&self, required: &ScopeSet) -> Result<String> {
		{
			let state = self.state.lock();

			if F::KIND != FlowKind::ClientCredentials && state.tokens.access_token.is_none() {
				return Err(Error::unauthorized("no access token has been obtained"));
			}

			let granted = state.tokens.granted_scopes();

			if !granted.is_superset(required) {
				return Err(Error::InsufficientScope {
					required: required.clone(),
					authorized: granted,
				});
			}
		}

		self.ensure_valid_token().await?;

		let token = self
			.access_token()
			.ok_or_else(|| Error::unauthorized("the access token was cleared during refresh"))?;

		Ok(format!("Bearer {}", token.expose()))
	}

	/// Exchanges `form` at the token endpoint and replaces the token state on success.
	///
	/// The state is left untouched when the exchange or validation fails.
	pub(crate) async fn exchange_grant(&self, form: TokenForm) -> Result<()> {
		let request =
			form.build_request(F::KIND, &self.endpoints.token, self.client_auth_method)?;
		let response: TokenResponse = exchange::send_json(&*self.http_client, request).await?;
		let tokens = common::validate_grant(
			F::KIND,
			response,
			&F::GRANT_REQUIREMENTS,
			None,
			OffsetDateTime::now_utc(),
		)?;

		{
			let mut state = self.state.lock();

			state.tokens = tokens;
			state.pending = None;
			state.generation += 1;
		}

		notify(&self.listeners, AuthorizationEvent::TokensUpdated);

		Ok(())
	}

	pub(crate) fn shared_state(&self) -> &Arc<Mutex<ManagerState>> {
		&self.state
	}

	pub(crate) fn shared_listeners(&self) -> &Arc<RwLock<Vec<Listener>>> {
		&self.listeners
	}

	pub(crate) fn shared_refresh_metrics(&self) -> &Arc<RefreshMetrics> {
		&self.refresh_metrics
	}
}
#[cfg(feature = "reqwest")]
impl<F> AuthorizationManager<F, ReqwestHttpClient>
where
	F: FlowStrategy,
{
	/// Creates a manager backed by a default reqwest client.
	pub fn new(identity: ClientIdentity) -> Result<Self> {
		Self::with_http_client(identity, ReqwestHttpClient::default())
	}
}
impl<F, C> Clone for AuthorizationManager<F, C>
where
	F: FlowStrategy,
	C: ?Sized + TokenHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			flow: PhantomData,
			endpoints: self.endpoints.clone(),
			client_auth_method: self.client_auth_method,
			identity: self.identity.clone(),
			http_client: self.http_client.clone(),
			state: self.state.clone(),
			listeners: self.listeners.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
		}
	}
}
impl<F, C> Debug for AuthorizationManager<F, C>
where
	F: FlowStrategy,
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let tokens = self.token_state();

		f.debug_struct("AuthorizationManager")
			.field("flow", &F::KIND)
			.field("client_id", &self.identity.client_id)
			.field("client_secret_set", &self.identity.is_confidential())
			.field("endpoints", &self.endpoints)
			.field("tokens", &tokens)
			.finish()
	}
}
impl<F, C> PartialEq for AuthorizationManager<F, C>
where
	F: FlowStrategy,
	C: ?Sized + TokenHttpClient,
{
	fn eq(&self, other: &Self) -> bool {
		self.snapshot() == other.snapshot()
	}
}
impl<F, C> Eq for AuthorizationManager<F, C>
where
	F: FlowStrategy,
	C: ?Sized + TokenHttpClient,
{
}
impl<F, C> Hash for AuthorizationManager<F, C>
where
	F: FlowStrategy,
	C: ?Sized + TokenHttpClient,
{
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.snapshot().hash(state);
	}
}
impl<F, C> Serialize for AuthorizationManager<F, C>
where
	F: FlowStrategy,
	C: ?Sized + TokenHttpClient,
{
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		self.snapshot().serialize(serializer)
	}
}
impl<'de, F, C> Deserialize<'de> for AuthorizationManager<F, C>
where
	F: FlowStrategy,
	C: TokenHttpClient + Default,
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let snapshot = ManagerSnapshot::deserialize(deserializer)?;

		Self::from_snapshot(snapshot, C::default()).map_err(DeError::custom)
	}
}

/// Persistable view of a manager: client identity plus token state.
///
/// Serialized as one flat JSON object with the fields `client_id`, `client_secret` (omitted
/// when absent), `access_token`, `refresh_token`, `expiration_date` (RFC 3339), and `scopes`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ManagerSnapshot {
	/// Registered client identifier.
	pub client_id: ClientId,
	/// Registered client secret, when confidential.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_secret: Option<TokenSecret>,
	/// Token state at snapshot time.
	#[serde(flatten)]
	pub tokens: TokenState,
}
impl PartialEq for ManagerSnapshot {
	fn eq(&self, other: &Self) -> bool {
		self.client_id == other.client_id
			&& self.client_secret == other.client_secret
			&& self.tokens.matches(&other.tokens)
	}
}
impl Eq for ManagerSnapshot {}
impl Hash for ManagerSnapshot {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.client_id.hash(state);
		self.client_secret.hash(state);
		self.tokens.hash_stable(state);
	}
}

pub(crate) fn notify(listeners: &RwLock<Vec<Listener>>, event: AuthorizationEvent) {
	let listeners = listeners.read().clone();

	for listener in listeners {
		listener(event);
	}
}
