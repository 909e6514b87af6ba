//! Token refresh coordinator with at most one in-flight refresh per manager.
//!
//! The coordinator has two states: idle (no [`PendingRefresh`]) and refreshing. A caller that
//! finds the token close to expiry either joins the refresh already in flight or starts a new
//! one. Deciding and applying happen under the manager's mutex; the network call runs outside
//! it. Every waiter observes the same [`Result`].
//!
//! A refresh is driven by the callers awaiting it. The pending slot keeps the request alive, so
//! if every caller is dropped mid-flight the next one resumes the same request instead of
//! resending a refresh token that the provider may already have consumed.

mod metrics;

pub use metrics::RefreshMetrics;

// crates.io
use futures::{
	FutureExt,
	future::{BoxFuture, Shared},
};
// self
use crate::{
	_prelude::*,
	exchange,
	flows::{AuthorizationEvent, AuthorizationManager, FlowStrategy, TokenForm, TokenResponse, common},
	http::TokenHttpClient,
	obs::{self, FlowStage},
};

/// Tolerance used by [`AuthorizationManager::ensure_valid_token`].
pub const DEFAULT_EXPIRY_TOLERANCE: Duration = Duration::seconds(120);

type RefreshFuture = BoxFuture<'static, Result<RefreshOutcome>>;

/// Result of a call into the refresh coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
	/// The access token was valid beyond the tolerance; nothing was sent.
	NotNeeded,
	/// New tokens were obtained and stored.
	Refreshed,
	/// The tokens were replaced or cleared while the refresh was in flight; its result was
	/// discarded.
	Superseded,
}

/// Handle to the refresh currently in flight.
///
/// Cleared by the refresh itself once its result is applied, or by any write that bumps the
/// state generation.
pub(crate) struct PendingRefresh {
	future: Shared<RefreshFuture>,
}
impl PendingRefresh {
	fn join(&self) -> Shared<RefreshFuture> {
		self.future.clone()
	}
}

impl<F, C> AuthorizationManager<F, C>
where
	F: FlowStrategy,
	C: ?Sized + TokenHttpClient,
{
	/// Refreshes the tokens, or returns [`RefreshOutcome::NotNeeded`] when `only_if_expired` is
	/// set and the access token is valid for longer than `tolerance`.
	///
	/// Concurrent callers share a single network request. Client Credentials managers re-run
	/// their grant instead of using a refresh token.
	pub async fn refresh_tokens(
		&self,
		only_if_expired: bool,
		tolerance: Duration,
	) -> Result<RefreshOutcome> {
		obs::observe(F::KIND, FlowStage::RefreshTokens, async {
			self.shared_refresh_metrics().record_attempt();

			match self.join_or_start(only_if_expired, tolerance)? {
				Some(refresh) => refresh.await,
				None => Ok(RefreshOutcome::NotNeeded),
			}
		})
		.await
	}

	/// Refreshes only if the access token expires within [`DEFAULT_EXPIRY_TOLERANCE`].
	pub async fn ensure_valid_token(&self) -> Result<()> {
		self.refresh_tokens(true, DEFAULT_EXPIRY_TOLERANCE).await.map(|_| ())
	}

	/// Decides under the state lock whether to skip, join, or start a refresh.
	fn join_or_start(
		&self,
		only_if_expired: bool,
		tolerance: Duration,
	) -> Result<Option<Shared<RefreshFuture>>> {
		let metrics = self.shared_refresh_metrics();
		let mut state = self.shared_state().lock();

		if only_if_expired && !state.tokens.is_expired(tolerance) {
			metrics.record_skip();
			obs::log_refresh_decision(F::KIND, "skipped");

			return Ok(None);
		}
		if let Some(shared) = state.pending.as_ref().map(PendingRefresh::join) {
			metrics.record_join();
			obs::log_refresh_decision(F::KIND, "joined");

			return Ok(Some(shared));
		}

		let form = F::refresh_form(self.client_identity(), &state.tokens).inspect_err(|_| {
			metrics.record_failure();
			obs::log_refresh_decision(F::KIND, "unauthorized");
		})?;
		let shared = self.refresh_future(form, state.generation).shared();

		metrics.record_start();
		obs::log_refresh_decision(F::KIND, "started");

		state.pending = Some(PendingRefresh { future: shared.clone() });

		Ok(Some(shared))
	}

	/// Builds the shared body of one refresh: send, then relock to apply and clear the pending
	/// slot.
	fn refresh_future(&self, form: TokenForm, generation: u64) -> RefreshFuture {
		let http_client = self.http_client().clone();
		let endpoint = self.endpoints().token.clone();
		let method = self.client_auth_method();
		// Weak, since the pending slot inside the state owns this future.
		let state = Arc::downgrade(self.shared_state());
		let listeners = self.shared_listeners().clone();
		let metrics = self.shared_refresh_metrics().clone();

		async move {
			let response = async {
				let request = form.build_request(F::KIND, &endpoint, method)?;

				exchange::send_json::<C, TokenResponse>(&*http_client, request).await
			}
			.await;
			let Some(state) = state.upgrade() else {
				return Ok(RefreshOutcome::Superseded);
			};
			let (result, event) = {
				let mut state = state.lock();

				if state.generation != generation {
					obs::log_refresh_decision(F::KIND, "superseded");

					return Ok(RefreshOutcome::Superseded);
				}

				state.pending = None;

				let validated = response.and_then(|response| {
					common::validate_grant(
						F::KIND,
						response,
						&F::REFRESH_REQUIREMENTS,
						Some(&state.tokens),
						OffsetDateTime::now_utc(),
					)
				});

				match validated {
					Ok(tokens) => {
						state.tokens = tokens;

						(Ok(RefreshOutcome::Refreshed), Some(AuthorizationEvent::TokensUpdated))
					},
					Err(e) => {
						let cleared = F::on_refresh_failure(&mut state.tokens, &e);

						(Err(e), cleared.then_some(AuthorizationEvent::Deauthorized))
					},
				}
			};

			match &result {
				Ok(_) => metrics.record_success(),
				Err(_) => metrics.record_failure(),
			}
			if let Some(event) = event {
				super::notify(&listeners, event);
			}

			result
		}
		.boxed()
	}
}
