//! Request signing: turns a manager's access token into an `Authorization` header on any request
//! type that implements [`AuthorizeRequest`].

// crates.io
use oauth2::{HttpRequest, http::header::AUTHORIZATION};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	exchange,
	flows::{AuthorizationManager, FlowStrategy},
	http::TokenHttpClient,
};

/// Request types that can carry an `Authorization` header.
pub trait AuthorizeRequest
where
	Self: Sized,
{
	/// Returns the request with `Authorization` set to `header_value`, replacing any previous
	/// value.
	fn with_authorization(self, header_value: &str) -> Result<Self>;
}
impl AuthorizeRequest for HttpRequest {
	fn with_authorization(mut self, header_value: &str) -> Result<Self> {
		let value = exchange::header_value("authorization", header_value)?;

		self.headers_mut().insert(AUTHORIZATION, value);

		Ok(self)
	}
}
#[cfg(feature = "reqwest")]
impl AuthorizeRequest for reqwest::RequestBuilder {
	fn with_authorization(self, header_value: &str) -> Result<Self> {
		Ok(self.header(AUTHORIZATION, exchange::header_value("authorization", header_value)?))
	}
}

impl<F, C> AuthorizationManager<F, C>
where
	F: FlowStrategy,
	C: ?Sized + TokenHttpClient,
{
	/// Signs `request` with a bearer token covering `required`, refreshing first if needed.
	pub async fn authorize<R>(&self, request: R, required: &ScopeSet) -> Result<R>
	where
		R: AuthorizeRequest,
	{
		let header = self.authorization_header_value(required).await?;

		request.with_authorization(&header)
	}

	/// Signs `request`, sends it through the manager's transport, and decodes the JSON body.
	///
	/// Error bodies map to the same typed errors as token exchanges, including
	/// [`Error::RateLimited`] and [`Error::Api`].
	pub async fn send_authorized<T>(&self, request: HttpRequest, required: &ScopeSet) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let request = self.authorize(request, required).await?;

		exchange::send_json(&**self.http_client(), request).await
	}
}
