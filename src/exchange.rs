//! Generic "send, then decode success or map to a typed error" helper.
//!
//! Token exchanges and ordinary Web API calls share the same response handling:
//!
//! 1. HTTP 429 becomes [`Error::RateLimited`] carrying the `Retry-After` hint.
//! 2. The accounts-service envelope `{"error": "...", "error_description": "..."}` becomes
//!    [`Error::AuthorizationDenied`].
//! 3. The Web API envelope `{"error": {"status": ..., "message": "..."}}` becomes [`Error::Api`].
//! 4. Any other non-success status becomes [`Error::UnexpectedStatus`] with a body preview.
//! 5. Success bodies decode into the caller's type; failures become
//!    [`Error::MalformedResponse`] naming the JSON path that failed.
//!
//! Error envelopes are checked before the success body because token responses declare every
//! field optional, so an error payload would otherwise decode as an empty success.

// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
	http::{
		HeaderMap, HeaderValue, Method, StatusCode,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER},
	},
};
use serde::de::DeserializeOwned;
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
	http::TokenHttpClient,
};

const BODY_PREVIEW_LIMIT: usize = 256;
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Deserialize)]
struct AuthErrorEnvelope {
	error: String,
	#[serde(default)]
	error_description: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
	error: ApiErrorBody,
}
#[derive(Deserialize)]
struct ApiErrorBody {
	status: u16,
	message: String,
}

/// Builds a form-encoded `POST` with an `Accept: application/json` header.
///
/// `authorization` is attached verbatim as the `Authorization` header when present.
pub fn form_post(url: &Url, body: String, authorization: Option<&str>) -> Result<HttpRequest> {
	let mut builder = oauth2::http::Request::builder()
		.method(Method::POST)
		.uri(url.as_str())
		.header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
		.header(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE));

	if let Some(value) = authorization {
		builder = builder.header(AUTHORIZATION, header_value("authorization", value)?);
	}

	builder.body(body.into_bytes()).map_err(|e| ConfigError::from(e).into())
}

/// Sends `request` through the transport, mapping transport failures into [`Error`].
pub async fn send<C>(http: &C, request: HttpRequest) -> Result<HttpResponse>
where
	C: ?Sized + TokenHttpClient,
{
	let handle = http.handle();

	handle.call(request).await.map_err(map_transport_error)
}

/// Sends `request` and decodes the response body into `T`.
pub async fn send_json<C, T>(http: &C, request: HttpRequest) -> Result<T>
where
	C: ?Sized + TokenHttpClient,
	T: DeserializeOwned,
{
	let response = send(http, request).await?;

	decode_response(&response)
}

/// Maps `response` to `T` or to the typed error its status and body describe.
pub fn decode_response<T>(response: &HttpResponse) -> Result<T>
where
	T: DeserializeOwned,
{
	let status = response.status();
	let body = response.body();

	if status == StatusCode::TOO_MANY_REQUESTS {
		return Err(Error::RateLimited { retry_after: parse_retry_after(response.headers()) });
	}
	if let Ok(envelope) = serde_json::from_slice::<AuthErrorEnvelope>(body) {
		return Err(Error::AuthorizationDenied {
			error: envelope.error,
			description: envelope.error_description,
			state: None,
		});
	}
	if let Ok(envelope) = serde_json::from_slice::<ApiErrorEnvelope>(body) {
		return Err(Error::Api { status: envelope.error.status, message: envelope.error.message });
	}
	if !status.is_success() {
		return Err(Error::UnexpectedStatus {
			status: status.as_u16(),
			body: truncate_preview(&String::from_utf8_lossy(body)),
		});
	}

	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
		let path = e.path().to_string();

		Error::malformed(format!("failed to decode `{path}`: {}", e.into_inner()))
	})
}

/// Parses a `Retry-After` header expressed as delay-seconds or an RFC 2822 date.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

pub(crate) fn header_value(name: &'static str, value: &str) -> Result<HeaderValue> {
	HeaderValue::from_str(value).map_err(|_| ConfigError::InvalidHeader { name }.into())
}

fn map_transport_error<E>(err: HttpClientError<E>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => TransportError::network(*inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::from(inner).into(),
		HttpClientError::Other(message) => TransportError::Other { message }.into(),
		_ => TransportError::Other { message: "unknown transport failure".into() }.into(),
	}
}

fn truncate_preview(body: &str) -> String {
	if body.chars().count() <= BODY_PREVIEW_LIMIT {
		return body.to_owned();
	}

	let mut buf = String::new();

	for (idx, ch) in body.chars().enumerate() {
		if idx >= BODY_PREVIEW_LIMIT {
			buf.push('…');

			break;
		}

		buf.push(ch);
	}

	buf
}
