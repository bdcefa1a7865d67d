//! Refresh-token exchange facade over the `oauth2` crate.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, ClientId as OAuthClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RefreshToken, RequestTokenError, Scope, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::{TokenSecret, TokenSet},
	error::RefreshError,
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	session::{ClientAuthMethod, SessionConfig},
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
const MAX_TOKEN_LIFETIME: Duration = Duration::days(3_650);

type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RefreshError>> + 'a + Send>>;

/// Maps HTTP transport failures into classified [`RefreshError`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a refresh error.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> RefreshError;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> RefreshError {
		match err {
			HttpClientError::Reqwest(inner) => match inner.status() {
				Some(status) => RefreshError::from_status(status.as_u16(), inner.to_string()),
				None => RefreshError::transport(inner),
			},
			HttpClientError::Http(inner) => RefreshError::transport(inner),
			HttpClientError::Io(inner) => RefreshError::transport(inner),
			HttpClientError::Other(message) =>
				RefreshError::from_status(meta_status(meta).unwrap_or(0), message),
			_ => RefreshError::from_status(
				meta_status(meta).unwrap_or(0),
				"HTTP client error occurred while calling the token endpoint",
			),
		}
	}
}

/// Performs `grant_type=refresh_token` exchanges for one session configuration.
pub(crate) struct RefreshFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
	scopes: Vec<String>,
	default_lifetime: Duration,
}
impl<C, M> RefreshFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_config(
		config: &SessionConfig,
		http_client: Arc<C>,
		error_mapper: Arc<M>,
	) -> Self {
		let token_url = TokenUrl::from_url(config.token_endpoint.clone());
		let mut oauth_client = BasicClient::new(OAuthClientId::new(config.client_id.to_string()))
			.set_token_uri(token_url);

		if !matches!(config.client_auth_method, ClientAuthMethod::Public) {
			if let Some(secret) = &config.client_secret {
				oauth_client =
					oauth_client.set_client_secret(ClientSecret::new(secret.expose().to_owned()));
			}
		}
		if !matches!(config.client_auth_method, ClientAuthMethod::ClientSecretBasic) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Self {
			oauth_client,
			http_client,
			error_mapper,
			scopes: config.scopes.clone(),
			default_lifetime: config.default_token_lifetime,
		}
	}

	/// Exchanges `refresh_token` for a new token set.
	///
	/// A response without a refresh token keeps the current one, and one without `expires_in`
	/// falls back to the configured default lifetime. Lifetimes are capped at ten years.
	pub(crate) fn refresh<'a>(
		&'a self,
		refresh_token: &'a TokenSecret,
		previous_id_token: Option<&'a TokenSecret>,
	) -> FacadeFuture<'a, TokenSet> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let refresh_secret = RefreshToken::new(refresh_token.expose().to_owned());
			let mut request = self.oauth_client.exchange_refresh_token(&refresh_secret);

			for scope in &self.scopes {
				request = request.add_scope(Scope::new(scope.to_owned()));
			}

			let response = request
				.request_async(&instrumented)
				.await
				.map_err(|err| map_request_error(meta.take(), err, self.error_mapper.as_ref()))?;
			let expires_in = response
				.expires_in()
				.and_then(|lifetime| i64::try_from(lifetime.as_secs()).ok())
				.map(Duration::seconds)
				.unwrap_or(self.default_lifetime)
				.clamp(Duration::ZERO, MAX_TOKEN_LIFETIME);
			let issued_at = OffsetDateTime::now_utc();
			let refresh_token = match response.refresh_token() {
				Some(rotated) => TokenSecret::new(rotated.secret().to_owned()),
				None => refresh_token.clone(),
			};

			Ok(TokenSet {
				access_token: TokenSecret::new(response.access_token().secret().to_owned()),
				refresh_token: Some(refresh_token),
				id_token: previous_id_token.cloned(),
				token_type: response.token_type().as_ref().to_owned(),
				issued_at,
				expires_at: issued_at + expires_in,
			})
		})
	}
}

fn map_request_error<E, M>(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> RefreshError
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(response, meta_ref),
		RequestTokenError::Request(error) => mapper.map_transport_error(meta_ref, error),
		RequestTokenError::Parse(error, _body) => RefreshError::from_status(
			meta_status(meta_ref).unwrap_or(0),
			format!("token endpoint returned malformed JSON: {error}"),
		),
		RequestTokenError::Other(message) =>
			RefreshError::from_status(meta_status(meta_ref).unwrap_or(0), message),
	}
}

// RFC 6749 section 5.2 error bodies come with status 400 unless the transport saw otherwise.
fn map_server_response_error(
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> RefreshError {
	let message = match response.error_description() {
		Some(description) => format!("{}: {description}", response.error().as_ref()),
		None => response.error().as_ref().to_string(),
	};

	RefreshError::from_status(meta_status(meta).unwrap_or(400), message)
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}
