//! Request authorization contracts that let callers attach a valid `Authorization` header to
//! arbitrary HTTP clients.

// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")]
use crate::{coordinator::AuthorizationCoordinator, error::ConfigError, session::OAuthSession};

/// Boxed future returned by [`RequestAuthorizer::authorize`].
pub type AuthorizeFuture<'a, Request> = Pin<Box<dyn Future<Output = Result<Request>> + 'a + Send>>;

/// Attaches a valid `Authorization` header to an outbound request, refreshing first when needed.
///
/// The trait is generic over the request type so implementers can integrate with any client
/// builder.
pub trait RequestAuthorizer<Request>
where
	Self: Send + Sync,
{
	/// Consumes the request and returns it carrying a valid `Authorization` header.
	fn authorize<'a>(&'a self, request: Request) -> AuthorizeFuture<'a, Request>
	where
		Request: 'a;
}

#[cfg(feature = "reqwest")]
impl<S> RequestAuthorizer<reqwest::RequestBuilder> for AuthorizationCoordinator<S>
where
	S: ?Sized + OAuthSession + 'static,
{
	fn authorize<'a>(
		&'a self,
		request: reqwest::RequestBuilder,
	) -> AuthorizeFuture<'a, reqwest::RequestBuilder>
	where
		reqwest::RequestBuilder: 'a,
	{
		Box::pin(async move {
			let header = self.get_valid_authorization_header().await?;
			let mut value = reqwest::header::HeaderValue::from_str(header.expose())
				.map_err(|_| ConfigError::InvalidHeaderValue)?;

			value.set_sensitive(true);

			Ok(request.header(reqwest::header::AUTHORIZATION, value))
		})
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::{AuthorizationHeader, TokenSecret},
		error::Error,
		session::RefreshFuture,
	};

	struct StaticSession(&'static str);
	impl OAuthSession for StaticSession {
		fn access_token_expiration(&self) -> Option<OffsetDateTime> {
			Some(OffsetDateTime::now_utc() + Duration::hours(2))
		}

		fn authorization_header(&self) -> AuthorizationHeader {
			AuthorizationHeader::new(self.0)
		}

		fn refresh_token(&self) -> RefreshFuture<'_> {
			Box::pin(async { Ok(()) })
		}

		fn has_valid_access_token(&self) -> bool {
			true
		}

		fn stored_refresh_token(&self) -> Option<TokenSecret> {
			None
		}
	}

	#[tokio::test]
	async fn reqwest_builder_receives_sensitive_header() {
		let coordinator = AuthorizationCoordinator::new(Arc::new(StaticSession("Bearer leerling")));
		let request = coordinator
			.authorize(ReqwestClient::new().get("https://api.somtoday.nl/rest/v1/leerlingen"))
			.await
			.expect("A fresh token should authorize the request.")
			.build()
			.expect("Request should build.");
		let value = request
			.headers()
			.get(reqwest::header::AUTHORIZATION)
			.expect("Authorization header should be attached.");

		assert_eq!(value, "Bearer leerling");
		assert!(value.is_sensitive());
	}

	#[tokio::test]
	async fn invalid_header_characters_are_rejected() {
		let coordinator = AuthorizationCoordinator::new(Arc::new(StaticSession("Bearer bad\nvalue")));
		let err = coordinator
			.authorize(ReqwestClient::new().get("https://api.somtoday.nl/rest/v1/leerlingen"))
			.await
			.expect_err("Header values with newlines should be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidHeaderValue)));
	}
}
