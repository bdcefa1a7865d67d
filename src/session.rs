//! The OAuth session the coordinator refreshes through, plus the built-in token session.
//!
//! [`OAuthSession`] is the coordinator's only view of the OAuth client: it reports when the
//! current access token expires, how far the local clock is believed to drift from the server,
//! what the current `Authorization` header is, and it can run one refresh-token exchange. The
//! coordinator never touches tokens directly.

pub mod config;
pub mod token;

pub use config::*;
pub use token::*;

// self
use crate::{
	_prelude::*,
	auth::{AuthorizationHeader, TokenSecret},
	error::RefreshError,
};

/// Boxed future returned by [`OAuthSession::refresh_token`].
pub type RefreshFuture<'a> = Pin<Box<dyn Future<Output = Result<(), RefreshError>> + 'a + Send>>;

/// OAuth client collaborator driven by the authorization coordinator.
pub trait OAuthSession
where
	Self: Send + Sync,
{
	/// Expiry instant of the current access token, if one is held.
	fn access_token_expiration(&self) -> Option<OffsetDateTime>;

	/// Estimated skew between the local clock and the token issuer.
	fn clock_skew(&self) -> Duration {
		Duration::ZERO
	}

	/// Current `Authorization` header, whether or not the token is still valid.
	fn authorization_header(&self) -> AuthorizationHeader;

	/// Runs one refresh-token exchange and installs the resulting tokens on success.
	fn refresh_token(&self) -> RefreshFuture<'_>;

	/// Returns `true` when an access token is held and has not expired.
	fn has_valid_access_token(&self) -> bool;

	/// The stored refresh token, if any.
	fn stored_refresh_token(&self) -> Option<TokenSecret>;
}
