//! Crate-level error types shared by the coordinator, sessions, and stores.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token refresh failed and no valid access token is available.
	#[error(transparent)]
	Refresh(#[from] RefreshError),
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Identifier validation failure.
	#[error(transparent)]
	Identifier(#[from] crate::auth::IdentifierError),
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Session configuration contains an invalid token endpoint.
	#[error("Token endpoint is invalid.")]
	InvalidTokenEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Session configuration failed validation.
	#[error(transparent)]
	Session(#[from] crate::session::SessionConfigError),
	/// Token set builder validation failed.
	#[error("Unable to build token set.")]
	TokenBuild(#[from] crate::auth::TokenSetBuilderError),
	/// Authorization header cannot be represented as an HTTP header value.
	#[error("Authorization header contains characters that are not valid in an HTTP header.")]
	InvalidHeaderValue,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failure of a single refresh-token exchange, classified by HTTP status.
///
/// The value is `Clone` so one refresh outcome can be handed to every caller waiting on the same
/// refresh cycle.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RefreshError {
	/// The token endpoint could not be reached (status `0`).
	#[error("Network error occurred while refreshing the access token: {message}.")]
	Transport {
		/// Transport-supplied message.
		message: String,
	},
	/// The token endpoint failed with a server error (status `>= 500`).
	#[error("Token endpoint failed with status {status}: {message}.")]
	Server {
		/// HTTP status code.
		status: u16,
		/// Endpoint- or transport-supplied message.
		message: String,
	},
	/// The token endpoint rejected the refresh (nonzero status `< 500`).
	#[error("Token endpoint rejected the refresh with status {status}: {message}.")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// Endpoint-supplied message.
		message: String,
	},
	/// The session holds no refresh token, so no exchange was attempted.
	#[error("Session has no stored refresh token.")]
	MissingRefreshToken,
}
impl RefreshError {
	/// Classifies a failure by its HTTP status; `0` means the request never got a response.
	pub fn from_status(status: u16, message: impl Into<String>) -> Self {
		let message = message.into();

		match status {
			0 => Self::Transport { message },
			500.. => Self::Server { status, message },
			_ => Self::Rejected { status, message },
		}
	}

	/// Wraps a transport failure that produced no HTTP status.
	pub fn transport(message: impl Display) -> Self {
		Self::Transport { message: message.to_string() }
	}

	/// Returns the HTTP status associated with the failure, `Some(0)` for transport failures.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Transport { .. } => Some(0),
			Self::Server { status, .. } | Self::Rejected { status, .. } => Some(*status),
			Self::MissingRefreshToken => None,
		}
	}

	/// Returns `true` for network and server failures that should not end the session.
	pub fn is_transient(&self) -> bool {
		matches!(self, Self::Transport { .. } | Self::Server { .. })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn status_classification_matches_transient_rules() {
		let transport = RefreshError::from_status(0, "connection reset");
		let server = RefreshError::from_status(503, "unavailable");
		let rejected = RefreshError::from_status(400, "invalid_grant");
		let unauthorized = RefreshError::from_status(401, "invalid_client");

		assert!(matches!(transport, RefreshError::Transport { .. }));
		assert!(transport.is_transient());
		assert_eq!(transport.status(), Some(0));
		assert!(matches!(server, RefreshError::Server { status: 503, .. }));
		assert!(server.is_transient());
		assert!(matches!(rejected, RefreshError::Rejected { status: 400, .. }));
		assert!(!rejected.is_transient());
		assert!(!unauthorized.is_transient());
		assert!(!RefreshError::MissingRefreshToken.is_transient());
		assert_eq!(RefreshError::MissingRefreshToken.status(), None);
	}

	#[test]
	fn refresh_error_converts_into_crate_error() {
		let err: Error = RefreshError::from_status(400, "invalid_grant").into();

		assert!(matches!(err, Error::Refresh(RefreshError::Rejected { status: 400, .. })));
		assert!(err.to_string().contains("invalid_grant"));
	}
}
