//! Session configuration: which client refreshes against which token endpoint, and how.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, TokenSecret},
	error::ConfigError,
};

/// Token endpoint used by the Somtoday identity provider.
pub const SOMTODAY_TOKEN_ENDPOINT: &str = "https://inloggen.somtoday.nl/oauth2/token";

/// Client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
	#[default]
	/// Public clients send only `client_id` in the form body.
	Public,
}

/// Errors raised while validating a [`SessionConfig`].
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum SessionConfigError {
	/// Token endpoint is mandatory.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Token endpoint must use HTTPS.
	#[error("The token endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Confidential auth methods need a client secret.
	#[error("Client auth method {method:?} requires a client secret.")]
	MissingClientSecret {
		/// Auth method that needs the secret.
		method: ClientAuthMethod,
	},
	/// Clock skew cannot be negative.
	#[error("Clock skew must not be negative.")]
	NegativeClockSkew,
	/// The fallback access-token lifetime must be positive.
	#[error("Default token lifetime must be positive.")]
	NonPositiveLifetime,
}

/// Immutable session configuration consumed by [`TokenSession`](crate::session::TokenSession).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
	/// OAuth client identifier.
	pub client_id: ClientId,
	/// Client secret for confidential auth methods.
	#[serde(default)]
	pub client_secret: Option<TokenSecret>,
	/// Token endpoint used for refresh exchanges.
	pub token_endpoint: Url,
	/// How the client authenticates at the token endpoint.
	#[serde(default)]
	pub client_auth_method: ClientAuthMethod,
	/// Scopes sent with every refresh exchange.
	#[serde(default)]
	pub scopes: Vec<String>,
	/// Estimated skew between the local clock and the issuer.
	#[serde(default = "SessionConfig::default_clock_skew")]
	pub clock_skew: Duration,
	/// Lifetime assumed when a token response omits `expires_in`.
	#[serde(default = "SessionConfig::default_token_lifetime")]
	pub default_token_lifetime: Duration,
}
impl SessionConfig {
	/// Creates a new builder for the provided client identifier.
	pub fn builder(client_id: ClientId) -> SessionConfigBuilder {
		SessionConfigBuilder::new(client_id)
	}

	/// Configuration for a public client refreshing against the Somtoday identity provider.
	pub fn somtoday(client_id: ClientId) -> Result<Self> {
		let endpoint = Url::parse(SOMTODAY_TOKEN_ENDPOINT)
			.map_err(|source| ConfigError::InvalidTokenEndpoint { source })?;
		let config = Self::builder(client_id)
			.token_endpoint(endpoint)
			.scope("openid")
			.build()
			.map_err(ConfigError::from)?;

		Ok(config)
	}

	/// Validates invariants, e.g. after deserializing.
	pub fn validate(&self) -> Result<(), SessionConfigError> {
		if self.token_endpoint.scheme() != "https" {
			return Err(SessionConfigError::InsecureEndpoint {
				url: self.token_endpoint.to_string(),
			});
		}
		if self.client_secret.is_none()
			&& !matches!(self.client_auth_method, ClientAuthMethod::Public)
		{
			return Err(SessionConfigError::MissingClientSecret {
				method: self.client_auth_method,
			});
		}
		if self.clock_skew.is_negative() {
			return Err(SessionConfigError::NegativeClockSkew);
		}
		if !self.default_token_lifetime.is_positive() {
			return Err(SessionConfigError::NonPositiveLifetime);
		}

		Ok(())
	}

	fn default_clock_skew() -> Duration {
		Duration::ZERO
	}

	fn default_token_lifetime() -> Duration {
		Duration::hours(1)
	}
}

/// Builder for [`SessionConfig`] values.
#[derive(Debug)]
pub struct SessionConfigBuilder {
	client_id: ClientId,
	client_secret: Option<TokenSecret>,
	token_endpoint: Option<Url>,
	client_auth_method: ClientAuthMethod,
	scopes: Vec<String>,
	clock_skew: Duration,
	default_token_lifetime: Duration,
}
impl SessionConfigBuilder {
	/// Creates a new builder seeded with the provided client identifier.
	pub fn new(client_id: ClientId) -> Self {
		Self {
			client_id,
			client_secret: None,
			token_endpoint: None,
			client_auth_method: ClientAuthMethod::default(),
			scopes: Vec::new(),
			clock_skew: SessionConfig::default_clock_skew(),
			default_token_lifetime: SessionConfig::default_token_lifetime(),
		}
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the client secret used by confidential auth methods.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Overrides the client authentication method.
	pub fn client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = method;

		self
	}

	/// Adds a scope sent with refresh exchanges.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scopes.push(scope.into());

		self
	}

	/// Sets the estimated clock skew.
	pub fn clock_skew(mut self, skew: Duration) -> Self {
		self.clock_skew = skew;

		self
	}

	/// Sets the lifetime assumed when `expires_in` is missing.
	pub fn default_token_lifetime(mut self, lifetime: Duration) -> Self {
		self.default_token_lifetime = lifetime;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<SessionConfig, SessionConfigError> {
		let token_endpoint = self.token_endpoint.ok_or(SessionConfigError::MissingTokenEndpoint)?;
		let config = SessionConfig {
			client_id: self.client_id,
			client_secret: self.client_secret,
			token_endpoint,
			client_auth_method: self.client_auth_method,
			scopes: self.scopes,
			clock_skew: self.clock_skew,
			default_token_lifetime: self.default_token_lifetime,
		};

		config.validate()?;

		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn client_id() -> ClientId {
		ClientId::new("leerling-app").expect("Client identifier fixture should be valid.")
	}

	fn url(value: &str) -> Url {
		Url::parse(value).expect("URL fixture should parse.")
	}

	#[test]
	fn builder_rejects_insecure_and_missing_endpoints() {
		assert_eq!(
			SessionConfig::builder(client_id()).build().err(),
			Some(SessionConfigError::MissingTokenEndpoint)
		);
		assert!(matches!(
			SessionConfig::builder(client_id())
				.token_endpoint(url("http://example.com/token"))
				.build(),
			Err(SessionConfigError::InsecureEndpoint { .. })
		));
	}

	#[test]
	fn confidential_methods_require_secret() {
		let err = SessionConfig::builder(client_id())
			.token_endpoint(url("https://example.com/token"))
			.client_auth_method(ClientAuthMethod::ClientSecretPost)
			.build()
			.expect_err("Confidential auth without a secret should be rejected.");

		assert_eq!(
			err,
			SessionConfigError::MissingClientSecret { method: ClientAuthMethod::ClientSecretPost }
		);
	}

	#[test]
	fn durations_are_validated() {
		let builder = || SessionConfig::builder(client_id()).token_endpoint(url("https://x.nl/t"));

		assert_eq!(
			builder().clock_skew(Duration::seconds(-1)).build().err(),
			Some(SessionConfigError::NegativeClockSkew)
		);
		assert_eq!(
			builder().default_token_lifetime(Duration::ZERO).build().err(),
			Some(SessionConfigError::NonPositiveLifetime)
		);
	}

	#[test]
	fn somtoday_preset_is_public_with_openid_scope() {
		let config = SessionConfig::somtoday(client_id()).expect("Preset should be valid.");

		assert_eq!(config.token_endpoint.as_str(), SOMTODAY_TOKEN_ENDPOINT);
		assert_eq!(config.client_auth_method, ClientAuthMethod::Public);
		assert_eq!(config.scopes, vec!["openid".to_owned()]);
		assert_eq!(config.default_token_lifetime, Duration::hours(1));
	}

	#[test]
	fn deserialization_fills_defaults() {
		let config: SessionConfig = serde_json::from_str(
			r#"{"client_id":"leerling-app","token_endpoint":"https://example.com/token"}"#,
		)
		.expect("Minimal config should deserialize.");

		config.validate().expect("Deserialized config should validate.");

		assert_eq!(config.clock_skew, Duration::ZERO);
		assert_eq!(config.client_auth_method, ClientAuthMethod::Public);
		assert!(config.scopes.is_empty());
	}
}
