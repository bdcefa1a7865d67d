//! Refresh-token session backed by an HTTPS token endpoint and a [`TokenStore`].

// self
use crate::{
	_prelude::*,
	auth::{AccountId, AuthorizationHeader, TokenSecret, TokenSet},
	error::RefreshError,
	http::TokenHttpClient,
	oauth::{RefreshFacade, TransportErrorMapper},
	session::{OAuthSession, RefreshFuture, SessionConfig},
	store::TokenStore,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

/// Token session specialized for the crate's default reqwest transport stack.
#[cfg(feature = "reqwest")]
pub type ReqwestTokenSession = TokenSession<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Holds the tokens of one signed-in account and refreshes them on request.
///
/// The current [`TokenSet`] lives in memory so the synchronous [`OAuthSession`] queries never
/// block; every change is written through to the configured [`TokenStore`]. Refresh exchanges are
/// serialized so a rotating refresh token is never presented twice.
pub struct TokenSession<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	config: SessionConfig,
	account: AccountId,
	store: Arc<dyn TokenStore>,
	facade: RefreshFacade<C, M>,
	tokens: RwLock<Option<TokenSet>>,
	refresh_guard: AsyncMutex<()>,
}
impl<C, M> TokenSession<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a signed-out session that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: SessionConfig,
		account: AccountId,
		store: Arc<dyn TokenStore>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let facade = RefreshFacade::from_config(&config, http_client.into(), mapper.into());

		Self {
			config,
			account,
			store,
			facade,
			tokens: RwLock::new(None),
			refresh_guard: AsyncMutex::new(()),
		}
	}

	/// Account this session belongs to.
	pub fn account(&self) -> &AccountId {
		&self.account
	}

	/// Configuration this session refreshes with.
	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	/// Snapshot of the tokens currently held.
	pub fn tokens(&self) -> Option<TokenSet> {
		self.tokens.read().clone()
	}

	/// Loads the persisted token set for this account, returning whether one was found.
	///
	/// Waits for an in-flight refresh to finish first.
	pub async fn restore(&self) -> Result<bool> {
		let _exchange = self.refresh_guard.lock().await;
		let restored = self.store.fetch(&self.account).await?;
		let found = restored.is_some();

		*self.tokens.write() = restored;

		Ok(found)
	}

	/// Installs and persists a token set obtained by signing in.
	///
	/// Waits for an in-flight refresh to finish first, so its result cannot overwrite these tokens.
	pub async fn sign_in(&self, tokens: TokenSet) -> Result<()> {
		let _exchange = self.refresh_guard.lock().await;

		self.store.save(&self.account, tokens.clone()).await?;

		*self.tokens.write() = Some(tokens);

		Ok(())
	}

	/// Drops the tokens from memory and from the store.
	///
	/// Waits for an in-flight refresh to finish first, so its result cannot restore the session.
	pub async fn sign_out(&self) -> Result<()> {
		let _exchange = self.refresh_guard.lock().await;

		*self.tokens.write() = None;

		self.store.clear(&self.account).await?;

		Ok(())
	}

	async fn refresh_now(&self) -> Result<(), RefreshError> {
		let _exchange = self.refresh_guard.lock().await;
		let (refresh_token, id_token) = {
			let guard = self.tokens.read();
			let current = guard.as_ref();

			(
				current.and_then(|set| set.refresh_token.clone()),
				current.and_then(|set| set.id_token.clone()),
			)
		};
		let refresh_token = refresh_token.ok_or(RefreshError::MissingRefreshToken)?;
		let refreshed = self.facade.refresh(&refresh_token, id_token.as_ref()).await?;
		// The endpoint has already rotated the tokens, so a store failure is logged, not returned.
		let persisted = self.store.save(&self.account, refreshed.clone()).await;

		*self.tokens.write() = Some(refreshed);

		if let Err(_e) = persisted {
			#[cfg(feature = "tracing")]
			tracing::warn!(
				account = %self.account,
				error = %_e,
				"failed to persist refreshed tokens"
			);
		}

		Ok(())
	}
}
#[cfg(feature = "reqwest")]
impl TokenSession<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a signed-out session with its own reqwest-backed transport.
	pub fn new(config: SessionConfig, account: AccountId, store: Arc<dyn TokenStore>) -> Self {
		Self::with_http_client(
			config,
			account,
			store,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> OAuthSession for TokenSession<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn access_token_expiration(&self) -> Option<OffsetDateTime> {
		self.tokens.read().as_ref().map(|set| set.expires_at)
	}

	fn clock_skew(&self) -> Duration {
		self.config.clock_skew
	}

	fn authorization_header(&self) -> AuthorizationHeader {
		match self.tokens.read().as_ref() {
			Some(set) => set.authorization_header(),
			None => AuthorizationHeader::new("Bearer "),
		}
	}

	fn refresh_token(&self) -> RefreshFuture<'_> {
		Box::pin(self.refresh_now())
	}

	fn has_valid_access_token(&self) -> bool {
		self.tokens.read().as_ref().is_some_and(TokenSet::is_valid)
	}

	fn stored_refresh_token(&self) -> Option<TokenSecret> {
		self.tokens.read().as_ref().and_then(|set| set.refresh_token.clone())
	}
}
impl<C, M> Debug for TokenSession<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenSession")
			.field("account", &self.account)
			.field("token_endpoint", &self.config.token_endpoint.as_str())
			.field("tokens", &self.tokens.read())
			.finish()
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::{auth::ClientId, store::MemoryStore};

	fn build_session(store: Arc<MemoryStore>) -> ReqwestTokenSession {
		let client_id = ClientId::new("leerling-app").expect("Client fixture should be valid.");
		let config = SessionConfig::builder(client_id)
			.token_endpoint(
				Url::parse("https://example.com/oauth2/token").expect("URL fixture should parse."),
			)
			.clock_skew(Duration::seconds(30))
			.build()
			.expect("Session config fixture should build.");
		let account = AccountId::new("leerling-1").expect("Account fixture should be valid.");

		ReqwestTokenSession::new(config, account, store)
	}

	#[tokio::test]
	async fn sign_in_restore_and_sign_out_round_trip() {
		let store = Arc::new(MemoryStore::default());
		let session = build_session(store.clone());
		let tokens = TokenSet::builder()
			.access_token("access")
			.refresh_token("refresh")
			.expires_in(Duration::hours(1))
			.build()
			.expect("Token fixture should build.");

		assert!(!session.has_valid_access_token());
		assert!(session.stored_refresh_token().is_none());

		session.sign_in(tokens).await.expect("Sign-in should persist tokens.");

		assert_eq!(store.len(), 1);
		assert!(session.has_valid_access_token());
		assert_eq!(session.authorization_header().expose(), "Bearer access");
		assert_eq!(session.clock_skew(), Duration::seconds(30));

		let restarted = build_session(store.clone());

		assert!(restarted.restore().await.expect("Restore should succeed."));
		assert_eq!(
			restarted.stored_refresh_token().map(|secret| secret.expose().to_owned()),
			Some("refresh".into())
		);

		restarted.sign_out().await.expect("Sign-out should clear tokens.");

		assert!(store.is_empty());
		assert!(restarted.access_token_expiration().is_none());
	}

	#[tokio::test]
	async fn refresh_without_refresh_token_is_rejected_locally() {
		let session = build_session(Arc::new(MemoryStore::default()));
		let err = session
			.refresh_token()
			.await
			.expect_err("Refreshing without a refresh token should fail.");

		assert_eq!(err, RefreshError::MissingRefreshToken);
	}
}
