//! Single-flight bearer-token coordinator for the Somtoday Leerling API, together with the
//! refresh-token session, token stores, and request helpers it sits in front of.
//!
//! Callers ask an [`AuthorizationCoordinator`](coordinator::AuthorizationCoordinator) for a valid
//! `Authorization` header before dispatching a request. The coordinator refreshes the access token
//! through its [`OAuthSession`](session::OAuthSession) when the token is close to expiry, makes sure
//! only one refresh runs at a time, and broadcasts definite refresh failures so session teardown
//! logic can force a logout.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod coordinator;
pub mod error;
pub mod ext;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod session;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::{_prelude::*, error::Error};

	// self
	use crate::{
		auth::AccountId,
		coordinator::{AuthorizationCoordinator, CoordinatorConfig},
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		session::{ReqwestTokenSession, SessionConfig},
		store::{MemoryStore, TokenStore},
	};

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs a reqwest-backed [`ReqwestTokenSession`] over an in-memory store.
	pub fn build_reqwest_test_session(
		config: SessionConfig,
		account: &str,
	) -> (Arc<ReqwestTokenSession>, Arc<MemoryStore>) {
		let account = AccountId::new(account).expect("Test account identifier should be valid.");
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn TokenStore> = store_backend.clone();
		let session = ReqwestTokenSession::with_http_client(
			config,
			account,
			store,
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		);

		(Arc::new(session), store_backend)
	}

	/// Wraps a test session in a coordinator using the default configuration.
	pub fn build_reqwest_test_coordinator(
		session: Arc<ReqwestTokenSession>,
	) -> AuthorizationCoordinator<ReqwestTokenSession> {
		AuthorizationCoordinator::with_config(session, CoordinatorConfig::default())
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::Result;
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
