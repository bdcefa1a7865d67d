//! Storage contracts and built-in backends for persisted session tokens.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{AccountId, TokenSet},
};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for the token set of each signed-in account.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the token set for an account.
	fn save<'a>(&'a self, account: &'a AccountId, tokens: TokenSet) -> StoreFuture<'a, ()>;

	/// Fetches the token set for an account, if present.
	fn fetch<'a>(&'a self, account: &'a AccountId) -> StoreFuture<'a, Option<TokenSet>>;

	/// Removes the token set for an account, returning what was stored.
	fn clear<'a>(&'a self, account: &'a AccountId) -> StoreFuture<'a, Option<TokenSet>>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;
	use crate::error::Error;

	#[test]
	fn store_error_converts_into_crate_error_with_source() {
		let store_error = StoreError::Backend { message: "disk full".into() };
		let err: Error = store_error.clone().into();

		assert!(matches!(err, Error::Storage(_)));
		assert!(err.to_string().contains("disk full"));

		let source =
			StdError::source(&err).expect("Crate error should expose the store error as source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}
}
