//! Thread-safe in-memory [`TokenStore`] for tests and short-lived sessions.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, TokenSet},
	store::{StoreFuture, TokenStore},
};

type StoreMap = Arc<RwLock<HashMap<AccountId, TokenSet>>>;

/// Keeps token sets in-process; nothing survives a restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Returns the number of accounts with a stored token set.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no token sets are stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl TokenStore for MemoryStore {
	fn save<'a>(&'a self, account: &'a AccountId, tokens: TokenSet) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let account = account.to_owned();

		Box::pin(async move {
			map.write().insert(account, tokens);

			Ok(())
		})
	}

	fn fetch<'a>(&'a self, account: &'a AccountId) -> StoreFuture<'a, Option<TokenSet>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(account).cloned()) })
	}

	fn clear<'a>(&'a self, account: &'a AccountId) -> StoreFuture<'a, Option<TokenSet>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.write().remove(account)) })
	}
}
