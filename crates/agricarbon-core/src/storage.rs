use async_trait::async_trait;

use crate::models::{Principal, Transaction};

/// Owner-scoped transaction persistence.
///
/// `insert` is atomic per row. A completed insert must be visible to the
/// next `list_for_owner` call for the same owner.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn insert(&self, transaction: Transaction) -> anyhow::Result<Transaction>;
    /// Newest first. Never returns rows owned by anyone else.
    async fn list_for_owner(&self, owner: &str) -> anyhow::Result<Vec<Transaction>>;
}

/// Resolves a bearer credential to the principal it was issued to.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> anyhow::Result<Option<Principal>>;
}
