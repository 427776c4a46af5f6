use agricarbon_core::{Transaction, TransactionStore};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Process-local store. Rows with equal `created_at` list newest insert first.
#[derive(Default)]
pub struct InMemoryTransactionStore {
    rows: RwLock<Vec<Transaction>>,
}

impl InMemoryTransactionStore {
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(&self, transaction: Transaction) -> anyhow::Result<Transaction> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|row| row.id == transaction.id) {
            anyhow::bail!("transaction {} already exists", transaction.id);
        }

        rows.push(transaction.clone());
        Ok(transaction)
    }

    async fn list_for_owner(&self, owner: &str) -> anyhow::Result<Vec<Transaction>> {
        let rows = self.rows.read().await;
        let mut owned: Vec<Transaction> = rows
            .iter()
            .rev()
            .filter(|row| row.owner == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(owned)
    }
}
