//! A reference `RawBackend` for tests and local development. The real
//! relationship-store backend is out of scope for this repository; this is
//! not a stand-in for it, only something the `ChunkedStore` wrapper and the
//! rest of the crate can be exercised against without a network dependency.

use async_trait::async_trait;
use tokio::sync::RwLock;

use rebac_graph::{evaluate_check, CompiledModel, Tuple, TupleFilter};

use crate::{RawBackend, StoreError, MAX_WRITE_CHUNK};

pub struct InMemoryBackend {
    tuples: RwLock<Vec<Tuple>>,
    model: RwLock<CompiledModel>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            tuples: RwLock::new(Vec::new()),
            model: RwLock::new(CompiledModel::default()),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RawBackend for InMemoryBackend {
    async fn list_stores(&self) -> Result<Vec<String>, StoreError> {
        Ok(vec!["default".to_string()])
    }

    async fn create_store(&self, _name: &str) -> Result<(), StoreError> {
        Ok(())
    }

    async fn write_model(&self, model: &CompiledModel) -> Result<(), StoreError> {
        *self.model.write().await = model.clone();
        Ok(())
    }

    async fn check(&self, tuple: &Tuple, contextual_tuples: &[Tuple]) -> Result<bool, StoreError> {
        let model = self.model.read().await;
        let existing = self.tuples.read().await;

        let mut all: Vec<Tuple> = existing.clone();
        all.extend(contextual_tuples.iter().cloned());

        Ok(evaluate_check(&model, &all, tuple.user.node(), &tuple.relation, &tuple.object))
    }

    async fn read_page(
        &self,
        filter: &TupleFilter,
        continuation_token: Option<String>,
    ) -> Result<(Vec<Tuple>, Option<String>), StoreError> {
        let offset: usize = continuation_token
            .as_deref()
            .map(|t| t.parse().unwrap_or(0))
            .unwrap_or(0);
        const PAGE_SIZE: usize = 50;

        let matching: Vec<Tuple> = self
            .tuples
            .read()
            .await
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();

        let page: Vec<Tuple> = matching.iter().skip(offset).take(PAGE_SIZE).cloned().collect();
        let next = if offset + page.len() < matching.len() {
            Some((offset + PAGE_SIZE).to_string())
        } else {
            None
        };
        Ok((page, next))
    }

    async fn write_chunk(&self, adds: Vec<Tuple>, deletes: Vec<Tuple>) -> Result<(), StoreError> {
        if adds.len() + deletes.len() > MAX_WRITE_CHUNK {
            return Err(StoreError::Transport(format!(
                "chunk of {} exceeds max write size of {MAX_WRITE_CHUNK}",
                adds.len() + deletes.len()
            )));
        }
        let mut guard = self.tuples.write().await;
        guard.retain(|t| !deletes.contains(t));
        guard.extend(adds);
        Ok(())
    }

    async fn get_model(&self) -> Result<CompiledModel, StoreError> {
        Ok(self.model.read().await.clone())
    }
}
