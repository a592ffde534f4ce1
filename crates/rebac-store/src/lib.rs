pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use rebac_graph::{
    AuthorizationSchema, CompiledModel, GraphError, Result as GraphResult, Tuple, TupleFilter,
    TupleStore, WILDCARD,
};

/// Maximum combined adds+deletes per backend write request. The reference
/// backend accepts 10.
pub const MAX_WRITE_CHUNK: usize = 10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend transport error: {0}")]
    Transport(String),

    #[error("store not found: {0}")]
    NotFound(String),
}

impl From<StoreError> for GraphError {
    fn from(e: StoreError) -> Self {
        GraphError::Transport(e.to_string())
    }
}

/// The minimal set of operations a concrete relationship-store backend must
/// provide. `ChunkedStore` builds the full `TupleStore` contract (pagination,
/// fan-out, chunked writes) on top of this.
#[async_trait]
pub trait RawBackend: Send + Sync {
    async fn list_stores(&self) -> Result<Vec<String>, StoreError>;
    async fn create_store(&self, name: &str) -> Result<(), StoreError>;
    async fn write_model(&self, model: &CompiledModel) -> Result<(), StoreError>;
    async fn check(&self, tuple: &Tuple, contextual_tuples: &[Tuple]) -> Result<bool, StoreError>;

    /// Reads one page. `continuation_token` is `None` on the first call;
    /// a `Some("")`-equivalent (`None`) return value signals the last page.
    async fn read_page(
        &self,
        filter: &TupleFilter,
        continuation_token: Option<String>,
    ) -> Result<(Vec<Tuple>, Option<String>), StoreError>;

    /// Writes one chunk of at most `MAX_WRITE_CHUNK` combined adds+deletes.
    async fn write_chunk(&self, adds: Vec<Tuple>, deletes: Vec<Tuple>) -> Result<(), StoreError>;

    async fn get_model(&self) -> Result<CompiledModel, StoreError>;
}

/// Wraps a `RawBackend` into the full `TupleStore` contract: pagination,
/// chunked writes, and read fan-out for predicates the backend can't accept
/// directly (a user-only filter with no object type).
pub struct ChunkedStore<B: RawBackend> {
    backend: B,
    schema: AuthorizationSchema,
}

impl<B: RawBackend> ChunkedStore<B> {
    pub fn new(backend: B, schema: AuthorizationSchema) -> Self {
        Self { backend, schema }
    }

    async fn read_paginated(&self, filter: &TupleFilter) -> GraphResult<Vec<Tuple>> {
        let mut out = Vec::new();
        let mut token = None;
        loop {
            let (page, next) = self
                .backend
                .read_page(filter, token)
                .await
                .map_err(GraphError::from)?;
            out.extend(page);
            match next {
                Some(t) if !t.is_empty() => token = Some(t),
                _ => break,
            }
        }
        Ok(out)
    }

    fn fan_out_object_types(&self, filter: &TupleFilter) -> Option<Vec<String>> {
        if filter.object_type.is_some() {
            return None;
        }
        let user_type = filter.user_type.as_deref()?;
        let want_relation = if filter.is_wildcard_user() {
            Some(WILDCARD)
        } else {
            filter.user_set_relation.as_deref()
        };
        Some(self.schema.reachable_object_types(user_type, want_relation))
    }
}

#[async_trait]
impl<B: RawBackend> TupleStore for ChunkedStore<B> {
    async fn check_one(&self, tuple: &Tuple, contextual_tuples: &[Tuple]) -> GraphResult<bool> {
        self.backend
            .check(tuple, contextual_tuples)
            .await
            .map_err(GraphError::from)
    }

    async fn read_tuples(&self, filter: &TupleFilter) -> GraphResult<Vec<Tuple>> {
        filter.validate()?;

        match self.fan_out_object_types(filter) {
            Some(object_types) => {
                let mut out = Vec::new();
                for object_type in object_types {
                    let scoped = TupleFilter {
                        object_type: Some(object_type),
                        ..filter.clone()
                    };
                    out.extend(self.read_paginated(&scoped).await?);
                }
                Ok(out)
            }
            None => self.read_paginated(filter).await,
        }
    }

    async fn write_tuples(&self, adds: Vec<Tuple>, deletes: Vec<Tuple>) -> GraphResult<()> {
        let mut add_iter = adds.into_iter().peekable();
        let mut delete_iter = deletes.into_iter().peekable();

        while add_iter.peek().is_some() || delete_iter.peek().is_some() {
            let mut chunk_adds = Vec::new();
            let mut chunk_deletes = Vec::new();
            let mut budget = MAX_WRITE_CHUNK;

            while budget > 0 {
                if add_iter.peek().is_some() {
                    chunk_adds.push(add_iter.next().unwrap());
                    budget -= 1;
                } else if delete_iter.peek().is_some() {
                    chunk_deletes.push(delete_iter.next().unwrap());
                    budget -= 1;
                } else {
                    break;
                }
            }

            self.backend
                .write_chunk(chunk_adds, chunk_deletes)
                .await
                .map_err(GraphError::from)?;
        }
        Ok(())
    }

    async fn get_authorization_schema(&self) -> GraphResult<CompiledModel> {
        self.backend.get_model().await.map_err(GraphError::from)
    }
}
