use async_trait::async_trait;

use crate::error::Result;
use crate::model::CompiledModel;
use crate::tuple::{Tuple, TupleFilter};

/// The contract the reconciler, generator, and authorizer all need from a
/// relationship store. The wire protocol to an actual backend is out of
/// scope for this crate; `rebac-store` provides the one concrete
/// implementation used in this repository.
#[async_trait]
pub trait TupleStore: Send + Sync {
    /// Evaluates `tuple` under the currently bound model, augmented by
    /// request-scoped `contextual_tuples`.
    async fn check_one(&self, tuple: &Tuple, contextual_tuples: &[Tuple]) -> Result<bool>;

    /// Reads every tuple matching `filter`. Implementations must honor every
    /// predicate `TupleFilter` can express, including pagination and,
    /// where the backend can't accept a user-only predicate, read fan-out.
    async fn read_tuples(&self, filter: &TupleFilter) -> Result<Vec<Tuple>>;

    /// Writes `adds` and deletes `deletes` against the store. Callers pass
    /// whatever a reconcile diff produced; the adapter is responsible for
    /// chunking to the backend's per-request limit.
    async fn write_tuples(&self, adds: Vec<Tuple>, deletes: Vec<Tuple>) -> Result<()>;

    /// Returns the compiled model currently bound to this store.
    async fn get_authorization_schema(&self) -> Result<CompiledModel>;
}
