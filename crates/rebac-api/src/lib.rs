pub mod config;
pub mod handlers;
pub mod routes;

use rebac_authorizer::Authorizer;
use rebac_store::{memory::InMemoryBackend, ChunkedStore};

/// The one concrete store backend this repository ships: an in-memory
/// reference implementation. The real relationship-store backend is an
/// external collaborator (§1); swapping it in means providing another
/// `RawBackend` and changing this alias.
pub type Store = ChunkedStore<InMemoryBackend>;

pub struct AppState {
    pub authorizer: Authorizer<Store>,
}
