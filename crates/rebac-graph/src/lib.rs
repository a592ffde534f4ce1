pub mod error;
pub mod eval;
pub mod generate;
pub mod model;
pub mod node;
pub mod reconcile;
pub mod schema;
pub mod store;
pub mod tuple;

pub use error::{GraphError, Result};
pub use eval::check as evaluate_check;
pub use generate::generate_tuples_for;
pub use model::{build_model, CompiledModel, TypeDefinition, UsersetExpr};
pub use node::{Node, RelatedNode, RelatedNodes, Subject};
pub use reconcile::{reconcile_compute, ReconcileDiff};
pub use schema::{
    AuthorizationSchema, EvaluatedUserset, IncomingRelation, OutgoingRelation, SourceObject,
    TypeRelation,
};
pub use store::TupleStore;
pub use tuple::{Tuple, TupleFilter, WILDCARD};
