use std::collections::HashSet;

use crate::error::Result;
use crate::node::Node;
use crate::schema::AuthorizationSchema;
use crate::store::TupleStore;
use crate::tuple::{Tuple, TupleFilter, WILDCARD};

/// An ownership key: the `(type, userSetRelation)` pair that identifies
/// which edges a schema entry claims. Two objects never declare the same
/// key on the same side, so filtering store reads by these keys is safe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TypeUserset {
    type_name: String,
    user_set_relation: Option<String>,
}

/// The result of a reconcile computation: the tuples to add and the tuples
/// to delete so the store converges on `desired` for this subject, without
/// touching edges owned by any other object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileDiff {
    pub to_add: Vec<Tuple>,
    pub to_delete: Vec<Tuple>,
}

/// Computes the reconcile diff for subject `node` given the tuples its
/// generator produced (`desired`). Reads the store for the current state
/// of only the edges `node`'s schema entry declares ownership of.
pub async fn reconcile_compute(
    store: &dyn TupleStore,
    schema: &AuthorizationSchema,
    node: &Node,
    desired: Vec<Tuple>,
) -> Result<ReconcileDiff> {
    let type_relation = schema.find(&node.node_type)?;

    let owned_incoming: HashSet<TypeUserset> = type_relation
        .incoming
        .iter()
        .map(|r| TypeUserset {
            type_name: r.user_type.clone(),
            user_set_relation: r.user_set_relation.clone(),
        })
        .collect();

    let owned_outgoing: HashSet<TypeUserset> = type_relation
        .outgoing
        .iter()
        .map(|r| TypeUserset {
            type_name: r.object_type.clone(),
            user_set_relation: r.user_set_relation.clone(),
        })
        .collect();

    let incoming_view = store
        .read_tuples(&TupleFilter::new().with_object_type(node.node_type.clone()).with_object_name(node.name.clone()))
        .await?;
    let outgoing_direct_view = store
        .read_tuples(
            &TupleFilter::new()
                .with_user_type(node.node_type.clone())
                .with_user_name(node.name.clone()),
        )
        .await?;
    let outgoing_userset_view = store
        .read_tuples(
            &TupleFilter::new()
                .with_user_type(node.node_type.clone())
                .with_user_name(node.name.clone())
                .with_user_set_relation(WILDCARD),
        )
        .await?;

    let mut current: Vec<Tuple> = Vec::new();
    for t in incoming_view {
        let key = TypeUserset {
            type_name: t.user.node().node_type.clone(),
            user_set_relation: t.user.userset_relation().map(str::to_string),
        };
        if owned_incoming.contains(&key) {
            current.push(t);
        }
    }
    for t in outgoing_direct_view.into_iter().chain(outgoing_userset_view) {
        let key = TypeUserset {
            type_name: t.object.node_type.clone(),
            user_set_relation: t.user.userset_relation().map(str::to_string),
        };
        if owned_outgoing.contains(&key) {
            current.push(t);
        }
    }

    let current_set: HashSet<&Tuple> = current.iter().collect();
    let desired_set: HashSet<&Tuple> = desired.iter().collect();

    let to_add: Vec<Tuple> = desired
        .iter()
        .filter(|t| !current_set.contains(t))
        .cloned()
        .collect();
    let to_delete: Vec<Tuple> = current
        .iter()
        .filter(|t| !desired_set.contains(t))
        .cloned()
        .collect();

    Ok(ReconcileDiff { to_add, to_delete })
}
