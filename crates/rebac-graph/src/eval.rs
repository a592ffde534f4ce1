//! Userset-aware check evaluation against a `CompiledModel`. This is the
//! logic a real relationship-store backend runs internally; the in-memory
//! reference backend in `rebac-store` calls straight into it rather than
//! falling back to literal tuple equality.

use crate::model::{CompiledModel, UsersetExpr};
use crate::node::{Node, Subject};
use crate::tuple::Tuple;

/// Recursion past this depth is treated as "no match" rather than a stack
/// overflow; a well-formed schema never nests this deep, a cyclic one
/// (e.g. two aggregating cluster roles selecting each other) would loop
/// forever otherwise.
const MAX_DEPTH: usize = 32;

/// Does `user` hold `relation` on `object`, considering direct tuples,
/// usersets, and every evaluated-userset expression the model declares?
pub fn check(model: &CompiledModel, tuples: &[Tuple], user: &Node, relation: &str, object: &Node) -> bool {
    resolve(model, tuples, user, relation, object, 0)
}

fn resolve(model: &CompiledModel, tuples: &[Tuple], user: &Node, relation: &str, object: &Node, depth: usize) -> bool {
    if depth > MAX_DEPTH {
        return false;
    }

    let userset = model
        .type_definitions
        .iter()
        .find(|d| d.type_name == object.node_type)
        .and_then(|d| d.relations.get(relation))
        .and_then(|r| r.userset.as_ref());

    match userset {
        None => eval_this(model, tuples, user, relation, object, depth),
        Some(expr) => eval_expr(model, tuples, expr, user, relation, object, depth),
    }
}

/// The literal-tuple view of a relation: every stored tuple `(_, relation,
/// object)` either names `user` directly or names a userset that `user` is
/// transitively a member of.
fn eval_this(model: &CompiledModel, tuples: &[Tuple], user: &Node, relation: &str, object: &Node, depth: usize) -> bool {
    tuples
        .iter()
        .filter(|t| t.relation == relation && t.object == *object)
        .any(|t| match &t.user {
            Subject::User(n) => n == user,
            Subject::UserSet(n, r) => resolve(model, tuples, user, r, n, depth + 1),
        })
}

fn eval_expr(
    model: &CompiledModel,
    tuples: &[Tuple],
    expr: &UsersetExpr,
    user: &Node,
    relation: &str,
    object: &Node,
    depth: usize,
) -> bool {
    match expr {
        UsersetExpr::This => eval_this(model, tuples, user, relation, object, depth),
        UsersetExpr::Union(parts) => parts
            .iter()
            .any(|p| eval_expr(model, tuples, p, user, relation, object, depth + 1)),
        UsersetExpr::Intersection(parts) => parts
            .iter()
            .all(|p| eval_expr(model, tuples, p, user, relation, object, depth + 1)),
        UsersetExpr::Difference { base, subtract } => {
            eval_expr(model, tuples, base, user, relation, object, depth + 1)
                && !eval_expr(model, tuples, subtract, user, relation, object, depth + 1)
        }
        UsersetExpr::ComputedUserset { relation: rewritten } => {
            resolve(model, tuples, user, rewritten, object, depth + 1)
        }
        UsersetExpr::TupleToUserset {
            tupleset_relation,
            computed_relation,
        } => tuples
            .iter()
            .filter(|t| t.relation == *tupleset_relation && t.object == *object)
            .any(|t| resolve(model, tuples, user, computed_relation, t.user.node(), depth + 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DirectSource, RelationMetadata, TypeDefinition};
    use std::collections::BTreeMap;

    fn model_with(type_name: &str, relation: &str, expr: Option<UsersetExpr>) -> CompiledModel {
        let mut relations = BTreeMap::new();
        relations.insert(
            relation.to_string(),
            RelationMetadata {
                directly_related: vec![DirectSource {
                    user_type: "user".to_string(),
                    user_set_relation: None,
                }],
                userset: expr,
            },
        );
        CompiledModel {
            type_definitions: vec![TypeDefinition {
                type_name: type_name.to_string(),
                relations,
            }],
        }
    }

    #[test]
    fn direct_tuple_without_evaluated_userset_matches() {
        let model = model_with("document", "viewer", None);
        let tuples = vec![Tuple::new(
            Node::new("user", "alice"),
            "viewer",
            Node::new("document", "doc1"),
        )];
        assert!(check(&model, &tuples, &Node::new("user", "alice"), "viewer", &Node::new("document", "doc1")));
        assert!(!check(&model, &tuples, &Node::new("user", "bob"), "viewer", &Node::new("document", "doc1")));
    }

    #[test]
    fn userset_member_is_transitively_checked() {
        let mut model = model_with("document", "viewer", Some(UsersetExpr::This));
        model.type_definitions.push(model_with("group", "member", None).type_definitions.remove(0));
        let tuples = vec![
            Tuple::new(Node::new("group", "g1").with_userset("member"), "viewer", Node::new("document", "doc1")),
            Tuple::new(Node::new("user", "alice"), "member", Node::new("group", "g1")),
        ];
        assert!(check(&model, &tuples, &Node::new("user", "alice"), "viewer", &Node::new("document", "doc1")));
        assert!(!check(&model, &tuples, &Node::new("user", "bob"), "viewer", &Node::new("document", "doc1")));
    }

    #[test]
    fn tuple_to_userset_follows_relation_on_intermediate_object() {
        let mut model = model_with(
            "document",
            "viewer",
            Some(UsersetExpr::TupleToUserset {
                tupleset_relation: "parent".to_string(),
                computed_relation: "viewer".to_string(),
            }),
        );
        model.type_definitions.push(model_with("folder", "viewer", None).type_definitions.remove(0));
        let tuples = vec![
            Tuple::new(Node::new("folder", "f1"), "parent", Node::new("document", "doc1")),
            Tuple::new(Node::new("user", "alice"), "viewer", Node::new("folder", "f1")),
        ];
        assert!(check(&model, &tuples, &Node::new("user", "alice"), "viewer", &Node::new("document", "doc1")));
    }

    #[test]
    fn intersection_requires_every_branch() {
        let model = model_with(
            "role",
            "assignee",
            Some(UsersetExpr::Intersection(vec![
                UsersetExpr::ComputedUserset { relation: "a".to_string() },
                UsersetExpr::ComputedUserset { relation: "b".to_string() },
            ])),
        );
        let mut model = model;
        model.type_definitions[0].relations.insert(
            "a".to_string(),
            RelationMetadata { directly_related: vec![], userset: None },
        );
        model.type_definitions[0].relations.insert(
            "b".to_string(),
            RelationMetadata { directly_related: vec![], userset: None },
        );
        let tuples = vec![Tuple::new(Node::new("user", "alice"), "a", Node::new("role", "r1"))];
        assert!(!check(&model, &tuples, &Node::new("user", "alice"), "assignee", &Node::new("role", "r1")));

        let tuples = vec![
            Tuple::new(Node::new("user", "alice"), "a", Node::new("role", "r1")),
            Tuple::new(Node::new("user", "alice"), "b", Node::new("role", "r1")),
        ];
        assert!(check(&model, &tuples, &Node::new("user", "alice"), "assignee", &Node::new("role", "r1")));
    }
}
