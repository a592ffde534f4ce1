use crate::error::Result;
use crate::node::Node;
use crate::schema::{SourceObject, TypeRelation};
use crate::tuple::Tuple;

fn escape(id: String, escape_id: bool) -> String {
    if escape_id {
        urlencoding::encode(&id).into_owned()
    } else {
        id
    }
}

/// Applies `type_relation` to `source`, producing every tuple it owns for
/// this object. Fails only when the subject's own ID cannot be derived;
/// individual edge ID failures are not possible by construction (edge
/// expressions return `Vec<String>`, not `Result`) but empty strings and
/// condition failures are filtered silently, matching the reference
/// generator's "invalid tuples are dropped" rule.
pub fn generate_tuples_for(type_relation: &TypeRelation, source: SourceObject) -> Result<Vec<Tuple>> {
    if let Some(ref condition) = type_relation.condition {
        if !condition(source) {
            return Ok(Vec::new());
        }
    }

    let subject_id = (type_relation.id_expr)(source)?;
    let subject_id = escape(subject_id, type_relation.escape_id);
    if subject_id.is_empty() {
        return Ok(Vec::new());
    }
    let subject = Node::new(type_relation.type_name.clone(), subject_id);

    let mut out = Vec::new();

    for edge in &type_relation.outgoing {
        if let Some(ref condition) = edge.condition {
            if !condition(source) {
                continue;
            }
        }
        for relation in &edge.relations {
            let ids = (edge.object_id_expr)(source, relation);
            for id in ids {
                let id = escape(id, edge.escape_id);
                if id.is_empty() {
                    continue;
                }
                let object = Node::new(edge.object_type.clone(), id);
                let user_subject = match &edge.user_set_relation {
                    Some(r) => subject.with_userset(r.clone()),
                    None => subject.clone().into(),
                };
                let tuple = Tuple::new(user_subject, relation.clone(), object);
                if tuple.is_valid() {
                    out.push(tuple);
                }
            }
        }
    }

    for edge in &type_relation.incoming {
        if let Some(ref condition) = edge.condition {
            if !condition(source) {
                continue;
            }
        }
        let ids = (edge.user_id_expr)(source);
        for id in ids {
            let id = escape(id, edge.escape_id);
            if id.is_empty() {
                continue;
            }
            let user_node = Node::new(edge.user_type.clone(), id);
            let user_subject = match &edge.user_set_relation {
                Some(r) => user_node.with_userset(r.clone()),
                None => user_node.into(),
            };
            let tuple = Tuple::new(user_subject, edge.relation.clone(), subject.clone());
            if tuple.is_valid() {
                out.push(tuple);
            }
        }
    }

    Ok(out)
}
