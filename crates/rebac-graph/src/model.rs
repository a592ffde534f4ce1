use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::{AuthorizationSchema, EvaluatedUserset};

/// One relation's directly-assignable sources: a user type, optionally
/// qualified by the relation its members are drawn through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectSource {
    pub user_type: String,
    pub user_set_relation: Option<String>,
}

/// Backend-neutral userset expression tree. A concrete store adapter
/// translates this into whatever wire format it needs (e.g. OpenFGA's
/// `Userset` protobuf); this crate never depends on a specific backend's
/// types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UsersetExpr {
    This,
    Union(Vec<UsersetExpr>),
    Intersection(Vec<UsersetExpr>),
    Difference {
        base: Box<UsersetExpr>,
        subtract: Box<UsersetExpr>,
    },
    ComputedUserset {
        relation: String,
    },
    TupleToUserset {
        tupleset_relation: String,
        computed_relation: String,
    },
}

/// One relation on a type: its direct sources plus its evaluated-userset
/// expression, if any.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationMetadata {
    pub directly_related: Vec<DirectSource>,
    pub userset: Option<UsersetExpr>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub type_name: String,
    pub relations: BTreeMap<String, RelationMetadata>,
}

/// The compiled model: one type definition per referenced type, sorted
/// lexicographically by type name for a stable document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompiledModel {
    pub type_definitions: Vec<TypeDefinition>,
}

fn translate_userset(u: &EvaluatedUserset) -> UsersetExpr {
    match u {
        EvaluatedUserset::Union(parts) => {
            UsersetExpr::Union(parts.iter().map(translate_userset).collect())
        }
        EvaluatedUserset::Intersection(parts) => {
            UsersetExpr::Intersection(parts.iter().map(translate_userset).collect())
        }
        EvaluatedUserset::Difference { base, subtract } => UsersetExpr::Difference {
            base: Box::new(translate_userset(base)),
            subtract: Box::new(translate_userset(subtract)),
        },
        EvaluatedUserset::ComputedUserset { relation } => UsersetExpr::ComputedUserset {
            relation: relation.clone(),
        },
        EvaluatedUserset::TupleToUserset {
            tupleset_relation,
            computed_relation,
        } => UsersetExpr::TupleToUserset {
            tupleset_relation: tupleset_relation.clone(),
            computed_relation: computed_relation.clone(),
        },
    }
}

/// Flattens a union's top-level children, so that prepending a direct
/// source to an already-union expression doesn't nest unions needlessly.
fn flatten_union_children(expr: UsersetExpr) -> Vec<UsersetExpr> {
    match expr {
        UsersetExpr::Union(children) => children,
        other => vec![other],
    }
}

fn get_or_create_type<'a>(
    defs: &'a mut Vec<TypeDefinition>,
    type_name: &str,
) -> &'a mut TypeDefinition {
    if let Some(pos) = defs.iter().position(|d| d.type_name == type_name) {
        &mut defs[pos]
    } else {
        defs.push(TypeDefinition {
            type_name: type_name.to_string(),
            relations: BTreeMap::new(),
        });
        defs.last_mut().unwrap()
    }
}

/// Traverses the schema and produces the store's type-definition document.
pub fn build_model(schema: &AuthorizationSchema) -> CompiledModel {
    let mut defs: Vec<TypeDefinition> = Vec::new();

    for type_relation in &schema.types {
        get_or_create_type(&mut defs, &type_relation.type_name);

        for incoming in &type_relation.incoming {
            get_or_create_type(&mut defs, &incoming.user_type);
            let target = get_or_create_type(&mut defs, &type_relation.type_name);
            let rel = target.relations.entry(incoming.relation.clone()).or_default();
            rel.directly_related.push(DirectSource {
                user_type: incoming.user_type.clone(),
                user_set_relation: incoming.user_set_relation.clone(),
            });
        }

        for outgoing in &type_relation.outgoing {
            get_or_create_type(&mut defs, &outgoing.object_type);
            let source_type = type_relation.type_name.clone();
            for relation in &outgoing.relations {
                let target = get_or_create_type(&mut defs, &outgoing.object_type);
                let rel = target.relations.entry(relation.clone()).or_default();
                rel.directly_related.push(DirectSource {
                    user_type: source_type.clone(),
                    user_set_relation: outgoing.user_set_relation.clone(),
                });
            }
        }
    }

    for type_relation in &schema.types {
        let target = get_or_create_type(&mut defs, &type_relation.type_name);
        for (relation, evaluated) in &type_relation.evaluated_usersets {
            let translated = translate_userset(evaluated);
            let rel = target.relations.entry(relation.clone()).or_default();
            rel.userset = Some(if rel.directly_related.is_empty() {
                translated
            } else {
                let mut children = vec![UsersetExpr::This];
                children.extend(flatten_union_children(translated));
                UsersetExpr::Union(children)
            });
        }
    }

    defs.sort_by(|a, b| a.type_name.cmp(&b.type_name));
    CompiledModel {
        type_definitions: defs,
    }
}
