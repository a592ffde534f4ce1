use std::collections::HashMap;

use crate::error::{GraphError, Result};

/// The tagged source-object dispatch key. Concrete RBAC schemas (and any
/// other schema built on this crate) wrap their own object types in a
/// variant of an enum that implements `AsRbacObject`-style narrowing by
/// providing closures over a boxed `Any`-free representation: rather than
/// reflecting on a source object, every `IdExpr`/`UserIdExpr`/`ObjectIdExpr`
/// closure is written against one concrete Rust type and the schema wires
/// them up at construction time. `SourceObject` is therefore an opaque
/// `dyn Any`-like handle: schemas downcast via `SourceObject::downcast_ref`.
#[derive(Clone, Copy)]
pub struct SourceObject<'a> {
    inner: &'a (dyn std::any::Any + Send + Sync),
}

impl<'a> SourceObject<'a> {
    pub fn new<T: std::any::Any + Send + Sync>(value: &'a T) -> Self {
        Self { inner: value }
    }

    pub fn downcast_ref<T: std::any::Any>(&self) -> Option<&'a T> {
        self.inner.downcast_ref::<T>()
    }
}

pub type IdExprFn = Box<dyn Fn(SourceObject) -> Result<String> + Send + Sync>;
pub type ConditionFn = Box<dyn Fn(SourceObject) -> bool + Send + Sync>;
pub type UserIdExprFn = Box<dyn Fn(SourceObject) -> Vec<String> + Send + Sync>;
pub type ObjectIdExprFn = Box<dyn Fn(SourceObject, &str) -> Vec<String> + Send + Sync>;

/// One edge where the schema's type is the *object* (other types point at it).
pub struct IncomingRelation {
    pub user_type: String,
    pub user_set_relation: Option<String>,
    pub relation: String,
    pub user_id_expr: UserIdExprFn,
    pub condition: Option<ConditionFn>,
    pub escape_id: bool,
}

/// One edge where the schema's type is the *user* (it points at other types).
pub struct OutgoingRelation {
    pub object_type: String,
    pub user_set_relation: Option<String>,
    pub relations: Vec<String>,
    pub object_id_expr: ObjectIdExprFn,
    pub condition: Option<ConditionFn>,
    pub escape_id: bool,
}

/// Store-side userset expression tree, consumed only by the model compiler.
/// The generator never inspects this.
pub enum EvaluatedUserset {
    Union(Vec<EvaluatedUserset>),
    Intersection(Vec<EvaluatedUserset>),
    Difference {
        base: Box<EvaluatedUserset>,
        subtract: Box<EvaluatedUserset>,
    },
    ComputedUserset {
        relation: String,
    },
    TupleToUserset {
        tupleset_relation: String,
        computed_relation: String,
    },
}

impl EvaluatedUserset {
    pub fn union(parts: Vec<EvaluatedUserset>) -> Self {
        EvaluatedUserset::Union(parts)
    }

    pub fn computed(relation: impl Into<String>) -> Self {
        EvaluatedUserset::ComputedUserset {
            relation: relation.into(),
        }
    }

    pub fn tuple_to_userset(
        tupleset_relation: impl Into<String>,
        computed_relation: impl Into<String>,
    ) -> Self {
        EvaluatedUserset::TupleToUserset {
            tupleset_relation: tupleset_relation.into(),
            computed_relation: computed_relation.into(),
        }
    }
}

/// A schema entry for one type: how to derive its node ID from a source
/// object, and the edges it owns in either direction.
pub struct TypeRelation {
    pub type_name: String,
    pub id_expr: IdExprFn,
    pub escape_id: bool,
    pub condition: Option<ConditionFn>,
    pub incoming: Vec<IncomingRelation>,
    pub outgoing: Vec<OutgoingRelation>,
    pub evaluated_usersets: HashMap<String, EvaluatedUserset>,
}

impl TypeRelation {
    pub fn new(type_name: impl Into<String>, id_expr: IdExprFn) -> Self {
        Self {
            type_name: type_name.into(),
            id_expr,
            escape_id: false,
            condition: None,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            evaluated_usersets: HashMap::new(),
        }
    }

    pub fn escaped(mut self) -> Self {
        self.escape_id = true;
        self
    }

    pub fn with_condition(mut self, c: ConditionFn) -> Self {
        self.condition = Some(c);
        self
    }

    pub fn with_incoming(mut self, r: IncomingRelation) -> Self {
        self.incoming.push(r);
        self
    }

    pub fn with_outgoing(mut self, r: OutgoingRelation) -> Self {
        self.outgoing.push(r);
        self
    }

    pub fn with_evaluated_userset(mut self, relation: impl Into<String>, u: EvaluatedUserset) -> Self {
        self.evaluated_usersets.insert(relation.into(), u);
        self
    }
}

/// An ordered list of type relations. Order matters only for deterministic
/// iteration elsewhere (the model compiler re-sorts lexicographically
/// before emitting a document).
pub struct AuthorizationSchema {
    pub types: Vec<TypeRelation>,
}

impl AuthorizationSchema {
    pub fn new(types: Vec<TypeRelation>) -> Self {
        Self { types }
    }

    pub fn find(&self, type_name: &str) -> Result<&TypeRelation> {
        let mut found = None;
        for t in &self.types {
            if t.type_name == type_name {
                if found.is_some() {
                    return Err(GraphError::AmbiguousType(type_name.to_string()));
                }
                found = Some(t);
            }
        }
        found.ok_or_else(|| GraphError::UnknownType(type_name.to_string()))
    }

    /// All outgoing object types (direct or via userset) reachable from
    /// `user_type`, optionally restricted to edges whose `user_set_relation`
    /// matches `want_relation` (wildcard matches any outgoing userset edge).
    pub fn reachable_object_types(
        &self,
        user_type: &str,
        want_relation: Option<&str>,
    ) -> Vec<String> {
        let mut out = Vec::new();
        for t in &self.types {
            for out_rel in &t.outgoing {
                if t.type_name != user_type {
                    continue;
                }
                let matches = match want_relation {
                    None => out_rel.user_set_relation.is_none(),
                    Some(crate::tuple::WILDCARD) => out_rel.user_set_relation.is_some(),
                    Some(want) => out_rel.user_set_relation.as_deref() == Some(want),
                };
                if matches && !out.contains(&out_rel.object_type) {
                    out.push(out_rel.object_type.clone());
                }
            }
        }
        out
    }
}
