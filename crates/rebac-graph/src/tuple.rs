use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::node::{Node, Subject};

/// Wildcard sentinel for `userName` and `userSetRelation` in a `TupleFilter`.
pub const WILDCARD: &str = "*";

/// A relationship edge: `(user, relation, object)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tuple {
    pub user: Subject,
    pub relation: String,
    pub object: Node,
}

impl Tuple {
    pub fn new(user: impl Into<Subject>, relation: impl Into<String>, object: Node) -> Self {
        Self {
            user: user.into(),
            relation: relation.into(),
            object,
        }
    }

    /// A tuple is valid iff both endpoints are valid and the relation is non-empty.
    pub fn is_valid(&self) -> bool {
        self.user.is_valid() && self.object.is_valid() && !self.relation.is_empty()
    }

    pub fn userset_relation(&self) -> Option<&str> {
        self.user.userset_relation()
    }
}

/// A read predicate over the store.
///
/// Field names and validation rules mirror the reference implementation's
/// `TupleFilter`, not an ad hoc query builder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TupleFilter {
    pub user_type: Option<String>,
    pub user_name: Option<String>,
    pub user_set_relation: Option<String>,
    pub relation: Option<String>,
    pub object_type: Option<String>,
    pub object_name: Option<String>,
}

impl TupleFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_type(mut self, t: impl Into<String>) -> Self {
        self.user_type = Some(t.into());
        self
    }

    pub fn with_user_name(mut self, n: impl Into<String>) -> Self {
        self.user_name = Some(n.into());
        self
    }

    pub fn with_user_set_relation(mut self, r: impl Into<String>) -> Self {
        self.user_set_relation = Some(r.into());
        self
    }

    pub fn with_relation(mut self, r: impl Into<String>) -> Self {
        self.relation = Some(r.into());
        self
    }

    pub fn with_object_type(mut self, t: impl Into<String>) -> Self {
        self.object_type = Some(t.into());
        self
    }

    pub fn with_object_name(mut self, n: impl Into<String>) -> Self {
        self.object_name = Some(n.into());
        self
    }

    /// Validates the four rules a filter must satisfy. Each failure is a
    /// distinct error kind so callers can tell them apart.
    pub fn validate(&self) -> Result<()> {
        if self.user_name.is_some() && self.user_type.is_none() {
            return Err(GraphError::UserTypeRequiredForUserName);
        }
        if self.user_set_relation.is_some() && self.user_name.is_none() {
            return Err(GraphError::UserNameRequiredForUserSetRelation);
        }
        if self.object_name.is_some() && self.object_type.is_none() {
            return Err(GraphError::ObjectTypeRequiredForObjectName);
        }
        if self.user_name.as_deref() == Some(WILDCARD) && self.user_set_relation.is_some() {
            return Err(GraphError::UserSetRelationExclusiveWithWildcardUserName);
        }
        Ok(())
    }

    pub fn is_wildcard_user(&self) -> bool {
        self.user_name.as_deref() == Some(WILDCARD)
    }

    pub fn is_wildcard_user_set_relation(&self) -> bool {
        self.user_set_relation.as_deref() == Some(WILDCARD)
    }

    /// Does this tuple match the filter? Used by the in-memory backend and
    /// by tests; real backends apply the same predicate remotely.
    pub fn matches(&self, tuple: &Tuple) -> bool {
        if let Some(ref t) = self.user_type {
            if &tuple.user.node().node_type != t {
                return false;
            }
        }
        if let Some(ref n) = self.user_name {
            if n != WILDCARD && &tuple.user.node().name != n {
                return false;
            }
        }
        if let Some(ref r) = self.user_set_relation {
            if r != WILDCARD && tuple.user.userset_relation() != Some(r.as_str()) {
                return false;
            }
            if r == WILDCARD && tuple.user.userset_relation().is_none() {
                return false;
            }
        }
        if let Some(ref r) = self.relation {
            if &tuple.relation != r {
                return false;
            }
        }
        if let Some(ref t) = self.object_type {
            if &tuple.object.node_type != t {
                return false;
            }
        }
        if let Some(ref n) = self.object_name {
            if &tuple.object.name != n {
                return false;
            }
        }
        true
    }
}
