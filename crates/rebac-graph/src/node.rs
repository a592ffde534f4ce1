use serde::{Deserialize, Serialize};

use crate::tuple::Tuple;

/// A single identity in the relationship graph: a type and a name.
///
/// Two nodes are equal iff both fields match; a node of one type is never
/// equal to a node of another type even if the names coincide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    pub node_type: String,
    pub name: String,
}

impl Node {
    pub fn new(node_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            name: name.into(),
        }
    }

    /// A node is valid only if both its type and name are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.node_type.is_empty() && !self.name.is_empty()
    }

    /// Turns this node into a userset query: "every user related to this
    /// node through `relation`". Usersets only ever appear on the user side
    /// of a tuple.
    pub fn with_userset(&self, relation: impl Into<String>) -> Subject {
        Subject::UserSet(self.clone(), relation.into())
    }

    /// Starts building tuples where this node is the user/subject.
    pub fn with_relation(&self, relation: impl Into<String>) -> RelatedNode {
        RelatedNode {
            subject: Subject::User(self.clone()),
            relation: relation.into(),
        }
    }
}

/// The user side of a tuple: either a plain node, or a userset (a node plus
/// the relation through which its members are found).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    User(Node),
    UserSet(Node, String),
}

impl Subject {
    pub fn node(&self) -> &Node {
        match self {
            Subject::User(n) => n,
            Subject::UserSet(n, _) => n,
        }
    }

    pub fn userset_relation(&self) -> Option<&str> {
        match self {
            Subject::UserSet(_, r) => Some(r.as_str()),
            Subject::User(_) => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.node().is_valid()
    }

    pub fn with_relation(self, relation: impl Into<String>) -> RelatedNode {
        RelatedNode {
            subject: self,
            relation: relation.into(),
        }
    }
}

impl From<Node> for Subject {
    fn from(n: Node) -> Self {
        Subject::User(n)
    }
}

/// One subject (user or userset) and a relation, ready to be related to one
/// or more object nodes.
pub struct RelatedNode {
    subject: Subject,
    relation: String,
}

impl RelatedNode {
    /// Produces a single tuple to `object`, or `None` if either endpoint is
    /// invalid or the relation is empty — generators drop these silently.
    pub fn to_one(&self, object: Node) -> Option<Tuple> {
        if !self.subject.is_valid() || !object.is_valid() || self.relation.is_empty() {
            return None;
        }
        Some(Tuple {
            user: self.subject.clone(),
            relation: self.relation.clone(),
            object,
        })
    }

    pub fn to(&self, objects: impl IntoIterator<Item = Node>) -> Vec<Tuple> {
        objects.into_iter().filter_map(|o| self.to_one(o)).collect()
    }
}

/// Multiple subjects (nodes or usersets) and one relation, ready to be
/// related to one or more object nodes. Produces the cartesian product of
/// subjects x objects, each filtered by validity.
pub struct RelatedNodes {
    subjects: Vec<Subject>,
    relation: String,
}

impl RelatedNodes {
    pub fn to(&self, objects: impl IntoIterator<Item = Node> + Clone) -> Vec<Tuple> {
        let mut out = Vec::new();
        for subject in &self.subjects {
            let related = RelatedNode {
                subject: subject.clone(),
                relation: self.relation.clone(),
            };
            out.extend(related.to(objects.clone()));
        }
        out
    }
}

pub fn nodes_with_relation(nodes: Vec<Node>, relation: impl Into<String>) -> RelatedNodes {
    RelatedNodes {
        subjects: nodes.into_iter().map(Subject::User).collect(),
        relation: relation.into(),
    }
}

pub fn subjects_with_relation(subjects: Vec<Subject>, relation: impl Into<String>) -> RelatedNodes {
    RelatedNodes {
        subjects,
        relation: relation.into(),
    }
}
