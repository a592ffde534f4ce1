//! Supplemental generic-object schema used only by the authorizer's
//! fallback check: non-RBAC-derived policies (node→pod→secret traversal)
//! decide against these generic nodes when the primary RBAC-derived check
//! returns no opinion for an instance-scoped request.
//!
//! No generator ever runs against this schema from this crate; it exists so
//! the model compiler registers these types, and so `rebac-authorizer` has
//! a stable node-naming convention (`<type>:<namespace-or-empty>/<name>`)
//! to build the fallback check's target node.

use rebac_graph::Node;

pub const TYPE_NODE: &str = "core.node";
pub const TYPE_POD: &str = "core.pod";
pub const TYPE_SECRET: &str = "core.secret";

/// Maps a resource's group-version-resource to the generic type name the
/// fallback check targets, or `None` if this resource has no generic
/// counterpart (the fallback leg degrades to no opinion for that leg).
pub fn type_name_for_gvr(api_group: &str, resource: &str) -> Option<&'static str> {
    match (api_group, resource) {
        ("", "nodes") => Some(TYPE_NODE),
        ("", "pods") => Some(TYPE_POD),
        ("", "secrets") => Some(TYPE_SECRET),
        _ => None,
    }
}

/// Builds the generic-object node `<type>:<namespace-or-empty>/<name>`.
pub fn generic_node(type_name: &str, namespace: &str, name: &str) -> Node {
    Node::new(type_name, format!("{namespace}/{}", urlencoding::encode(name)))
}
