//! Node constructors and ID derivation for the RBAC schema. Every rule here
//! is load-bearing for idempotent reconciliation: two different source
//! objects that reference the "same" role must derive the identical node.

use rebac_graph::Node;

pub mod types {
    pub const USER: &str = "user";
    pub const GROUP: &str = "group";
    pub const NAMESPACE: &str = "namespace";
    pub const CLUSTER_ROLE: &str = "clusterrole";
    pub const CLUSTER_ROLE_BINDING: &str = "clusterrolebinding";
    pub const ROLE: &str = "role";
    pub const ROLE_BINDING: &str = "rolebinding";
    pub const RESOURCE: &str = "resource";
    pub const RESOURCE_INSTANCE: &str = "resourceinstance";
    pub const NON_RESOURCE_URLS: &str = "nonresourceurls";
    pub const CLUSTER_ROLE_LABEL: &str = "clusterrole_label";
}

pub mod relations {
    pub const ASSIGNEE: &str = "assignee";
    pub const NAMESPACED_ASSIGNEE: &str = "namespaced_assignee";
    pub const CONTAINS: &str = "contains";
    pub const OPERATES_IN: &str = "operates_in";
    pub const SELECTS: &str = "selects";
    pub const CARRIES_LABEL: &str = "carries_label";
    pub const MEMBERS: &str = "members";
    pub const WILDCARD_MATCH: &str = "wildcardmatch";
    pub const RESOURCE_MATCH: &str = "resourcematch";
}

/// Sentinel substituted for an empty API group (the platform's "core" group).
pub const API_GROUP_CORE: &str = "core";

fn escape(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

pub fn user_node(name: &str) -> Node {
    Node::new(types::USER, escape(name))
}

pub fn group_node(name: &str) -> Node {
    Node::new(types::GROUP, escape(name))
}

pub fn cluster_role_node(name: &str) -> Node {
    Node::new(types::CLUSTER_ROLE, escape(name))
}

pub fn cluster_role_binding_node(name: &str) -> Node {
    Node::new(types::CLUSTER_ROLE_BINDING, escape(name))
}

/// Namespace names are assumed label-conformant (DNS-1123) and are not
/// percent-encoded.
pub fn namespace_node(name: &str) -> Node {
    Node::new(types::NAMESPACE, name)
}

/// `"<namespace>/<percent-encoded-name>"`; the joined string is not
/// re-encoded, only the name component is.
pub fn namespaced_escaped_id(namespace: &str, name: &str) -> String {
    format!("{}/{}", namespace, escape(name))
}

pub fn namespaced_role_node(namespace: &str, name: &str) -> Node {
    Node::new(types::ROLE, namespaced_escaped_id(namespace, name))
}

pub fn namespaced_role_binding_node(namespace: &str, name: &str) -> Node {
    Node::new(types::ROLE_BINDING, namespaced_escaped_id(namespace, name))
}

/// Rewrites an empty API group to the `"core"` sentinel.
pub fn normalized_api_group(api_group: &str) -> &str {
    if api_group.is_empty() {
        API_GROUP_CORE
    } else {
        api_group
    }
}

/// `"<apiGroup>.<resource>"`; `resource` may itself be `"<name>"` or
/// `"<name>/<subresource>"`.
pub fn resource_id(api_group: &str, resource: &str) -> String {
    format!("{}.{}", normalized_api_group(api_group), resource)
}

pub fn resource_node(api_group: &str, resource: &str) -> Node {
    Node::new(types::RESOURCE, resource_id(api_group, resource))
}

/// `"<apiGroup>.<resource>/<percent-encoded-name>"`.
pub fn resource_instance_id(api_group: &str, resource: &str, name: &str) -> String {
    format!("{}/{}", resource_id(api_group, resource), escape(name))
}

pub fn resource_instance_node(api_group: &str, resource: &str, name: &str) -> Node {
    Node::new(
        types::RESOURCE_INSTANCE,
        resource_instance_id(api_group, resource, name),
    )
}

/// Forces the path to start with `"/"`, the only normalization non-resource
/// URLs receive (open question §9: whether to validate further).
pub fn non_resource_url_id(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

pub fn non_resource_urls_node(path: &str) -> Node {
    Node::new(types::NON_RESOURCE_URLS, non_resource_url_id(path))
}

pub fn cluster_role_label_key_node(key: &str) -> Node {
    Node::new(types::CLUSTER_ROLE_LABEL, key)
}

pub fn cluster_role_label_key_value_node(key: &str, value: &str) -> Node {
    Node::new(types::CLUSTER_ROLE_LABEL, format!("{key}={value}"))
}
