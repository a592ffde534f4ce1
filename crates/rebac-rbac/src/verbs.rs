//! The fixed verb sets the schema and authorizer reason about. Custom verbs
//! beyond this set are a non-goal.

use crate::k8s::VERB_WILDCARD;

pub const ANY_VERB: &str = "anyverb";

/// Verbs meaningful only against a resource collection (no name).
pub const COLLECTION_RELATIONS_ONLY: &[&str] = &["list", "create", "deletecollection"];

/// Verbs meaningful at either scope.
pub const COMMON_RELATIONS: &[&str] = &["get", "watch", "update", "patch", "delete"];

/// Verbs valid against a single named instance.
pub const INSTANCE_RELATIONS: &[&str] = COMMON_RELATIONS;

/// Verbs valid against a resource collection: the common set plus the
/// collection-only set.
pub fn collection_relations() -> Vec<&'static str> {
    let mut v = COMMON_RELATIONS.to_vec();
    v.extend_from_slice(COLLECTION_RELATIONS_ONLY);
    v
}

/// Every verb a resource-typed rule may produce edges for, across both
/// scopes; used when emitting from a cluster-scoped role.
pub fn resource_relations() -> Vec<&'static str> {
    collection_relations()
}

/// The only verb meaningful against a non-resource URL.
pub const NON_RESOURCE_RELATIONS: &[&str] = &["get"];

/// Expands a rule's declared verbs against `scope_verbs`: the platform
/// wildcard expands to every verb in scope plus the synthetic `anyverb`
/// edge; anything else is filtered to verbs actually present in scope.
pub fn expand_verbs(rule_verbs: &[String], scope_verbs: &[&str]) -> Vec<String> {
    if rule_verbs.iter().any(|v| v == VERB_WILDCARD) {
        let mut out: Vec<String> = scope_verbs.iter().map(|v| v.to_string()).collect();
        out.push(ANY_VERB.to_string());
        return out;
    }
    rule_verbs
        .iter()
        .filter(|v| scope_verbs.contains(&v.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_expands_to_scope_plus_anyverb() {
        let expanded = expand_verbs(&["*".to_string()], &["get", "list"]);
        assert!(expanded.contains(&"get".to_string()));
        assert!(expanded.contains(&"list".to_string()));
        assert!(expanded.contains(&ANY_VERB.to_string()));
        assert_eq!(expanded.len(), 3);
    }

    #[test]
    fn named_verbs_filtered_to_scope() {
        let expanded = expand_verbs(
            &["get".to_string(), "list".to_string(), "bogus".to_string()],
            &["get", "watch"],
        );
        assert_eq!(expanded, vec!["get".to_string()]);
    }
}
