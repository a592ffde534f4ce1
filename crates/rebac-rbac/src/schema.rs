//! The concrete schema mapping platform RBAC objects onto the relationship
//! graph: `rbac_schema()` builds the `AuthorizationSchema` consumed by
//! `rebac_graph::generate_tuples_for`, `build_model`, and `reconcile_compute`.

use rebac_graph::{
    schema::{IncomingRelation, OutgoingRelation, SourceObject},
    AuthorizationSchema, EvaluatedUserset, TypeRelation,
};

use crate::ids::{self, relations, types};
use crate::k8s::{
    ClusterRole, ClusterRoleBinding, Role, RoleBinding, Subject, API_GROUP_RBAC,
    BOOTSTRAPPING_LABEL, KIND_CLUSTER_ROLE, SUBJECT_KIND_GROUP, SUBJECT_KIND_SERVICE_ACCOUNT,
    SUBJECT_KIND_USER,
};
use crate::verbs::{self, resource_relations, ANY_VERB, INSTANCE_RELATIONS, NON_RESOURCE_RELATIONS};

fn service_account_user_id(namespace: &str, name: &str) -> String {
    format!("system:serviceaccount:{namespace}:{name}")
}

fn direct_subject_ids(subjects: &[Subject]) -> Vec<String> {
    subjects
        .iter()
        .filter_map(|s| match s.kind.as_str() {
            SUBJECT_KIND_USER if s.api_group == API_GROUP_RBAC || s.api_group.is_empty() => {
                Some(s.name.clone())
            }
            SUBJECT_KIND_SERVICE_ACCOUNT if !s.namespace.is_empty() => {
                Some(service_account_user_id(&s.namespace, &s.name))
            }
            _ => None,
        })
        .collect()
}

fn namespaced_direct_subject_ids(subjects: &[Subject], binding_namespace: &str) -> Vec<String> {
    subjects
        .iter()
        .filter_map(|s| match s.kind.as_str() {
            SUBJECT_KIND_USER if s.api_group == API_GROUP_RBAC || s.api_group.is_empty() => {
                Some(s.name.clone())
            }
            SUBJECT_KIND_SERVICE_ACCOUNT => {
                let ns = if s.namespace.is_empty() {
                    binding_namespace
                } else {
                    s.namespace.as_str()
                };
                if ns.is_empty() {
                    None
                } else {
                    Some(service_account_user_id(ns, &s.name))
                }
            }
            _ => None,
        })
        .collect()
}

fn group_subject_ids(subjects: &[Subject]) -> Vec<String> {
    subjects
        .iter()
        .filter(|s| s.kind == SUBJECT_KIND_GROUP)
        .map(|s| s.name.clone())
        .collect()
}

/// Resource IDs a role/clusterrole's collection-scope rules grant `relation`
/// (a verb name) for. Shared by role and clusterrole outgoing edges.
fn collection_resource_ids(rules: &[crate::k8s::PolicyRule], relation: &str) -> Vec<String> {
    let mut out = Vec::new();
    for rule in rules {
        if !rule.resource_names.is_empty() || !rule.non_resource_urls.is_empty() {
            continue;
        }
        let expanded = verbs::expand_verbs(&rule.verbs, &resource_relations());
        if !expanded.iter().any(|v| v == relation) {
            continue;
        }
        for api_group in &rule.api_groups {
            for resource in &rule.resources {
                out.push(ids::resource_id(api_group, resource));
            }
        }
    }
    out
}

/// `resource_relations()` plus the synthetic `anyverb` edge a wildcard rule
/// (`verbs: ["*"]`) expands into — every outgoing edge that can carry a
/// wildcard grant must list `anyverb` here, or `expand_verbs`'s synthesized
/// relation is computed but never actually generated as a tuple.
fn resource_edge_relations() -> Vec<String> {
    let mut v: Vec<String> = resource_relations().into_iter().map(String::from).collect();
    v.push(ANY_VERB.to_string());
    v
}

/// `INSTANCE_RELATIONS` plus `anyverb`, the instance-scoped counterpart of
/// `resource_edge_relations()`. A named instance never gets `list`/`create`/
/// `deletecollection` edges — those are collection-only verbs.
fn instance_edge_relations() -> Vec<String> {
    let mut v: Vec<String> = INSTANCE_RELATIONS.iter().map(|s| s.to_string()).collect();
    v.push(ANY_VERB.to_string());
    v
}

fn instance_resource_ids(rules: &[crate::k8s::PolicyRule], relation: &str) -> Vec<String> {
    let mut out = Vec::new();
    for rule in rules {
        if rule.resource_names.is_empty() {
            continue;
        }
        let expanded = verbs::expand_verbs(&rule.verbs, INSTANCE_RELATIONS);
        if !expanded.iter().any(|v| v == relation) {
            continue;
        }
        for api_group in &rule.api_groups {
            for resource in &rule.resources {
                for name in &rule.resource_names {
                    out.push(ids::resource_instance_id(api_group, resource, name));
                }
            }
        }
    }
    out
}

fn non_resource_ids(rules: &[crate::k8s::PolicyRule], relation: &str) -> Vec<String> {
    let mut out = Vec::new();
    for rule in rules {
        if rule.non_resource_urls.is_empty() {
            continue;
        }
        let expanded = verbs::expand_verbs(&rule.verbs, &NON_RESOURCE_RELATIONS.to_vec());
        if !expanded.iter().any(|v| v == relation) {
            continue;
        }
        for path in &rule.non_resource_urls {
            out.push(ids::non_resource_url_id(path));
        }
    }
    out
}

/// `resource#V`, `resourceinstance#V`, `nonresourceurls#V` all follow the
/// same shape: direct grant, the synthetic any-verb grant, and a cascade
/// from a matched node reached via `tupleset_relation` (`wildcardmatch` for
/// resource/nonresourceurls, `resourcematch` for resourceinstance — the
/// wildcard cascade already happened one hop up, on the collection node).
fn verb_cascade_userset(tupleset_relation: &str) -> EvaluatedUserset {
    EvaluatedUserset::union(vec![
        EvaluatedUserset::computed(ANY_VERB),
        EvaluatedUserset::tuple_to_userset(tupleset_relation, "__self__"),
    ])
}

/// Builds a leaf type (resource/resourceinstance/nonresourceurls) whose own
/// generator never runs — it exists only to host the per-verb evaluated
/// usersets; every tuple targeting it is produced by clusterrole/role's
/// outgoing edges.
fn leaf_type(type_name: &str, scope_verbs: &[&str], tupleset_relation: &str) -> TypeRelation {
    let mut tr = TypeRelation::new(type_name, Box::new(|_: SourceObject| Ok(String::new())));
    for verb in scope_verbs {
        let cascade = verb_cascade_userset(tupleset_relation);
        let with_self = match cascade {
            EvaluatedUserset::Union(mut parts) => {
                for part in parts.iter_mut() {
                    if let EvaluatedUserset::TupleToUserset {
                        computed_relation, ..
                    } = part
                    {
                        if computed_relation == "__self__" {
                            *computed_relation = verb.to_string();
                        }
                    }
                }
                EvaluatedUserset::Union(parts)
            }
            other => other,
        };
        tr = tr.with_evaluated_userset(*verb, with_self);
    }
    tr
}

/// Builds the complete RBAC→ReBAC schema.
pub fn rbac_schema() -> AuthorizationSchema {
    let mut resource_verbs = resource_relations();
    resource_verbs.push(ANY_VERB);
    let resource = leaf_type(types::RESOURCE, &resource_verbs, relations::WILDCARD_MATCH);

    let mut instance_verbs = INSTANCE_RELATIONS.to_vec();
    instance_verbs.push(ANY_VERB);
    let resource_instance = leaf_type(types::RESOURCE_INSTANCE, &instance_verbs, relations::RESOURCE_MATCH);

    let mut non_resource_verbs = NON_RESOURCE_RELATIONS.to_vec();
    non_resource_verbs.push(ANY_VERB);
    let non_resource_urls = leaf_type(types::NON_RESOURCE_URLS, &non_resource_verbs, relations::WILDCARD_MATCH);

    // Registration-only: no controller ever reconciles a bare Namespace or
    // Group object here; their tuples are request-scoped contextual tuples
    // (authorizer §4.H steps 3 and 6). These entries exist so the model
    // compiler registers the relation as directly assignable from `user`.
    let namespace = TypeRelation::new(types::NAMESPACE, Box::new(|_: SourceObject| Ok(String::new())))
        .with_incoming(IncomingRelation {
            user_type: types::USER.to_string(),
            user_set_relation: None,
            relation: relations::OPERATES_IN.to_string(),
            user_id_expr: Box::new(|_| Vec::new()),
            condition: None,
            escape_id: false,
        });

    let group = TypeRelation::new(types::GROUP, Box::new(|_: SourceObject| Ok(String::new())))
        .with_incoming(IncomingRelation {
            user_type: types::USER.to_string(),
            user_set_relation: None,
            relation: relations::MEMBERS.to_string(),
            user_id_expr: Box::new(|_| Vec::new()),
            condition: None,
            escape_id: false,
        });

    let cluster_role_binding = TypeRelation::new(
        types::CLUSTER_ROLE_BINDING,
        Box::new(|src: SourceObject| {
            let crb = src
                .downcast_ref::<ClusterRoleBinding>()
                .ok_or_else(|| rebac_graph::GraphError::IdDerivation("expected ClusterRoleBinding".into()))?;
            Ok(crb.name.clone())
        }),
    )
    .with_incoming(IncomingRelation {
        user_type: types::USER.to_string(),
        user_set_relation: None,
        relation: relations::ASSIGNEE.to_string(),
        user_id_expr: Box::new(|src: SourceObject| {
            let crb = src.downcast_ref::<ClusterRoleBinding>().unwrap();
            direct_subject_ids(&crb.subjects)
        }),
        condition: None,
        // Matches `ids::user_node`, which always percent-encodes: subject
        // names like `system:serviceaccount:kube-system:foo` must land on
        // the same node the authorizer builds from the raw request user.
        escape_id: true,
    })
    .with_incoming(IncomingRelation {
        user_type: types::GROUP.to_string(),
        user_set_relation: Some(relations::MEMBERS.to_string()),
        relation: relations::ASSIGNEE.to_string(),
        user_id_expr: Box::new(|src: SourceObject| {
            let crb = src.downcast_ref::<ClusterRoleBinding>().unwrap();
            group_subject_ids(&crb.subjects)
        }),
        condition: None,
        // Matches `ids::group_node`, which always percent-encodes.
        escape_id: true,
    })
    .with_outgoing(OutgoingRelation {
        object_type: types::CLUSTER_ROLE.to_string(),
        user_set_relation: Some(relations::ASSIGNEE.to_string()),
        relations: vec![relations::ASSIGNEE.to_string()],
        object_id_expr: Box::new(|src: SourceObject, _relation: &str| {
            let crb = src.downcast_ref::<ClusterRoleBinding>().unwrap();
            if crb.role_ref.kind == KIND_CLUSTER_ROLE
                && (crb.role_ref.api_group == API_GROUP_RBAC || crb.role_ref.api_group.is_empty())
            {
                vec![crb.role_ref.name.clone()]
            } else {
                Vec::new()
            }
        }),
        condition: None,
        escape_id: true,
    });

    let role_binding = TypeRelation::new(
        types::ROLE_BINDING,
        Box::new(|src: SourceObject| {
            let rb = src
                .downcast_ref::<RoleBinding>()
                .ok_or_else(|| rebac_graph::GraphError::IdDerivation("expected RoleBinding".into()))?;
            Ok(ids::namespaced_escaped_id(&rb.namespace, &rb.name))
        }),
    )
    .with_incoming(IncomingRelation {
        user_type: types::USER.to_string(),
        user_set_relation: None,
        relation: relations::NAMESPACED_ASSIGNEE.to_string(),
        user_id_expr: Box::new(|src: SourceObject| {
            let rb = src.downcast_ref::<RoleBinding>().unwrap();
            namespaced_direct_subject_ids(&rb.subjects, &rb.namespace)
        }),
        condition: None,
        // Matches `ids::user_node`, which always percent-encodes.
        escape_id: true,
    })
    .with_incoming(IncomingRelation {
        user_type: types::GROUP.to_string(),
        user_set_relation: Some(relations::MEMBERS.to_string()),
        relation: relations::NAMESPACED_ASSIGNEE.to_string(),
        user_id_expr: Box::new(|src: SourceObject| {
            let rb = src.downcast_ref::<RoleBinding>().unwrap();
            group_subject_ids(&rb.subjects)
        }),
        condition: None,
        // Matches `ids::group_node`, which always percent-encodes.
        escape_id: true,
    })
    .with_outgoing(OutgoingRelation {
        object_type: types::ROLE.to_string(),
        user_set_relation: Some(relations::NAMESPACED_ASSIGNEE.to_string()),
        relations: vec![relations::NAMESPACED_ASSIGNEE.to_string()],
        object_id_expr: Box::new(|src: SourceObject, _relation: &str| {
            let rb = src.downcast_ref::<RoleBinding>().unwrap();
            if rb.role_ref.kind == crate::k8s::KIND_ROLE
                && (rb.role_ref.api_group == API_GROUP_RBAC || rb.role_ref.api_group.is_empty())
            {
                vec![ids::namespaced_escaped_id(&rb.namespace, &rb.role_ref.name)]
            } else {
                Vec::new()
            }
        }),
        condition: None,
        escape_id: false,
    });

    let mut role = TypeRelation::new(
        types::ROLE,
        Box::new(|src: SourceObject| {
            let r = src
                .downcast_ref::<Role>()
                .ok_or_else(|| rebac_graph::GraphError::IdDerivation("expected Role".into()))?;
            Ok(ids::namespaced_escaped_id(&r.namespace, &r.name))
        }),
    )
    .with_incoming(IncomingRelation {
        user_type: types::NAMESPACE.to_string(),
        user_set_relation: None,
        relation: relations::CONTAINS.to_string(),
        user_id_expr: Box::new(|src: SourceObject| {
            let r = src.downcast_ref::<Role>().unwrap();
            vec![r.namespace.clone()]
        }),
        condition: None,
        escape_id: false,
    })
    .with_outgoing(OutgoingRelation {
        object_type: types::RESOURCE.to_string(),
        user_set_relation: Some(relations::ASSIGNEE.to_string()),
        relations: resource_edge_relations(),
        object_id_expr: Box::new(|src: SourceObject, relation: &str| {
            let r = src.downcast_ref::<Role>().unwrap();
            collection_resource_ids(&r.rules, relation)
        }),
        condition: None,
        escape_id: false,
    })
    .with_outgoing(OutgoingRelation {
        object_type: types::RESOURCE_INSTANCE.to_string(),
        user_set_relation: Some(relations::ASSIGNEE.to_string()),
        relations: instance_edge_relations(),
        object_id_expr: Box::new(|src: SourceObject, relation: &str| {
            let r = src.downcast_ref::<Role>().unwrap();
            instance_resource_ids(&r.rules, relation)
        }),
        condition: None,
        escape_id: false,
    });
    role = role.with_evaluated_userset(
        relations::ASSIGNEE,
        EvaluatedUserset::Intersection(vec![
            EvaluatedUserset::computed(relations::NAMESPACED_ASSIGNEE),
            EvaluatedUserset::tuple_to_userset(relations::CONTAINS, relations::OPERATES_IN),
        ]),
    );

    let mut cluster_role = TypeRelation::new(
        types::CLUSTER_ROLE,
        Box::new(|src: SourceObject| {
            let cr = src
                .downcast_ref::<ClusterRole>()
                .ok_or_else(|| rebac_graph::GraphError::IdDerivation("expected ClusterRole".into()))?;
            Ok(cr.name.clone())
        }),
    )
    .with_outgoing(OutgoingRelation {
        object_type: types::RESOURCE.to_string(),
        user_set_relation: Some(relations::ASSIGNEE.to_string()),
        relations: resource_edge_relations(),
        object_id_expr: Box::new(|src: SourceObject, relation: &str| {
            let cr = src.downcast_ref::<ClusterRole>().unwrap();
            if cr.aggregation_rule.is_some() {
                return Vec::new();
            }
            collection_resource_ids(&cr.rules, relation)
        }),
        condition: None,
        escape_id: false,
    })
    .with_outgoing(OutgoingRelation {
        object_type: types::RESOURCE_INSTANCE.to_string(),
        user_set_relation: Some(relations::ASSIGNEE.to_string()),
        relations: instance_edge_relations(),
        object_id_expr: Box::new(|src: SourceObject, relation: &str| {
            let cr = src.downcast_ref::<ClusterRole>().unwrap();
            if cr.aggregation_rule.is_some() {
                return Vec::new();
            }
            instance_resource_ids(&cr.rules, relation)
        }),
        condition: None,
        escape_id: false,
    })
    .with_outgoing(OutgoingRelation {
        object_type: types::NON_RESOURCE_URLS.to_string(),
        user_set_relation: Some(relations::ASSIGNEE.to_string()),
        relations: {
            let mut v: Vec<String> = NON_RESOURCE_RELATIONS.iter().map(|s| s.to_string()).collect();
            v.push(ANY_VERB.to_string());
            v
        },
        object_id_expr: Box::new(|src: SourceObject, relation: &str| {
            let cr = src.downcast_ref::<ClusterRole>().unwrap();
            if cr.aggregation_rule.is_some() {
                return Vec::new();
            }
            non_resource_ids(&cr.rules, relation)
        }),
        condition: None,
        escape_id: false,
    })
    .with_outgoing(OutgoingRelation {
        // Every non-bootstrap role declares which label keys/values it
        // carries; an aggregating role's selector later matches against
        // these same `clusterrole_label` nodes (see `clusterrole_label`'s
        // own evaluated userset, below).
        object_type: types::CLUSTER_ROLE_LABEL.to_string(),
        user_set_relation: None,
        relations: vec![relations::SELECTS.to_string()],
        object_id_expr: Box::new(|src: SourceObject, _relation: &str| {
            let cr = src.downcast_ref::<ClusterRole>().unwrap();
            let Some(agg) = &cr.aggregation_rule else {
                return Vec::new();
            };
            let mut out = Vec::new();
            for selector in &agg.cluster_role_selectors {
                for (k, v) in &selector.match_labels {
                    out.push(format!("{k}={v}"));
                }
                if selector.match_expressions.len() == 1 {
                    let expr = &selector.match_expressions[0];
                    match expr.operator {
                        crate::k8s::SelectorOperator::Exists => out.push(expr.key.clone()),
                        crate::k8s::SelectorOperator::In if expr.values.len() == 1 => {
                            out.push(format!("{}={}", expr.key, expr.values[0]));
                        }
                        // Multi-value In, NotIn, DoesNotExist, and multi-term
                        // expressions are dropped silently (open question §9).
                        _ => {}
                    }
                }
            }
            out
        }),
        condition: None,
        escape_id: false,
    })
    .with_incoming(IncomingRelation {
        // The other half of aggregation: a constituent role's own `#assignee`
        // gains every user bound to an aggregate that selects one of its
        // labels, by pivoting through the label node's `#assignee` (which in
        // turn resolves back through `selects` to the aggregate).
        user_type: types::CLUSTER_ROLE_LABEL.to_string(),
        user_set_relation: None,
        relation: relations::CARRIES_LABEL.to_string(),
        user_id_expr: Box::new(|src: SourceObject| {
            let cr = src.downcast_ref::<ClusterRole>().unwrap();
            let mut out = Vec::new();
            for (k, v) in &cr.labels {
                if k == BOOTSTRAPPING_LABEL {
                    continue;
                }
                out.push(k.clone());
                out.push(format!("{k}={v}"));
            }
            out
        }),
        condition: None,
        escape_id: false,
    });
    cluster_role = cluster_role.with_evaluated_userset(
        relations::ASSIGNEE,
        EvaluatedUserset::tuple_to_userset(relations::CARRIES_LABEL, relations::ASSIGNEE),
    );

    let clusterrole_label = TypeRelation::new(
        types::CLUSTER_ROLE_LABEL,
        Box::new(|_: SourceObject| Ok(String::new())),
    )
    .with_evaluated_userset(
        relations::ASSIGNEE,
        EvaluatedUserset::tuple_to_userset(relations::SELECTS, relations::ASSIGNEE),
    );

    AuthorizationSchema::new(vec![
        namespace,
        group,
        resource,
        resource_instance,
        non_resource_urls,
        cluster_role_binding,
        role_binding,
        role,
        cluster_role,
        clusterrole_label,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::k8s::{PolicyRule, RoleRef};
    use rebac_graph::generate_tuples_for;

    #[test]
    fn schema_builds_without_panicking() {
        let schema = rbac_schema();
        assert!(schema.find(types::CLUSTER_ROLE).is_ok());
        assert!(schema.find(types::ROLE).is_ok());
    }

    #[test]
    fn cluster_role_binding_generates_assignee_edges() {
        let schema = rbac_schema();
        let tr = schema.find(types::CLUSTER_ROLE_BINDING).unwrap();
        let crb = ClusterRoleBinding {
            name: "admins-binding".to_string(),
            role_ref: RoleRef {
                api_group: API_GROUP_RBAC.to_string(),
                kind: KIND_CLUSTER_ROLE.to_string(),
                name: "cluster-admin".to_string(),
            },
            subjects: vec![
                Subject {
                    kind: SUBJECT_KIND_USER.to_string(),
                    api_group: API_GROUP_RBAC.to_string(),
                    name: "foo".to_string(),
                    namespace: String::new(),
                },
                Subject {
                    kind: SUBJECT_KIND_GROUP.to_string(),
                    api_group: API_GROUP_RBAC.to_string(),
                    name: "system:masters".to_string(),
                    namespace: String::new(),
                },
            ],
        };
        let tuples =
            generate_tuples_for(tr, rebac_graph::SourceObject::new(&crb)).unwrap();

        assert!(tuples
            .iter()
            .any(|t| t.object.name == "cluster-admin" && t.relation == "assignee"));
        assert!(tuples.iter().any(|t| t.user.node().name == "foo"));
        assert!(tuples
            .iter()
            .any(|t| t.user.node().name == "system%3Amasters" || t.user.node().name == "system:masters"));
    }

    #[test]
    fn cluster_role_binding_skips_non_cluster_role_ref() {
        let schema = rbac_schema();
        let tr = schema.find(types::CLUSTER_ROLE_BINDING).unwrap();
        let crb = ClusterRoleBinding {
            name: "broken".to_string(),
            role_ref: RoleRef {
                api_group: API_GROUP_RBAC.to_string(),
                kind: "Role".to_string(),
                name: "whatever".to_string(),
            },
            subjects: vec![],
        };
        let tuples =
            generate_tuples_for(tr, rebac_graph::SourceObject::new(&crb)).unwrap();
        assert!(tuples.iter().all(|t| t.object.node_type != types::CLUSTER_ROLE));
    }

    #[test]
    fn role_emits_collection_and_instance_edges() {
        let schema = rbac_schema();
        let tr = schema.find(types::ROLE).unwrap();
        let role = Role {
            name: "pod-reader".to_string(),
            namespace: "default".to_string(),
            rules: vec![
                PolicyRule {
                    api_groups: vec!["".to_string()],
                    resources: vec!["pods".to_string()],
                    resource_names: vec![],
                    verbs: vec!["get".to_string(), "list".to_string()],
                    non_resource_urls: vec![],
                },
                PolicyRule {
                    api_groups: vec!["".to_string()],
                    resources: vec!["configmaps".to_string()],
                    resource_names: vec!["cluster-info".to_string()],
                    verbs: vec!["update".to_string()],
                    non_resource_urls: vec![],
                },
            ],
        };
        let tuples = generate_tuples_for(tr, rebac_graph::SourceObject::new(&role)).unwrap();
        assert!(tuples
            .iter()
            .any(|t| t.object.node_type == types::RESOURCE && t.relation == "get"));
        assert!(tuples
            .iter()
            .any(|t| t.object.node_type == types::RESOURCE_INSTANCE && t.relation == "update"));
        assert!(tuples
            .iter()
            .any(|t| t.user.node().node_type == types::NAMESPACE && t.relation == relations::CONTAINS));
    }

    #[test]
    fn wildcard_verb_emits_anyverb_edge_on_collection_resource() {
        let schema = rbac_schema();
        let tr = schema.find(types::CLUSTER_ROLE).unwrap();
        let cr = ClusterRole {
            name: "cluster-admin".to_string(),
            labels: Default::default(),
            rules: vec![PolicyRule {
                api_groups: vec!["*".to_string()],
                resources: vec!["*".to_string()],
                resource_names: vec![],
                verbs: vec!["*".to_string()],
                non_resource_urls: vec![],
            }],
            aggregation_rule: None,
        };
        let tuples = generate_tuples_for(tr, rebac_graph::SourceObject::new(&cr)).unwrap();
        assert!(tuples
            .iter()
            .any(|t| t.object.node_type == types::RESOURCE && t.relation == "anyverb"));
    }

    #[test]
    fn wildcard_verb_on_named_instance_never_emits_collection_only_verbs() {
        let schema = rbac_schema();
        let tr = schema.find(types::ROLE).unwrap();
        let role = Role {
            name: "secret-owner".to_string(),
            namespace: "default".to_string(),
            rules: vec![PolicyRule {
                api_groups: vec!["".to_string()],
                resources: vec!["secrets".to_string()],
                resource_names: vec!["x".to_string()],
                verbs: vec!["*".to_string()],
                non_resource_urls: vec![],
            }],
        };
        let tuples = generate_tuples_for(tr, rebac_graph::SourceObject::new(&role)).unwrap();
        let instance_relations: std::collections::BTreeSet<&str> = tuples
            .iter()
            .filter(|t| t.object.node_type == types::RESOURCE_INSTANCE)
            .map(|t| t.relation.as_str())
            .collect();
        assert!(instance_relations.contains("get"));
        assert!(instance_relations.contains("anyverb"));
        for collection_only in ["list", "create", "deletecollection"] {
            assert!(!instance_relations.contains(collection_only));
        }
    }

    #[test]
    fn aggregating_role_emits_selects_edge_for_its_selector() {
        let schema = rbac_schema();
        let tr = schema.find(types::CLUSTER_ROLE).unwrap();
        let cr = ClusterRole {
            name: "view".to_string(),
            labels: Default::default(),
            rules: vec![],
            aggregation_rule: Some(crate::k8s::AggregationRule {
                cluster_role_selectors: vec![crate::k8s::LabelSelector {
                    match_expressions: vec![crate::k8s::LabelSelectorRequirement {
                        key: "rbac.authorization.k8s.io/aggregate-to-view".to_string(),
                        operator: crate::k8s::SelectorOperator::In,
                        values: vec!["true".to_string()],
                    }],
                    ..Default::default()
                }],
            }),
        };
        let tuples = generate_tuples_for(tr, rebac_graph::SourceObject::new(&cr)).unwrap();
        assert!(tuples.iter().any(|t| t.object.node_type == types::CLUSTER_ROLE_LABEL
            && t.relation == relations::SELECTS
            && t.object.name == "rbac.authorization.k8s.io/aggregate-to-view=true"));
        // An aggregating role has no rules of its own, so it emits no direct
        // resource grants (it can only grant through aggregation).
        assert!(tuples.iter().all(|t| t.object.node_type != types::RESOURCE));
    }

    #[test]
    fn labeled_constituent_emits_carries_label_edge() {
        let schema = rbac_schema();
        let tr = schema.find(types::CLUSTER_ROLE).unwrap();
        let mut labels = std::collections::BTreeMap::new();
        labels.insert(
            "rbac.authorization.k8s.io/aggregate-to-view".to_string(),
            "true".to_string(),
        );
        let cr = ClusterRole {
            name: "policy-view".to_string(),
            labels,
            rules: vec![],
            aggregation_rule: None,
        };
        let tuples = generate_tuples_for(tr, rebac_graph::SourceObject::new(&cr)).unwrap();
        assert!(tuples.iter().any(|t| t.relation == relations::CARRIES_LABEL
            && t.user.node().node_type == types::CLUSTER_ROLE_LABEL
            && t.user.node().name == "rbac.authorization.k8s.io/aggregate-to-view=true"
            && t.object.name == "policy-view"));
    }
}
