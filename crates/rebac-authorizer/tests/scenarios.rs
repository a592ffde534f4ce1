//! End-to-end authorization decisions, each built from a single platform
//! object graph and checked the way a webhook request would arrive.

use rebac_graph::{build_model, generate_tuples_for, SourceObject, TupleStore};
use rebac_rbac::k8s::{
    AggregationRule, ClusterRole, ClusterRoleBinding, LabelSelector, LabelSelectorRequirement,
    PolicyRule, Role, RoleBinding, RoleRef, SelectorOperator, Subject, API_GROUP_RBAC,
    KIND_CLUSTER_ROLE, KIND_ROLE, SUBJECT_KIND_GROUP, SUBJECT_KIND_SERVICE_ACCOUNT,
    SUBJECT_KIND_USER,
};
use rebac_rbac::rbac_schema;
use rebac_store::memory::InMemoryBackend;
use rebac_store::{ChunkedStore, RawBackend};

use rebac_authorizer::{AccessRequest, Authorizer, Decision};

fn req(user: &str) -> AccessRequest {
    AccessRequest {
        user: user.to_string(),
        groups: vec![],
        verb: String::new(),
        api_group: String::new(),
        resource: String::new(),
        subresource: None,
        name: None,
        namespace: None,
        is_resource_request: true,
        non_resource_path: None,
    }
}

fn user_subject(name: &str) -> Subject {
    Subject {
        kind: SUBJECT_KIND_USER.to_string(),
        api_group: API_GROUP_RBAC.to_string(),
        name: name.to_string(),
        namespace: String::new(),
    }
}

fn group_subject(name: &str) -> Subject {
    Subject {
        kind: SUBJECT_KIND_GROUP.to_string(),
        api_group: API_GROUP_RBAC.to_string(),
        name: name.to_string(),
        namespace: String::new(),
    }
}

fn service_account_subject(namespace: &str, name: &str) -> Subject {
    Subject {
        kind: SUBJECT_KIND_SERVICE_ACCOUNT.to_string(),
        api_group: String::new(),
        name: name.to_string(),
        namespace: namespace.to_string(),
    }
}

/// Generates tuples for every object in `objects` (each a `(type_name,
/// SourceObject)` pair) and stands up an authorizer against them.
async fn authorizer_for(objects: Vec<(&str, SourceObject<'_>)>) -> Authorizer<ChunkedStore<InMemoryBackend>> {
    let schema = rbac_schema();
    let mut tuples = Vec::new();
    for (type_name, source) in objects {
        let tr = schema.find(type_name).unwrap();
        tuples.extend(generate_tuples_for(tr, source).unwrap());
    }

    let model = build_model(&schema);
    let backend = InMemoryBackend::new();
    backend.write_model(&model).await.unwrap();
    let store = ChunkedStore::new(backend, schema);
    store.write_tuples(tuples, vec![]).await.unwrap();
    Authorizer::new(store)
}

// Scenario 1: a member of `system:masters`, bound through `cluster-admin`'s
// wildcard rule, can do anything cluster-wide.
#[tokio::test]
async fn masters_group_allowed_via_cluster_admin_wildcard() {
    let cluster_admin = ClusterRole {
        name: "cluster-admin".to_string(),
        labels: Default::default(),
        rules: vec![PolicyRule {
            api_groups: vec!["*".to_string()],
            resources: vec!["*".to_string()],
            verbs: vec!["*".to_string()],
            ..Default::default()
        }],
        aggregation_rule: None,
    };
    let binding = ClusterRoleBinding {
        name: "cluster-admin-binding".to_string(),
        role_ref: RoleRef {
            api_group: API_GROUP_RBAC.to_string(),
            kind: KIND_CLUSTER_ROLE.to_string(),
            name: "cluster-admin".to_string(),
        },
        subjects: vec![group_subject("system:masters")],
    };

    let authorizer = authorizer_for(vec![
        ("clusterrole", SourceObject::new(&cluster_admin)),
        ("clusterrolebinding", SourceObject::new(&binding)),
    ])
    .await;

    let mut r = req("foo");
    r.groups = vec!["system:masters".to_string()];
    r.verb = "get".to_string();
    r.resource = "pods".to_string();

    assert_eq!(authorizer.authorize(&r).await, Decision::Allow);
}

// Scenario 2: an unbound user gets no opinion, never a denial.
#[tokio::test]
async fn unbound_user_gets_no_opinion() {
    let authorizer = authorizer_for(vec![]).await;

    let mut r = req("baduser");
    r.verb = "get".to_string();
    r.resource = "pods".to_string();

    let decision = authorizer.authorize(&r).await;
    assert!(!decision.is_allow());
}

// Scenario 3: `system:kube-controller-manager` can create events but has no
// opinion on pods it was never granted.
#[tokio::test]
async fn controller_manager_scoped_to_its_own_rules() {
    let role = ClusterRole {
        name: "system:kube-controller-manager".to_string(),
        labels: Default::default(),
        rules: vec![PolicyRule {
            api_groups: vec![String::new()],
            resources: vec!["events".to_string()],
            verbs: vec!["create".to_string()],
            ..Default::default()
        }],
        aggregation_rule: None,
    };
    let binding = ClusterRoleBinding {
        name: "system:kube-controller-manager".to_string(),
        role_ref: RoleRef {
            api_group: API_GROUP_RBAC.to_string(),
            kind: KIND_CLUSTER_ROLE.to_string(),
            name: "system:kube-controller-manager".to_string(),
        },
        subjects: vec![user_subject("system:kube-controller-manager")],
    };

    let authorizer = authorizer_for(vec![
        ("clusterrole", SourceObject::new(&role)),
        ("clusterrolebinding", SourceObject::new(&binding)),
    ])
    .await;

    let mut allowed = req("system:kube-controller-manager");
    allowed.verb = "create".to_string();
    allowed.resource = "events".to_string();
    assert_eq!(authorizer.authorize(&allowed).await, Decision::Allow);

    let mut denied = req("system:kube-controller-manager");
    denied.verb = "get".to_string();
    denied.resource = "pods".to_string();
    assert!(!authorizer.authorize(&denied).await.is_allow());
}

// Scenario 4: the bootstrap-signer service account can update the named
// `cluster-info` configmap in `kube-public`, and only that name.
#[tokio::test]
async fn bootstrap_signer_scoped_to_named_configmap() {
    let role = Role {
        name: "bootstrap-signer".to_string(),
        namespace: "kube-public".to_string(),
        rules: vec![PolicyRule {
            api_groups: vec![String::new()],
            resources: vec!["configmaps".to_string()],
            resource_names: vec!["cluster-info".to_string()],
            verbs: vec!["update".to_string()],
            ..Default::default()
        }],
    };
    let binding = RoleBinding {
        name: "bootstrap-signer".to_string(),
        namespace: "kube-public".to_string(),
        role_ref: RoleRef {
            api_group: API_GROUP_RBAC.to_string(),
            kind: KIND_ROLE.to_string(),
            name: "bootstrap-signer".to_string(),
        },
        subjects: vec![service_account_subject("kube-system", "bootstrap-signer")],
    };

    let authorizer = authorizer_for(vec![
        ("role", SourceObject::new(&role)),
        ("rolebinding", SourceObject::new(&binding)),
    ])
    .await;

    let user = "system:serviceaccount:kube-system:bootstrap-signer";

    let mut allowed = req(user);
    allowed.verb = "update".to_string();
    allowed.resource = "configmaps".to_string();
    allowed.namespace = Some("kube-public".to_string());
    allowed.name = Some("cluster-info".to_string());
    assert_eq!(authorizer.authorize(&allowed).await, Decision::Allow);

    let mut denied = req(user);
    denied.verb = "update".to_string();
    denied.resource = "configmaps".to_string();
    denied.namespace = Some("kube-public".to_string());
    denied.name = Some("non-cluster-info".to_string());
    assert!(!authorizer.authorize(&denied).await.is_allow());
}

// Scenario 5: a user bound only to an aggregating `view` cluster role can
// exercise a verb granted by a constituent role it aggregates, through the
// `selects`/`carries_label` indirection.
#[tokio::test]
async fn aggregated_cluster_role_grants_constituent_rule() {
    let mut labels = std::collections::BTreeMap::new();
    labels.insert(
        "rbac.authorization.k8s.io/aggregate-to-view".to_string(),
        "true".to_string(),
    );
    let constituent = ClusterRole {
        name: "policy-view".to_string(),
        labels,
        rules: vec![PolicyRule {
            api_groups: vec!["policy".to_string()],
            resources: vec!["poddisruptionbudgets/status".to_string()],
            verbs: vec!["watch".to_string()],
            ..Default::default()
        }],
        aggregation_rule: None,
    };
    let aggregate = ClusterRole {
        name: "view".to_string(),
        labels: Default::default(),
        rules: vec![],
        aggregation_rule: Some(AggregationRule {
            cluster_role_selectors: vec![LabelSelector {
                match_expressions: vec![LabelSelectorRequirement {
                    key: "rbac.authorization.k8s.io/aggregate-to-view".to_string(),
                    operator: SelectorOperator::In,
                    values: vec!["true".to_string()],
                }],
                ..Default::default()
            }],
        }),
    };
    let binding = ClusterRoleBinding {
        name: "test-user-view-binding".to_string(),
        role_ref: RoleRef {
            api_group: API_GROUP_RBAC.to_string(),
            kind: KIND_CLUSTER_ROLE.to_string(),
            name: "view".to_string(),
        },
        subjects: vec![user_subject("test:user-view")],
    };

    let authorizer = authorizer_for(vec![
        ("clusterrole", SourceObject::new(&constituent)),
        ("clusterrole", SourceObject::new(&aggregate)),
        ("clusterrolebinding", SourceObject::new(&binding)),
    ])
    .await;

    let mut r = req("test:user-view");
    r.verb = "watch".to_string();
    r.api_group = "policy".to_string();
    r.resource = "poddisruptionbudgets".to_string();
    r.subresource = Some("status".to_string());

    assert_eq!(authorizer.authorize(&r).await, Decision::Allow);
}

// Scenario 6: any authenticated user (simulated here via the well-known
// `system:authenticated` group every authenticated request carries) can
// self-check its own access.
#[tokio::test]
async fn any_authenticated_user_can_self_check() {
    let role = ClusterRole {
        name: "system:basic-user".to_string(),
        labels: Default::default(),
        rules: vec![PolicyRule {
            api_groups: vec!["authorization.k8s.io".to_string()],
            resources: vec!["selfsubjectaccessreviews".to_string(), "selfsubjectrulesreviews".to_string()],
            verbs: vec!["create".to_string()],
            ..Default::default()
        }],
        aggregation_rule: None,
    };
    let binding = ClusterRoleBinding {
        name: "system:basic-user".to_string(),
        role_ref: RoleRef {
            api_group: API_GROUP_RBAC.to_string(),
            kind: KIND_CLUSTER_ROLE.to_string(),
            name: "system:basic-user".to_string(),
        },
        subjects: vec![group_subject("system:authenticated")],
    };

    let authorizer = authorizer_for(vec![
        ("clusterrole", SourceObject::new(&role)),
        ("clusterrolebinding", SourceObject::new(&binding)),
    ])
    .await;

    let mut r = req("any-authenticated-user");
    r.groups = vec!["system:authenticated".to_string()];
    r.verb = "create".to_string();
    r.api_group = "authorization.k8s.io".to_string();
    r.resource = "selfsubjectaccessreviews".to_string();

    assert_eq!(authorizer.authorize(&r).await, Decision::Allow);
}
