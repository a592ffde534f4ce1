//! The query planner / authorizer: turns a platform access request into one
//! or two relationship-graph checks, synthesizing whatever contextual
//! tuples are needed to make wildcard, namespace, aggregation, and
//! instance-forwarding semantics compile down to a single check.

use rebac_graph::{Node, Subject, Tuple, TupleStore};
use rebac_rbac::{generic, ids, verbs};

/// A platform authorization request.
#[derive(Debug, Clone)]
pub struct AccessRequest {
    pub user: String,
    pub groups: Vec<String>,
    pub verb: String,
    pub api_group: String,
    pub resource: String,
    pub subresource: Option<String>,
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub is_resource_request: bool,
    /// Only meaningful when `is_resource_request` is false.
    pub non_resource_path: Option<String>,
}

impl AccessRequest {
    fn full_resource(&self) -> String {
        match &self.subresource {
            Some(sub) => format!("{}/{}", self.resource, sub),
            None => self.resource.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// "This authorizer abstains, let the next one decide." Never `Deny`:
    /// the authorizer has no representation for an explicit denial.
    NoOpinion { reason: String },
}

impl Decision {
    fn no_opinion(reason: impl Into<String>) -> Self {
        Decision::NoOpinion {
            reason: reason.into(),
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

pub struct Authorizer<S: TupleStore> {
    store: S,
}

impl<S: TupleStore> Authorizer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Verb-gates the request by scope. Unsupported combinations return
    /// `None` with no error — the caller returns no opinion immediately.
    fn gate_verb(req: &AccessRequest) -> bool {
        if !req.is_resource_request {
            return verbs::NON_RESOURCE_RELATIONS.contains(&req.verb.as_str());
        }
        match &req.name {
            Some(name) if !name.is_empty() => verbs::INSTANCE_RELATIONS.contains(&req.verb.as_str()),
            _ => verbs::collection_relations().contains(&req.verb.as_str()),
        }
    }

    fn user_node_and_contextuals(req: &AccessRequest) -> (Node, Vec<Tuple>) {
        let user = ids::user_node(&req.user);
        let contextuals = req
            .groups
            .iter()
            .map(|g| {
                Tuple::new(
                    Subject::User(user.clone()),
                    ids::relations::MEMBERS,
                    ids::group_node(g),
                )
            })
            .collect();
        (user, contextuals)
    }

    /// Runs the primary check, returning `Ok(true/false)` or a transport
    /// error string to log.
    async fn check(&self, tuple: Tuple, contextual: &[Tuple]) -> Result<bool, String> {
        self.store
            .check_one(&tuple, contextual)
            .await
            .map_err(|e| e.to_string())
    }

    pub async fn authorize(&self, req: &AccessRequest) -> Decision {
        if !Self::gate_verb(req) {
            return Decision::no_opinion("verb not supported at this scope");
        }
        if req.user.is_empty() {
            return Decision::no_opinion("no user name on request");
        }

        let (user_node, mut contextual) = Self::user_node_and_contextuals(req);

        if !req.is_resource_request {
            let path = req.non_resource_path.clone().unwrap_or_default();
            let target = ids::non_resource_urls_node(&path);
            let tuple = Tuple::new(Subject::User(user_node), req.verb.clone(), target);
            return self.run_primary(tuple, &contextual).await;
        }

        let full_resource = req.full_resource();
        let collection = ids::resource_node(&req.api_group, &full_resource);

        let mut wildcard_targets = vec![
            ids::resource_node("*", "*"),
            ids::resource_node(&req.api_group, "*"),
            ids::resource_node("*", &full_resource),
        ];
        if let Some(sub) = &req.subresource {
            wildcard_targets.push(ids::resource_node("*", &format!("*/{sub}")));
            wildcard_targets.push(ids::resource_node(&req.api_group, &format!("*/{sub}")));
        }
        for wt in wildcard_targets {
            // `(wt, wildcardmatch, collection)`: the wildcard node is the
            // subject so `TupleToUserset(wildcardmatch, V)` on the
            // collection's own relation can pivot onto it and re-enter
            // `resource#V` at the wildcard node.
            contextual.push(Tuple::new(
                Subject::User(wt),
                ids::relations::WILDCARD_MATCH,
                collection.clone(),
            ));
        }

        if let Some(ns) = &req.namespace {
            if !ns.is_empty() {
                contextual.push(Tuple::new(
                    Subject::User(user_node.clone()),
                    ids::relations::OPERATES_IN,
                    ids::namespace_node(ns),
                ));
            }
        }

        let check_target = match &req.name {
            Some(name) if !name.is_empty() => {
                let instance = ids::resource_instance_node(&req.api_group, &full_resource, name);
                contextual.push(Tuple::new(
                    Subject::User(collection.clone()),
                    ids::relations::RESOURCE_MATCH,
                    instance.clone(),
                ));
                instance
            }
            _ => collection,
        };

        let primary_tuple = Tuple::new(Subject::User(user_node.clone()), req.verb.clone(), check_target);
        let primary = self.run_primary(primary_tuple, &contextual).await;
        if primary.is_allow() {
            return primary;
        }

        if let Some(name) = req.name.as_deref().filter(|n| !n.is_empty()) {
            return self
                .run_fallback(req, &user_node, name, primary)
                .await;
        }

        primary
    }

    async fn run_primary(&self, tuple: Tuple, contextual: &[Tuple]) -> Decision {
        match self.check(tuple, contextual).await {
            Ok(true) => Decision::Allow,
            Ok(false) => Decision::no_opinion("relationship store returned no grant"),
            Err(e) => {
                tracing::error!(error = %e, "primary check failed");
                Decision::no_opinion("authorization check failed")
            }
        }
    }

    async fn run_fallback(
        &self,
        req: &AccessRequest,
        user_node: &Node,
        name: &str,
        primary: Decision,
    ) -> Decision {
        let Some(type_name) = generic::type_name_for_gvr(&req.api_group, &req.resource) else {
            return primary;
        };
        let namespace = req.namespace.clone().unwrap_or_default();
        let target = generic::generic_node(type_name, &namespace, name);
        let tuple = Tuple::new(Subject::User(user_node.clone()), req.verb.clone(), target);

        match self.check(tuple, &[]).await {
            Ok(true) => Decision::Allow,
            Ok(false) => primary,
            Err(e) => {
                tracing::error!(error = %e, "fallback check failed");
                match primary {
                    Decision::NoOpinion { reason } => Decision::no_opinion(format!("{reason}; fallback check failed")),
                    allow => allow,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebac_graph::build_model;
    use rebac_rbac::rbac_schema;
    use rebac_store::memory::InMemoryBackend;
    use rebac_store::ChunkedStore;

    fn req(user: &str, verb: &str, resource: &str) -> AccessRequest {
        AccessRequest {
            user: user.to_string(),
            groups: vec![],
            verb: verb.to_string(),
            api_group: String::new(),
            resource: resource.to_string(),
            subresource: None,
            name: None,
            namespace: None,
            is_resource_request: true,
            non_resource_path: None,
        }
    }

    async fn authorizer_with_tuples(tuples: Vec<Tuple>) -> Authorizer<ChunkedStore<InMemoryBackend>> {
        let schema = rbac_schema();
        let backend = InMemoryBackend::new();
        let model = build_model(&schema);
        backend.write_model(&model).await.unwrap();
        let store = ChunkedStore::new(backend, schema);
        store.write_tuples(tuples, vec![]).await.unwrap();
        Authorizer::new(store)
    }

    #[tokio::test]
    async fn empty_user_name_is_no_opinion() {
        let authorizer = authorizer_with_tuples(vec![]).await;
        let mut r = req("", "get", "pods");
        r.user = String::new();
        let decision = authorizer.authorize(&r).await;
        assert_eq!(decision, Decision::no_opinion("no user name on request"));
    }

    #[tokio::test]
    async fn unsupported_verb_is_no_opinion() {
        let authorizer = authorizer_with_tuples(vec![]).await;
        let r = req("alice", "bogus", "pods");
        let decision = authorizer.authorize(&r).await;
        assert!(!decision.is_allow());
    }

    #[tokio::test]
    async fn direct_grant_allows() {
        let user = ids::user_node("foo");
        let tuple = Tuple::new(Subject::User(user), "get", ids::resource_node("", "pods"));
        let authorizer = authorizer_with_tuples(vec![tuple]).await;
        let r = req("foo", "get", "pods");
        let decision = authorizer.authorize(&r).await;
        assert_eq!(decision, Decision::Allow);
    }

    #[tokio::test]
    async fn no_grant_is_no_opinion_never_deny() {
        let authorizer = authorizer_with_tuples(vec![]).await;
        let r = req("baduser", "get", "pods");
        let decision = authorizer.authorize(&r).await;
        assert!(!decision.is_allow());
    }
}
