use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use rebac_authorizer::{AccessRequest, Decision};

use crate::AppState;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAttributes {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub subresource: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub verb: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NonResourceAttributes {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub verb: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAccessReviewSpec {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub resource_attributes: Option<ResourceAttributes>,
    #[serde(default)]
    pub non_resource_attributes: Option<NonResourceAttributes>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAccessReviewStatus {
    #[serde(default)]
    pub allowed: bool,
    #[serde(default)]
    pub denied: bool,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub evaluation_error: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SubjectAccessReview {
    #[serde(default, rename = "apiVersion")]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    pub spec: SubjectAccessReviewSpec,
    #[serde(default)]
    pub status: SubjectAccessReviewStatus,
}

fn denied(review: &mut SubjectAccessReview, reason: impl Into<String>) {
    review.status = SubjectAccessReviewStatus {
        allowed: false,
        denied: true,
        reason: reason.into(),
        evaluation_error: String::new(),
    };
}

fn no_opinion(review: &mut SubjectAccessReview, reason: impl Into<String>) {
    review.status = SubjectAccessReviewStatus {
        allowed: false,
        denied: false,
        reason: reason.into(),
        evaluation_error: String::new(),
    };
}

fn allowed(review: &mut SubjectAccessReview) {
    review.status = SubjectAccessReviewStatus {
        allowed: true,
        denied: false,
        reason: String::new(),
        evaluation_error: String::new(),
    };
}

pub async fn authorize(
    State(state): State<Arc<AppState>>,
    Json(mut review): Json<SubjectAccessReview>,
) -> Json<SubjectAccessReview> {
    let spec = &review.spec;

    if spec.resource_attributes.is_some() && spec.non_resource_attributes.is_some() {
        let mut out = review;
        denied(&mut out, "cannot specify both resource and non-resource attributes");
        return Json(out);
    }

    let request = match (&spec.resource_attributes, &spec.non_resource_attributes) {
        (Some(attrs), None) => AccessRequest {
            user: spec.user.clone(),
            groups: spec.groups.clone(),
            verb: attrs.verb.clone(),
            api_group: attrs.group.clone(),
            resource: attrs.resource.clone(),
            subresource: if attrs.subresource.is_empty() {
                None
            } else {
                Some(attrs.subresource.clone())
            },
            name: if attrs.name.is_empty() {
                None
            } else {
                Some(attrs.name.clone())
            },
            namespace: if attrs.namespace.is_empty() {
                None
            } else {
                Some(attrs.namespace.clone())
            },
            is_resource_request: true,
            non_resource_path: None,
        },
        (None, Some(attrs)) => AccessRequest {
            user: spec.user.clone(),
            groups: spec.groups.clone(),
            verb: attrs.verb.clone(),
            api_group: String::new(),
            resource: String::new(),
            subresource: None,
            name: None,
            namespace: None,
            is_resource_request: false,
            non_resource_path: Some(attrs.path.clone()),
        },
        (None, None) => {
            let mut out = review;
            no_opinion(&mut out, "neither resourceAttributes nor nonResourceAttributes set");
            return Json(out);
        }
        _ => unreachable!(),
    };

    let decision = state.authorizer.authorize(&request).await;
    match decision {
        Decision::Allow => allowed(&mut review),
        Decision::NoOpinion { reason } => no_opinion(&mut review, reason),
    }
    Json(review)
}
