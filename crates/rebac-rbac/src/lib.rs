pub mod generic;
pub mod ids;
pub mod k8s;
pub mod schema;
pub mod verbs;

pub use schema::rbac_schema;
