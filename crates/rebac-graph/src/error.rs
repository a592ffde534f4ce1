use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("UserType required when UserName is set")]
    UserTypeRequiredForUserName,

    #[error("UserName required when UserSetRelation is set")]
    UserNameRequiredForUserSetRelation,

    #[error("ObjectType required when ObjectName is set")]
    ObjectTypeRequiredForObjectName,

    #[error("UserSetRelation cannot be set when UserName is the wildcard")]
    UserSetRelationExclusiveWithWildcardUserName,

    #[error("failed to derive node id: {0}")]
    IdDerivation(String),

    #[error("no type named '{0}' in the authorization schema")]
    UnknownType(String),

    #[error("more than one type named '{0}' in the authorization schema")]
    AmbiguousType(String),

    #[error("store transport error: {0}")]
    Transport(String),
}
