mod acl;
mod authentication;

pub use acl::{check_access, AclMiddlewareFactory, AclMiddlewareService};
pub use authentication::{bearer_token, AuthenticationMiddlewareFactory, AuthenticationMiddlewareService};
