//! CliniCore authorization core - principal resolution, RBAC, and tenant isolation

pub mod domain;
pub mod infrastructure;
pub mod server;
