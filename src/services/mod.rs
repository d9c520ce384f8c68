// Syncmarks services
// Services provide the stateless core: tree reconstruction, scoped queries, token verification.

pub mod auth_service;
pub mod query_service;
pub mod tree_builder;
