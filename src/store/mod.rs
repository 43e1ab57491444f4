pub mod queries;
pub mod tokens;

pub use queries::{Queries, Query, QueryKey};
pub use tokens::{ListedToken, TokenBook};
