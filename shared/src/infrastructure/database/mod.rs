pub mod db_service;
pub mod repository_ext;

pub use db_service::{create_pool_with_options, DatabaseService};
pub use repository_ext::RepositoryErrorExt;
