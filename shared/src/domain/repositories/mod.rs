pub mod form_repository;
pub mod goods_code_repository;
pub mod instance_repository;
pub mod node_store;
pub mod pre_workflow_repository;
pub mod principal_context_repository;
pub mod template_repository;

/// The transactional envelope every engine mutation runs inside.
pub type PgTx<'a> = sqlx::Transaction<'a, sqlx::Postgres>;

pub use form_repository::FormRepository;
pub use goods_code_repository::GoodsCodeRepository;
pub use instance_repository::InstanceRepository;
pub use node_store::NodeStore;
pub use pre_workflow_repository::PreWorkflowRepository;
pub use principal_context_repository::PrincipalContextRepository;
pub use template_repository::TemplateRepository;
