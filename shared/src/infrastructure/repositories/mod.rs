pub mod form_repository_impl;
pub mod goods_code_repository_impl;
pub mod instance_repository_impl;
pub mod node_store_impl;
pub mod pre_workflow_repository_impl;
pub mod principal_context_repository_impl;
pub mod template_repository_impl;

pub use form_repository_impl::FormRepositoryImpl;
pub use goods_code_repository_impl::GoodsCodeRepositoryImpl;
pub use instance_repository_impl::InstanceRepositoryImpl;
pub use node_store_impl::NodeStoreImpl;
pub use pre_workflow_repository_impl::PreWorkflowRepositoryImpl;
pub use principal_context_repository_impl::PrincipalContextRepositoryImpl;
pub use template_repository_impl::TemplateRepositoryImpl;
