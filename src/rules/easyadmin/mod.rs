//! EasyAdmin controller and test conventions

mod action_route_params;
mod action_with_route;
mod admin_crud;
mod batch_action;
mod custom_action_coverage;
mod filter_coverage;
mod flash_type;
mod menu_provider;
mod required_field_validation;

pub use action_route_params::AdminActionRouteParametersRule;
pub use action_with_route::ForbidAdminActionWithRouteRule;
pub use admin_crud::RequireAdminCrudAttributeRule;
pub use batch_action::BatchActionTestRule;
pub use custom_action_coverage::CustomActionTestCoverageRule;
pub use filter_coverage::FilterTestCoverageRule;
pub use flash_type::AddFlashTypeRule;
pub use menu_provider::MenuProviderTestBaseRule;
pub use required_field_validation::RequiredFieldValidationTestRule;
