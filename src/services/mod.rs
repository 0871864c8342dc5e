pub mod api_client;
pub mod auth;
pub mod consent;
pub mod customer_data;
pub mod profile;
pub mod session;
pub mod step_up;
