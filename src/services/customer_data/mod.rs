pub mod business;
pub mod catalog;
pub mod delegation;
pub mod hash;
pub mod insurance;
pub mod profile;
pub mod source;

pub use catalog::{AccessLevel, PermissionCategory, Role};
pub use insurance::Insurance;
pub use source::{CustomerDataSource, MockDataSource};
