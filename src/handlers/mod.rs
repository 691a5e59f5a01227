//! HTTP handlers for resource CRUD and the welcome page.

pub mod resource;
pub mod welcome;
