//! Services behind the HTTP handlers.

mod resource;
mod validation;
mod welcome;
pub use resource::ResourceService;
pub use validation::RequestValidator;
pub use welcome::{WelcomePayload, WelcomeService};
