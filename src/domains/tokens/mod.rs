pub mod issuer;
pub mod models;
pub mod store;
pub mod validation;

// Re-exports para facilitar imports
pub use issuer::{generate_token, IssuedToken, TokenIssuer};
pub use models::*;
pub use store::{TokenGenerator, TokenStore};
pub use validation::{validate, ValidationOutcome};
