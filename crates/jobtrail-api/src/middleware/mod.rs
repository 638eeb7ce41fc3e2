pub mod identity;

pub use identity::{Identity, IdentityMiddleware};
