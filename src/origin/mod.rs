//! Outbound requests to origin servers.

pub mod fetch;
pub mod identity;

pub use fetch::{FetchPolicy, fetch_with_fallback, is_rejection};
pub use identity::{IdentityProfile, Resource};
