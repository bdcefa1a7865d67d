//! Token secrets, derived headers, and issued token sets.

pub mod secret;
pub mod set;
