//! Auth-domain identifiers, token secrets, and token sets.

pub mod id;
pub mod token;

pub use id::*;
pub use token::{secret::*, set::*};
