//! Extension contracts for attaching coordinator-issued headers to outbound requests.

pub mod request_authorizer;

pub use request_authorizer::*;
