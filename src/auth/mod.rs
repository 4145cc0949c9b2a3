//! Challenge/response authentication
//!
//! This module parses `WWW-Authenticate` challenges and derives the
//! `Authorization` values the authentication stage retries with.

pub mod challenge;
pub mod credentials;

pub use challenge::{Challenge, parse_challenge};
pub use credentials::{AuthorizationValues, derive_authorization_values, digest_with_cnonce};
