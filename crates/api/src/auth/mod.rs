//! Owner authentication: token verification plus the [`AuthUser`] extractor.

pub mod jwt;

pub use crate::middleware::auth::AuthUser;
