//! Authentication primitives for the dashboard API.
//!
//! This module provides:
//! - `hash_password` / `verify_password`: argon2id password hashing
//! - `TokenService`: signed bearer tokens with a fixed lifetime
//!
//! Tokens expire after 24 hours unless configured otherwise.

pub mod credentials;
pub mod token;

use thiserror::Error;

pub use credentials::{hash_password, verify_password};
pub use token::{Claims, TokenService, DEFAULT_TOKEN_TTL_HOURS};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token signing failed: {0}")]
    Signing(String),
}
