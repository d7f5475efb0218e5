//! Cryptographic utilities: JWT, password hashing, webhook signatures

pub mod jwt;
pub mod password;
pub mod webhook;

pub use jwt::{create_token, verify_token, JwtConfig, TokenClaims};
pub use password::{hash_password, verify_password};
pub use webhook::{sign_payload, verify_signature};
