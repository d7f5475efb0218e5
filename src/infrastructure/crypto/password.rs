//! bcrypt hashing for guest and staff account passwords

use bcrypt::{hash, verify, BcryptError, DEFAULT_COST};

/// Hash a plaintext password for storage on the user record.
pub fn hash_password(password: &str) -> Result<String, BcryptError> {
    hash(password, DEFAULT_COST)
}

/// Check a login attempt against the stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, BcryptError> {
    verify(password, hash)
}

// ── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_the_original_password_only() {
        let hashed = hash_password("s3cret-stay").unwrap();

        assert_ne!(hashed, "s3cret-stay");
        assert!(verify_password("s3cret-stay", &hashed).unwrap());
        assert!(!verify_password("wrong-guess", &hashed).unwrap());
    }
}
