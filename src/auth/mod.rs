//! User accounts, password hashing, and session tokens.
//!
//! The auth gate resolves a caller's identity from a bearer token before
//! any mutation touches the store. Tokens are opaque random values held in
//! a server-side session table; nothing client-side is trusted.
//!
//! Passwords are hashed with Argon2id and stored as PHC strings.

use crate::error::{Result, VeriGeekError};
use crate::forum::types::{current_timestamp_millis, UserId};
use argon2::password_hash::{rand_core::OsRng, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of random bytes in a session token.
const TOKEN_BYTES: usize = 32;

/// Privilege level of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular member: can create questions, comment, like.
    Member,
    /// Elevated role: can additionally delete any question.
    Admin,
}

/// An Argon2id password hash in PHC string format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hashes a plaintext password with a fresh random salt.
    pub fn hash(password: &str) -> Result<Self> {
        if password.is_empty() {
            return Err(VeriGeekError::password("Password cannot be empty"));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| VeriGeekError::password(format!("Failed to hash password: {}", e)))?;

        Ok(Self(hash.to_string()))
    }

    /// Verifies a plaintext password against this hash.
    pub fn verify(&self, password: &str) -> bool {
        match argon2::password_hash::PasswordHash::new(&self.0) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// A registered user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique account identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email, unique per account.
    pub email: String,
    /// Argon2id password hash.
    pub password: PasswordHash,
    /// Privilege level.
    pub role: Role,
    /// Registration timestamp in Unix milliseconds.
    pub created_at: u64,
}

impl User {
    /// Creates a new account with a hashed password.
    pub fn new(name: String, email: String, password: &str, role: Role) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(VeriGeekError::validation("User name is required"));
        }
        if email.trim().is_empty() || !email.contains('@') {
            return Err(VeriGeekError::validation("A valid email is required"));
        }

        Ok(Self {
            id: UserId::generate(),
            name,
            email: email.trim().to_lowercase(),
            password: PasswordHash::hash(password)?,
            role,
            created_at: current_timestamp_millis(),
        })
    }

    /// Returns true if this user holds the elevated role.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// An opaque bearer token identifying a logged-in session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generates a cryptographically random session token.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Returns the token's wire representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let hash = PasswordHash::hash("correct horse battery staple").unwrap();
        assert!(hash.verify("correct horse battery staple"));
        assert!(!hash.verify("wrong password"));
    }

    #[test]
    fn test_empty_password_rejected() {
        assert!(PasswordHash::hash("").is_err());
    }

    #[test]
    fn test_user_validation() {
        assert!(User::new("".to_string(), "a@b.c".to_string(), "pw", Role::Member).is_err());
        assert!(User::new("Alice".to_string(), "not-an-email".to_string(), "pw", Role::Member)
            .is_err());

        let user = User::new(
            "Alice".to_string(),
            "Alice@Example.COM".to_string(),
            "pw",
            Role::Member,
        )
        .unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert!(!user.is_admin());
    }

    #[test]
    fn test_session_tokens_are_unique() {
        let a = SessionToken::generate();
        let b = SessionToken::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), TOKEN_BYTES * 2);
    }
}
