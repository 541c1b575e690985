//! Credential check for the single administrator.
//!
//! The submitted password is verified against the argon2 PHC hash in
//! `ADMIN_PASSWORD_HASH`. There is no plaintext comparison path.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use folio_core::Email;
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::AdminConfig;

/// Errors that can occur during authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Identity or password did not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// One half of the admin credentials is not configured. The detail is
    /// for server logs only.
    #[error("admin credentials not configured: {0}")]
    Misconfigured(&'static str),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

/// Checks submitted credentials against the configured administrator.
#[derive(Debug, Clone)]
pub struct AuthService {
    admin: AdminConfig,
}

impl AuthService {
    /// Create a service for the configured administrator.
    #[must_use]
    pub const fn new(admin: AdminConfig) -> Self {
        Self { admin }
    }

    /// Whether both halves of the admin credentials are configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.admin.email.is_some() && self.admin.password_hash.is_some()
    }

    /// Verify `identity` and `secret`, returning the admin identity on success.
    ///
    /// The password hash is verified even when the identity does not match,
    /// so both failure cases take the same time.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Misconfigured` if either credential is missing and
    /// `AuthError::InvalidCredentials` on any mismatch.
    pub fn authenticate(&self, identity: &str, secret: &str) -> Result<Email, AuthError> {
        let email = self.admin.email.as_ref().ok_or_else(|| {
            tracing::error!("ADMIN_EMAIL is not configured");
            AuthError::Misconfigured("ADMIN_EMAIL")
        })?;
        let hash = self.admin.password_hash.as_ref().ok_or_else(|| {
            tracing::error!("ADMIN_PASSWORD_HASH is not configured");
            AuthError::Misconfigured("ADMIN_PASSWORD_HASH")
        })?;

        let password_ok = verify_password(secret, hash.expose_secret()).is_ok();
        let identity_ok = email.matches(identity);

        if password_ok && identity_ok {
            tracing::info!(admin = %email.masked(), "admin credentials accepted");
            Ok(email.clone())
        } else {
            tracing::warn!("admin login rejected");
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a PHC hash string.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the hash cannot be parsed or
/// the password does not match.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn configured(password: &str) -> AuthService {
        AuthService::new(AdminConfig {
            email: Some(Email::parse("admin@example.com").unwrap()),
            password_hash: Some(SecretString::from(hash_password(password).unwrap())),
        })
    }

    #[test]
    fn test_correct_credentials() {
        let auth = configured("correct horse battery staple");
        let email = auth
            .authenticate("Admin@Example.com", "correct horse battery staple")
            .unwrap();
        assert_eq!(email.as_str(), "admin@example.com");
    }

    #[test]
    fn test_wrong_password_or_identity() {
        let auth = configured("correct horse battery staple");
        assert!(matches!(
            auth.authenticate("admin@example.com", "wrong"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.authenticate("other@example.com", "correct horse battery staple"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_missing_config_is_misconfigured() {
        let auth = AuthService::new(AdminConfig::default());
        assert!(!auth.is_configured());
        assert!(matches!(
            auth.authenticate("admin@example.com", "pw"),
            Err(AuthError::Misconfigured("ADMIN_EMAIL"))
        ));

        let auth = AuthService::new(AdminConfig {
            email: Some(Email::parse("admin@example.com").unwrap()),
            password_hash: None,
        });
        assert!(matches!(
            auth.authenticate("admin@example.com", "pw"),
            Err(AuthError::Misconfigured("ADMIN_PASSWORD_HASH"))
        ));
    }

    #[test]
    fn test_hash_round_trip() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("s3cret", &hash).is_ok());
        assert!(verify_password("nope", &hash).is_err());
        assert!(verify_password("s3cret", "not-a-hash").is_err());
    }
}
