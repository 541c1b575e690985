//! Admin password hashing.
//!
//! The server only ever stores the argon2 hash (`ADMIN_PASSWORD_HASH`).
//! These commands produce and check that hash.

use std::io::BufRead;

use folio_server::services::auth::{AuthError, hash_password, verify_password};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Errors that can occur while hashing or verifying.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Reading the password from stdin failed.
    #[error("Failed to read password: {0}")]
    Io(#[from] std::io::Error),

    /// No password was given.
    #[error("Password must not be empty")]
    Empty,

    /// Hashing failed.
    #[error("Failed to hash password")]
    Hash,

    /// The password does not match the hash.
    #[error("Password does not match")]
    Mismatch,
}

/// Print the hash of `password` (or of a line read from stdin).
pub fn hash(password: Option<String>) -> Result<(), PasswordError> {
    let password = resolve(password)?;
    let hash = hash_password(password.expose_secret()).map_err(|_| PasswordError::Hash)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{hash}");
    }
    Ok(())
}

/// Check `password` (or a line read from stdin) against `hash`.
pub fn verify(hash: &str, password: Option<String>) -> Result<(), PasswordError> {
    let password = resolve(password)?;
    match verify_password(password.expose_secret(), hash) {
        Ok(()) => {
            #[allow(clippy::print_stdout)]
            {
                println!("Password matches");
            }
            Ok(())
        }
        Err(AuthError::InvalidCredentials) => Err(PasswordError::Mismatch),
        Err(_) => Err(PasswordError::Hash),
    }
}

fn resolve(password: Option<String>) -> Result<SecretString, PasswordError> {
    let password = match password {
        Some(password) => password,
        None => read_line(std::io::stdin().lock())?,
    };
    if password.is_empty() {
        return Err(PasswordError::Empty);
    }
    Ok(SecretString::from(password))
}

/// Read one line, without its line ending.
fn read_line(mut input: impl BufRead) -> Result<String, std::io::Error> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}
