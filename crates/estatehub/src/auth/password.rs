use rand::distr::Alphanumeric;
use rand::Rng;

pub const DEFAULT_COST: u32 = 10;
const TEMPORARY_PASSWORD_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("password worker failed: {0}")]
    Worker(String),
}

fn is_bcrypt_hash(stored: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"]
        .iter()
        .any(|prefix| stored.starts_with(prefix))
}

pub fn hash_blocking(plain: &str, cost: u32) -> Result<String, PasswordError> {
    Ok(bcrypt::hash(plain, cost)?)
}

/// Verifies against a bcrypt hash, or compares verbatim when the stored value is not a
/// hash (admin passwords may be configured in plain text).
pub fn verify_blocking(plain: &str, stored: &str) -> Result<bool, PasswordError> {
    if is_bcrypt_hash(stored) {
        Ok(bcrypt::verify(plain, stored)?)
    } else {
        Ok(plain == stored)
    }
}

pub async fn hash(plain: String, cost: u32) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_blocking(&plain, cost))
        .await
        .map_err(|err| PasswordError::Worker(err.to_string()))?
}

pub async fn verify(plain: String, stored: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_blocking(&plain, &stored))
        .await
        .map_err(|err| PasswordError::Worker(err.to_string()))?
}

pub fn generate_temporary_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TEMPORARY_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcrypt_round_trip_and_plain_fallback() {
        let hashed = hash_blocking("s3cret-pass", 4).expect("hash");
        assert!(hashed.starts_with("$2"));
        assert!(verify_blocking("s3cret-pass", &hashed).expect("verify"));
        assert!(!verify_blocking("wrong", &hashed).expect("verify"));

        assert!(verify_blocking("plain-admin", "plain-admin").expect("plain"));
        assert!(!verify_blocking("plain-admin", "other").expect("plain"));
    }

    #[test]
    fn temporary_passwords_are_alphanumeric() {
        let first = generate_temporary_password();
        let second = generate_temporary_password();
        assert_eq!(first.len(), TEMPORARY_PASSWORD_LEN);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, second);
    }
}
