use anyhow::{Result, anyhow};
use argon2::{Argon2, PasswordHash, PasswordVerifier};

/// Hashes a password into an argon2id PHC string. Accounts are provisioned outside this
/// service, so only tests need to produce hashes.
#[cfg(test)]
pub fn hash_password(password: &str) -> Result<String> {
    use argon2::{PasswordHasher, password_hash::SaltString};

    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Password hashing error: {}", e))?
        .to_string();
    Ok(password_hash)
}

/// `Ok(false)` on a mismatch. A stored hash that cannot be parsed is an error, not a
/// failed sign-in.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow!("Stored password hash is invalid: {}", e))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
