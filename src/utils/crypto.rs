use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;

pub fn hash_password(plain: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2.hash_password(plain.as_bytes(), &salt)?.to_string();
    Ok(password_hash)
}

pub fn verify_password(plain: &str, hashed: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hashed)?;
    let ok = Argon2::default()
        .verify_password(plain.as_bytes(), &parsed_hash)
        .is_ok();
    Ok(ok)
}

/// Checks a password against the `Password` cell. Rows written by this
/// service hold an argon2 PHC string; older rows hold plaintext.
pub fn check_stored_password(plain: &str, stored: &str) -> bool {
    if stored.starts_with("$argon2") {
        return verify_password(plain, stored).unwrap_or(false);
    }
    ConstantTimeEq::ct_eq(plain.as_bytes(), stored.as_bytes()).into()
}
