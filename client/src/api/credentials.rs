//! Account credentials sent with every request.

use std::fmt;

use md5::{Digest, Md5};

/// Email, password hash, and API key for one Limtel account.
///
/// The API never sees the plaintext password, only its MD5 hex digest.
/// `Debug` output redacts both secrets.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    email: String,
    password_hash: String,
    api_key: String,
}

impl Credentials {
    /// Create credentials from an already hashed password.
    pub fn new(
        email: impl Into<String>,
        password_hash: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
            api_key: api_key.into(),
        }
    }

    /// Create credentials from a plaintext password, hashing it the way the
    /// API expects.
    pub fn with_plain_password(
        email: impl Into<String>,
        password: &str,
        api_key: impl Into<String>,
    ) -> Self {
        Self::new(email, hash_password(password), api_key)
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Lowercase hex MD5 digest of `password`.
#[must_use]
pub fn hash_password(password: &str) -> String {
    format!("{:x}", Md5::digest(password.as_bytes()))
}
