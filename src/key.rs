use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Shared secret callers present in the `x-secret-key` header.
///
/// Only a SHA-256 digest of the secret is retained, so comparisons run over
/// fixed-length values regardless of what the caller sends.
#[derive(Clone)]
pub struct SecretKey([u8; 32]);

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey").finish()
    }
}

impl SecretKey {
    /// Creates a new `SecretKey` from the given secret material.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lambda_image_xform::SecretKey;
    ///
    /// let key = SecretKey::new("s3cr3t");
    /// assert!(key.verify("s3cr3t"));
    /// assert!(!key.verify("guess"));
    /// ```
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self(digest(secret.as_ref()))
    }

    /// Returns `true` if `candidate` equals the secret, in constant time.
    pub fn verify(&self, candidate: &str) -> bool {
        self.0.ct_eq(&digest(candidate.as_bytes())).into()
    }
}

fn digest(value: &[u8]) -> [u8; 32] {
    let mut output = [0; 32];
    output.copy_from_slice(&Sha256::digest(value));
    output
}
