//! Credential verification capability.
//!
//! The user registry only stores and compares opaque verifier strings; how
//! they are produced is delegated to a [`CredentialVerifier`].

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure inside the credential capability itself (not a mismatch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Hashing backend rejected the input or parameters.
    Hash(String),
    /// Stored verifier is not in a format this capability understands.
    MalformedVerifier(String),
}

impl Display for CredentialError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hash(message) => write!(f, "failed to hash credential: {message}"),
            Self::MalformedVerifier(message) => {
                write!(f, "stored credential verifier is malformed: {message}")
            }
        }
    }
}

impl Error for CredentialError {}

/// Produces and checks stored credential verifiers.
pub trait CredentialVerifier: Send + Sync {
    /// Derives the verifier string persisted for `credential`.
    fn hash_credential(&self, credential: &str) -> Result<String, CredentialError>;
    /// Returns whether `credential` matches the stored `verifier`.
    fn verify_credential(&self, credential: &str, verifier: &str)
        -> Result<bool, CredentialError>;
}

/// Argon2id verifier producing PHC-formatted strings.
///
/// Cost parameters only affect new hashes; verification reads them from the
/// stored string.
#[derive(Debug, Clone)]
pub struct Argon2Verifier {
    params: Params,
}

impl Argon2Verifier {
    /// Builds a verifier with explicit memory (KiB) and iteration costs.
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, CredentialError> {
        let params = Params::new(memory_kib, iterations, Params::DEFAULT_P_COST, None)
            .map_err(|err| CredentialError::Hash(err.to_string()))?;
        Ok(Self { params })
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Verifier {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl CredentialVerifier for Argon2Verifier {
    fn hash_credential(&self, credential: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher()
            .hash_password(credential.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| CredentialError::Hash(err.to_string()))
    }

    fn verify_credential(
        &self,
        credential: &str,
        verifier: &str,
    ) -> Result<bool, CredentialError> {
        let parsed = PasswordHash::new(verifier)
            .map_err(|err| CredentialError::MalformedVerifier(err.to_string()))?;
        Ok(self
            .hasher()
            .verify_password(credential.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::{Argon2Verifier, CredentialError, CredentialVerifier};

    fn cheap() -> Argon2Verifier {
        Argon2Verifier::new(8, 1).unwrap()
    }

    #[test]
    fn hash_then_verify_accepts_only_the_same_password() {
        let verifier = cheap();
        let stored = verifier.hash_credential("hunter2").unwrap();

        assert!(stored.starts_with("$argon2"));
        assert!(verifier.verify_credential("hunter2", &stored).unwrap());
        assert!(!verifier.verify_credential("hunter3", &stored).unwrap());
    }

    #[test]
    fn same_credential_gets_distinct_salts() {
        let verifier = cheap();
        let first = verifier.hash_credential("same").unwrap();
        let second = verifier.hash_credential("same").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_verifier_is_reported() {
        let err = cheap().verify_credential("x", "plaintext").unwrap_err();
        assert!(matches!(err, CredentialError::MalformedVerifier(_)));
    }

    #[test]
    fn hashes_from_other_cost_settings_still_verify() {
        let stored = Argon2Verifier::new(16, 2)
            .unwrap()
            .hash_credential("pw")
            .unwrap();
        assert!(cheap().verify_credential("pw", &stored).unwrap());
    }

    #[test]
    fn rejects_memory_cost_below_minimum() {
        assert!(Argon2Verifier::new(1, 1).is_err());
    }
}
