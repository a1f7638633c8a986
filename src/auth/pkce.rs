//! PKCE (Proof Key for Code Exchange) derivation and validation — C1.
//!
//! Modeled as a sum type rather than a nullable string per the spec's design
//! notes: `None` short-circuits validation, so the presence/absence of a
//! verifier at exchange time is a type-level precondition instead of a
//! runtime string check. Grounded in the teacher's `CodeChallengeMethod`
//! (`auth/traits.rs`), extended with the `Plain` and `None` variants the
//! spec requires but the teacher didn't need.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeChallengeMethod {
    None,
    Plain,
    S256,
}

impl CodeChallengeMethod {
    /// Parses the wire value of `code_challenge_method`. Case-sensitive per
    /// spec.md §4.1: only the literal strings "S256" and "plain" are
    /// recognized.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "S256" => Some(Self::S256),
            "plain" => Some(Self::Plain),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PkceError {
    #[error("code_verifier does not match code_challenge")]
    Mismatch,
    #[error("unsupported code_challenge_method")]
    UnsupportedMethod,
    #[error("code_verifier required but not presented")]
    MissingVerifier,
}

/// `derive(method, verifier) -> challenge`.
pub fn derive(method: CodeChallengeMethod, verifier: &str) -> Result<String, PkceError> {
    match method {
        CodeChallengeMethod::S256 => {
            let mut hasher = Sha256::new();
            hasher.update(verifier.as_bytes());
            Ok(URL_SAFE_NO_PAD.encode(hasher.finalize()))
        }
        CodeChallengeMethod::Plain => Ok(verifier.to_string()),
        CodeChallengeMethod::None => Err(PkceError::UnsupportedMethod),
    }
}

/// `validate(storedChallenge, method, presentedVerifier)`.
///
/// If `stored_challenge` is empty, PKCE was not used at authorization time
/// and validation is a no-op success. Comparison is constant-time.
pub fn validate(
    stored_challenge: &str,
    method: CodeChallengeMethod,
    presented_verifier: Option<&str>,
) -> Result<(), PkceError> {
    if stored_challenge.is_empty() {
        return Ok(());
    }

    let Some(verifier) = presented_verifier else {
        return Err(PkceError::MissingVerifier);
    };

    let derived = derive(method, verifier).map_err(|_| PkceError::UnsupportedMethod)?;

    if derived.as_bytes().ct_eq(stored_challenge.as_bytes()).into() {
        Ok(())
    } else {
        Err(PkceError::Mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s256_round_trip_succeeds_for_matching_verifier() {
        let verifier = "verifier0123456789abcdefghijklmnopqrstuvwxyz0123";
        let challenge = derive(CodeChallengeMethod::S256, verifier).unwrap();
        assert!(validate(&challenge, CodeChallengeMethod::S256, Some(verifier)).is_ok());
    }

    #[test]
    fn s256_rejects_wrong_verifier() {
        let verifier = "verifier0123456789abcdefghijklmnopqrstuvwxyz0123";
        let challenge = derive(CodeChallengeMethod::S256, verifier).unwrap();
        let err = validate(&challenge, CodeChallengeMethod::S256, Some("wrong")).unwrap_err();
        assert_eq!(err, PkceError::Mismatch);
    }

    #[test]
    fn plain_method_uses_verifier_as_challenge() {
        let challenge = derive(CodeChallengeMethod::Plain, "abc").unwrap();
        assert_eq!(challenge, "abc");
        assert!(validate(&challenge, CodeChallengeMethod::Plain, Some("abc")).is_ok());
    }

    #[test]
    fn empty_stored_challenge_skips_validation() {
        assert!(validate("", CodeChallengeMethod::S256, None).is_ok());
    }

    #[test]
    fn missing_verifier_is_a_distinct_error() {
        let err = validate("some-challenge", CodeChallengeMethod::S256, None).unwrap_err();
        assert_eq!(err, PkceError::MissingVerifier);
    }
}
