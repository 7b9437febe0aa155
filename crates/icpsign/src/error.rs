//! Error types for icpsign operations.
//!
//! This module defines the [`enum@Error`] enum covering every failure case of
//! the signing pipeline: credential extraction, DER encoding, cryptographic
//! primitives, façade input validation and configuration.
//!
//! # See Also
//!
//! - [`crate::Result`] - Convenience type alias using this error

use thiserror::Error;

/// Error type for icpsign operations.
///
/// All public functions in this crate return [`crate::Result<T>`], which uses this error type.
/// None of the variants is retryable: a failed call never yields partial CMS output.
///
/// # Examples
///
/// ```no_run
/// use icpsign::{CadesSigner, Error};
///
/// let p12 = std::fs::read("signer.p12")?;
/// let result = CadesSigner::new()
///     .pkcs12(p12)
///     .password("secret")
///     .sign_detached(b"contract body");
///
/// match result {
///     Ok(cms) => println!("{} bytes of CMS", cms.len()),
///     Err(Error::Credential(msg)) => eprintln!("Cannot use certificate: {msg}"),
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// The PKCS#12 bundle could not be used for signing.
    ///
    /// Covers a corrupt container, a wrong passphrase, a container without a
    /// private key, and a container where no certificate carries the key's
    /// public key.
    #[error("Credential error: {0}")]
    Credential(String),

    /// Malformed input to an ASN.1 primitive, or malformed DER being read.
    ///
    /// Indicates a programming error in the caller rather than bad user data.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Digest or RSA operation failed.
    ///
    /// Raised for unsupported key types or sizes and for failures reported by
    /// the underlying OpenSSL primitives.
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// The PAdES façade received content that is not binary.
    #[error("Invalid input type: {0}")]
    InputType(String),

    /// Invalid signer configuration.
    ///
    /// A required builder option is missing or a value is out of range.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation failed.
    ///
    /// Only raised when a PKCS#12 bundle is loaded from a filesystem path.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The catch-all credential failure for unreadable containers.
    ///
    /// OpenSSL reports a wrong passphrase and a corrupt container through the
    /// same MAC/decoding failure, so both collapse into one message.
    pub(crate) fn invalid_pkcs12() -> Self {
        Error::Credential("invalid P12 or passphrase".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_error_message() {
        let err = Error::invalid_pkcs12();
        assert_eq!(err.to_string(), "Credential error: invalid P12 or passphrase");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.p12");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("missing.p12"));
    }
}
