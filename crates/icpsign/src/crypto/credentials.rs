//! Signing credentials extracted from PKCS#12 containers.
//!
//! ICP-Brasil A1 certificates are distributed as password-protected PKCS#12
//! (`.p12`/`.pfx`) files holding one RSA private key, the subscriber
//! certificate and usually the issuing CA chain. This module opens such a
//! container and decides which certificate belongs to the key.
//!
//! # Examples
//!
//! ```no_run
//! use icpsign::Credentials;
//! use secrecy::SecretString;
//!
//! let p12_data = std::fs::read("certificate.p12")?;
//! let password = SecretString::new("password".to_string());
//! let credentials = Credentials::from_pkcs12(&p12_data, &password, true)?;
//!
//! println!("Signer: {:?}", credentials.subject_common_name());
//! # Ok::<(), icpsign::Error>(())
//! ```

use std::path::Path;

use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{HasPublic, Id, PKey, PKeyRef, Private};
use openssl::x509::{X509Ref, X509};
use secrecy::{ExposeSecret, SecretString};

use super::digest::{sha256, SHA256_LEN};
use crate::der::reader;
use crate::{Error, Result};

/// Private key, signer certificate and certificate chain for one signer.
///
/// # Security
///
/// The private key never leaves this struct except by reference to the
/// signature engine. The [`Debug`] output omits it. Avoid keeping
/// [`Credentials`] alive longer than the signing calls that need it unless a
/// [`CredentialCache`](crate::CredentialCache) owns it.
pub struct Credentials {
    /// Certificate whose RSA public key matches the private key.
    pub certificate: X509,

    /// Every certificate found in the container, the signer included.
    pub chain: Vec<X509>,

    private_key: PKey<Private>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("subject", &self.subject_common_name())
            .field("chain_len", &self.chain.len())
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Open a DER PKCS#12 container.
    ///
    /// With `strict` set, the input must be exactly one definite-length DER
    /// value; trailing bytes or BER framing are rejected before OpenSSL sees
    /// the data. Without it the bytes are handed to OpenSSL as-is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Credential`] if:
    /// - the container is malformed or the password is wrong
    ///   (`"invalid P12 or passphrase"`)
    /// - the container has no private key (`"no private key"`)
    /// - no certificate carries the key's public key (`"no matching certificate"`)
    ///
    /// Returns [`Error::Crypto`] if the private key is not RSA.
    pub fn from_pkcs12(der: &[u8], password: &SecretString, strict: bool) -> Result<Self> {
        if strict {
            check_framing(der)?;
        }

        let pkcs12 = Pkcs12::from_der(der).map_err(|e| {
            log::debug!("PKCS#12 decoding failed: {e}");
            Error::invalid_pkcs12()
        })?;

        let parsed = pkcs12.parse2(password.expose_secret()).map_err(|e| {
            log::debug!("PKCS#12 decryption failed: {e}");
            Error::invalid_pkcs12()
        })?;

        let private_key = parsed
            .pkey
            .ok_or_else(|| Error::Credential("no private key".into()))?;

        // OpenSSL already splits off the certificate it paired with the key;
        // it goes first, followed by the remaining bags in container order.
        let mut candidates = Vec::new();
        candidates.extend(parsed.cert);
        if let Some(ca) = parsed.ca {
            candidates.extend(ca);
        }

        Self::from_parts(private_key, candidates)
    }

    /// Read and open a PKCS#12 file.
    ///
    /// See [`Credentials::from_pkcs12`] for the error cases; I/O failures
    /// surface as [`Error::Io`].
    pub fn from_pkcs12_file(
        path: impl AsRef<Path>,
        password: &SecretString,
        strict: bool,
    ) -> Result<Self> {
        let der = std::fs::read(path.as_ref())?;
        Self::from_pkcs12(&der, password, strict)
    }

    /// Pair an RSA private key with the first certificate carrying its public key.
    ///
    /// All `certificates` are kept as the chain, in the order given.
    pub fn from_parts(private_key: PKey<Private>, certificates: Vec<X509>) -> Result<Self> {
        let (key_n, key_e) = rsa_public_components(&private_key)?.ok_or_else(|| {
            Error::Crypto(format!(
                "unsupported key type {:?}, only RSA keys are accepted",
                private_key.id()
            ))
        })?;

        let signer_index = certificates
            .iter()
            .position(|cert| certificate_matches(cert, &key_n, &key_e))
            .ok_or_else(|| Error::Credential("no matching certificate".into()))?;

        let certificate = certificates[signer_index].clone();
        let credentials = Self {
            certificate,
            chain: certificates,
            private_key,
        };

        log::debug!(
            "Selected signer certificate {:?} ({} of {} in chain)",
            credentials.subject_common_name(),
            signer_index + 1,
            credentials.chain.len()
        );

        Ok(credentials)
    }

    /// The signing key, lent to the signature engine.
    pub(crate) fn private_key(&self) -> &PKeyRef<Private> {
        &self.private_key
    }

    /// DER encoding of the signer certificate.
    pub fn certificate_der(&self) -> Result<Vec<u8>> {
        self.certificate
            .to_der()
            .map_err(|e| Error::Encoding(format!("Failed to encode certificate: {e}")))
    }

    /// SHA-256 over the signer certificate DER.
    pub fn fingerprint(&self) -> Result<[u8; SHA256_LEN]> {
        Ok(sha256(&self.certificate_der()?))
    }

    /// Common name of the signer certificate subject, if it has one.
    pub fn subject_common_name(&self) -> Option<String> {
        common_name(&self.certificate)
    }

    /// DER encoding of the signer certificate subject.
    pub(crate) fn subject_der(&self) -> Result<Vec<u8>> {
        self.certificate
            .subject_name()
            .to_der()
            .map_err(|e| Error::Encoding(format!("Failed to encode subject name: {e}")))
    }
}

/// Fail unless `der` is exactly one definite-length DER value.
pub(crate) fn check_framing(der: &[u8]) -> Result<()> {
    reader::parse_exact(der).map(|_| ()).map_err(|e| {
        log::debug!("Rejecting PKCS#12 framing in strict mode: {e}");
        Error::invalid_pkcs12()
    })
}

fn common_name(cert: &X509Ref) -> Option<String> {
    cert.subject_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .and_then(|entry| std::str::from_utf8(entry.data().as_slice()).ok())
        .map(str::to_owned)
}

/// Modulus and public exponent as big-endian magnitudes, or `None` for non-RSA keys.
fn rsa_public_components<T: HasPublic>(key: &PKeyRef<T>) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
    if key.id() != Id::RSA {
        return Ok(None);
    }
    let rsa = key
        .rsa()
        .map_err(|e| Error::Crypto(format!("Failed to read RSA key: {e}")))?;
    Ok(Some((rsa.n().to_vec(), rsa.e().to_vec())))
}

fn certificate_matches(cert: &X509Ref, key_n: &[u8], key_e: &[u8]) -> bool {
    let Ok(public_key) = cert.public_key() else {
        return false;
    };
    match rsa_public_components(&public_key) {
        Ok(Some((n, e))) => n == key_n && e == key_e,
        _ => false,
    }
}
