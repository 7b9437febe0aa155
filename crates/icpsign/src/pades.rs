//! PAdES-BES signer for external PDF libraries.
//!
//! The PDF library owns the document: it reserves the `/Contents`
//! placeholder, computes the byte range and hands the covered bytes to an
//! [`ExternalSigner`]. [`PadesSigner`] answers with a detached CMS object
//! that the library embeds verbatim, usually through [`placeholder_hex`].

use std::sync::Arc;

use secrecy::SecretString;

use crate::cache::{self, CredentialCache};
use crate::cms;
use crate::config::{AttributeOrder, Profile, SignerConfig};
use crate::{Error, Result};

/// Content handed over by a PDF library for signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignContent<'a> {
    /// Raw bytes, normally the PDF byte range.
    Bytes(&'a [u8]),
    /// Text input. Signatures are only produced over bytes.
    Text(&'a str),
}

impl<'a> From<&'a [u8]> for SignContent<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        SignContent::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for SignContent<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        SignContent::Bytes(bytes)
    }
}

impl<'a> From<&'a str> for SignContent<'a> {
    fn from(text: &'a str) -> Self {
        SignContent::Text(text)
    }
}

/// Signer contract expected by PDF signing libraries.
pub trait ExternalSigner: Send + Sync {
    /// Return the DER signature object to embed in `/Contents`.
    fn sign(&self, content: SignContent<'_>) -> Result<Vec<u8>>;
}

/// PAdES-BES signer backed by a PKCS#12 container.
///
/// Output carries no `signingTime`, so signing the same bytes twice yields
/// identical CMS.
pub struct PadesSigner {
    pkcs12: Vec<u8>,
    password: SecretString,
    config: SignerConfig,
    cache: Option<Arc<CredentialCache>>,
}

impl PadesSigner {
    /// Create a signer over a DER PKCS#12 container and its passphrase.
    ///
    /// Credentials are extracted on every call unless a cache is attached.
    pub fn new(pkcs12: impl Into<Vec<u8>>, password: impl Into<String>) -> Self {
        Self {
            pkcs12: pkcs12.into(),
            password: SecretString::new(password.into()),
            config: SignerConfig::for_profile(Profile::Pades),
            cache: None,
        }
    }

    /// Require the container to be exactly one DER value (default: on).
    ///
    /// BER-framed containers (indefinite lengths), which some Java tools
    /// emit, are rejected in strict mode; pass `false` to hand them to
    /// OpenSSL unchecked.
    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    /// Order of the signed attributes (default: insertion order).
    pub fn attribute_order(mut self, order: AttributeOrder) -> Self {
        self.config.attribute_order = order;
        self
    }

    /// Embed the whole certificate chain (default) or only the signer.
    pub fn embed_chain(mut self, embed: bool) -> Self {
        self.config.embed_chain = embed;
        self
    }

    /// Share decoded credentials through `cache`.
    pub fn cache(mut self, cache: Arc<CredentialCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Effective signer options.
    pub fn config(&self) -> &SignerConfig {
        &self.config
    }

    /// Sign the PDF byte range.
    pub fn sign_bytes(&self, byte_range: &[u8]) -> Result<Vec<u8>> {
        let credentials = cache::resolve(
            &self.pkcs12,
            &self.password,
            self.config.strict,
            self.cache.as_deref(),
        )?;
        cms::sign_detached(&credentials, byte_range, &self.config)
    }
}

impl std::fmt::Debug for PadesSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PadesSigner")
            .field("pkcs12_len", &self.pkcs12.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ExternalSigner for PadesSigner {
    fn sign(&self, content: SignContent<'_>) -> Result<Vec<u8>> {
        match content {
            SignContent::Bytes(bytes) => self.sign_bytes(bytes),
            SignContent::Text(text) => {
                log::warn!("Refusing to sign {}-byte text input", text.len());
                Err(Error::InputType(
                    "PAdES signing expects the PDF byte range as bytes, got text".into(),
                ))
            }
        }
    }
}

/// Uppercase hex of `cms`, right-padded with `0` to fill a placeholder of
/// `placeholder_len` bytes (`2 * placeholder_len` hex digits).
///
/// Returns [`Error::Config`] when the signature does not fit.
pub fn placeholder_hex(cms: &[u8], placeholder_len: usize) -> Result<String> {
    if cms.len() > placeholder_len {
        return Err(Error::Config(format!(
            "signature of {} bytes does not fit a {}-byte placeholder",
            cms.len(),
            placeholder_len
        )));
    }
    let mut hex = hex::encode_upper(cms);
    hex.extend(std::iter::repeat('0').take(2 * placeholder_len - hex.len()));
    Ok(hex)
}
