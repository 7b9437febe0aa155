//! CAdES-BES builder API
//!
//! Detached CAdES signatures over arbitrary content, configured with a
//! builder in the same way for one-off signing and for batch jobs.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use secrecy::SecretString;

use crate::cache::{self, CredentialCache};
use crate::cms;
use crate::config::{AttributeOrder, Profile, SignerConfig};
use crate::crypto::Credentials;
use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Pkcs12Source {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

/// Detached CAdES-BES signer with builder pattern API.
///
/// Credentials are extracted from the PKCS#12 container on every call unless
/// a [`CredentialCache`] is attached.
///
/// # Example
///
/// ```no_run
/// use icpsign::CadesSigner;
///
/// let p7s = CadesSigner::new()
///     .pkcs12_file("certificate.p12")
///     .password("secret")
///     .sign_detached(b"contract bytes")?;
/// # Ok::<(), icpsign::Error>(())
/// ```
#[derive(Clone)]
pub struct CadesSigner {
    pkcs12: Option<Pkcs12Source>,
    password: Option<SecretString>,
    config: SignerConfig,
    cache: Option<Arc<CredentialCache>>,
}

impl CadesSigner {
    /// Create a new CAdES signer builder.
    pub fn new() -> Self {
        Self {
            pkcs12: None,
            password: None,
            config: SignerConfig::for_profile(Profile::Cades),
            cache: None,
        }
    }

    /// Use an in-memory DER PKCS#12 container.
    pub fn pkcs12(mut self, der: impl Into<Vec<u8>>) -> Self {
        self.pkcs12 = Some(Pkcs12Source::Bytes(der.into()));
        self
    }

    /// Read the PKCS#12 container from a file at signing time.
    pub fn pkcs12_file(mut self, path: impl AsRef<Path>) -> Self {
        self.pkcs12 = Some(Pkcs12Source::Path(path.as_ref().to_path_buf()));
        self
    }

    /// Set the PKCS#12 passphrase.
    ///
    /// The password is stored securely and will be zeroized when dropped.
    /// Without one, the empty passphrase is used.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::new(password.into()));
        self
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

    /// Encode this `signingTime` instead of the current time.
    pub fn signing_time(mut self, time: DateTime<Utc>) -> Self {
        self.config.signing_time = Some(time);
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

    /// Validate the builder configuration.
    ///
    /// Returns [`Error::Config`] if no PKCS#12 source was given.
    pub fn validate(&self) -> Result<()> {
        self.source().map(|_| ())
    }

    /// Produce a detached CAdES-BES `ContentInfo` over `content`.
    pub fn sign_detached(&self, content: &[u8]) -> Result<Vec<u8>> {
        let credentials = self.load_credentials()?;
        cms::sign_detached(&credentials, content, &self.config)
    }

    /// Sign several independent contents in parallel.
    ///
    /// Credentials are extracted once and shared; all signatures carry the
    /// same `signingTime`. Results keep the input order. The first failure
    /// aborts the batch.
    pub fn sign_detached_batch<C>(&self, contents: &[C]) -> Result<Vec<Vec<u8>>>
    where
        C: AsRef<[u8]> + Sync,
    {
        let credentials = self.load_credentials()?;

        let mut config = self.config.clone();
        config.signing_time = config.resolve_signing_time();

        log::info!("Signing batch of {} contents", contents.len());
        contents
            .par_iter()
            .map(|content| cms::sign_detached(&credentials, content.as_ref(), &config))
            .collect()
    }

    fn source(&self) -> Result<&Pkcs12Source> {
        self.pkcs12.as_ref().ok_or_else(|| {
            Error::Config("Must specify a PKCS#12 container (bytes or file)".into())
        })
    }

    fn load_credentials(&self) -> Result<Arc<Credentials>> {
        let der: Cow<'_, [u8]> = match self.source()? {
            Pkcs12Source::Bytes(bytes) => Cow::Borrowed(bytes),
            Pkcs12Source::Path(path) => {
                log::debug!("Reading PKCS#12 from {}", path.display());
                Cow::Owned(std::fs::read(path)?)
            }
        };

        let empty;
        let password = match &self.password {
            Some(password) => password,
            None => {
                empty = SecretString::new(String::new());
                &empty
            }
        };

        cache::resolve(&der, password, self.config.strict, self.cache.as_deref())
    }
}

impl Default for CadesSigner {
    fn default() -> Self {
        Self::new()
    }
}
