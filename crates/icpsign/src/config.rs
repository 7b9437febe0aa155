//! Signature profile and signer options.

use chrono::{DateTime, Utc};

/// Which advanced-signature profile a CMS object is built for.
///
/// The two profiles share the whole pipeline and differ only in whether the
/// `signingTime` signed attribute is emitted: PAdES signers carry the signing
/// time in the PDF signature dictionary (`/M`) instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Profile {
    /// Detached CAdES-BES over arbitrary content; includes `signingTime`.
    #[default]
    Cades,
    /// PAdES-BES over a PDF byte range; omits `signingTime`.
    Pades,
}

impl Profile {
    /// Whether the `signingTime` attribute belongs in the signed attributes.
    pub fn includes_signing_time(self) -> bool {
        matches!(self, Profile::Cades)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Profile::Cades => "CAdES-BES",
            Profile::Pades => "PAdES-BES",
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order of the attributes inside the encoded `signedAttrs` SET.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttributeOrder {
    /// contentType, messageDigest, signingCertificateV2, signingTime.
    ///
    /// Not canonical DER, but what deployed signers have always produced.
    #[default]
    Insertion,
    /// Sorted by encoded bytes, as DER requires for SET OF.
    Canonical,
}

/// Options shared by the CAdES and PAdES façades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerConfig {
    /// Signature profile.
    pub profile: Profile,

    /// Require the PKCS#12 input to be exactly one DER value.
    pub strict: bool,

    /// Ordering of the signed attributes.
    pub attribute_order: AttributeOrder,

    /// Embed every certificate from the container, not only the signer's.
    pub embed_chain: bool,

    /// Fixed `signingTime` instead of the current clock.
    ///
    /// Ignored for [`Profile::Pades`].
    pub signing_time: Option<DateTime<Utc>>,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            strict: true,
            attribute_order: AttributeOrder::default(),
            embed_chain: true,
            signing_time: None,
        }
    }
}

impl SignerConfig {
    /// Defaults for the given profile.
    pub fn for_profile(profile: Profile) -> Self {
        Self {
            profile,
            ..Self::default()
        }
    }

    /// The `signingTime` value to encode, or `None` when the profile omits it.
    pub fn resolve_signing_time(&self) -> Option<DateTime<Utc>> {
        if !self.profile.includes_signing_time() {
            return None;
        }
        Some(self.signing_time.unwrap_or_else(Utc::now))
    }
}
