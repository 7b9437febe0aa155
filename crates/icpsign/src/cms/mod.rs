//! Detached CMS `SignedData` construction shared by the CAdES and PAdES façades.

pub mod attributes;
pub mod signed_data;

pub use attributes::{Attribute, SignedAttributes};
pub use signed_data::{content_info, signer_info, IssuerSerial};

use crate::config::SignerConfig;
use crate::crypto::{sha256, sign_digest, Credentials};
use crate::Result;

/// Sign `content` and return the DER `ContentInfo`.
///
/// Pipeline: digest the content, build the signed attributes around that
/// digest, digest the DER of the attribute SET, RSA-sign that second digest,
/// then assemble the CMS tree. Nothing is returned unless every step succeeds.
pub fn sign_detached(
    credentials: &Credentials,
    content: &[u8],
    config: &SignerConfig,
) -> Result<Vec<u8>> {
    let content_digest = sha256(content);
    let signed_attributes =
        SignedAttributes::build(&content_digest, &credentials.certificate, config)?;

    let attributes_digest = sha256(&signed_attributes.to_der_set());
    let signature = sign_digest(credentials.private_key(), &attributes_digest)?;

    let certificates = if config.embed_chain {
        credentials.chain.as_slice()
    } else {
        std::slice::from_ref(&credentials.certificate)
    };

    let cms = content_info(
        &credentials.certificate,
        certificates,
        &signed_attributes,
        &signature,
    )?;

    log::info!(
        "Built {} signature over {} bytes ({} bytes of CMS, {} certificates)",
        config.profile,
        content.len(),
        cms.len(),
        certificates.len()
    );
    Ok(cms)
}
