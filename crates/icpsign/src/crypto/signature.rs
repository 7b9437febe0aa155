//! RSASSA-PKCS1-v1.5 signing over a precomputed SHA-256 digest.

use openssl::md::Md;
use openssl::pkey::{Id, PKeyRef, Private};
use openssl::pkey_ctx::PkeyCtx;
use openssl::rsa::Padding;

use super::digest::SHA256_LEN;
use crate::{Error, Result};

/// Sign a SHA-256 `digest` with an RSA private key.
///
/// The digest is wrapped in a SHA-256 `DigestInfo` and padded with PKCS#1
/// v1.5, so the output is deterministic for a given key and digest and is as
/// long as the key modulus.
///
/// # Errors
///
/// Returns [`Error::Crypto`] if the key is not RSA, the digest is not 32
/// bytes, or OpenSSL rejects the operation.
pub fn sign_digest(key: &PKeyRef<Private>, digest: &[u8]) -> Result<Vec<u8>> {
    if key.id() != Id::RSA {
        return Err(Error::Crypto(format!(
            "unsupported key type {:?}, only RSA keys can sign",
            key.id()
        )));
    }
    if digest.len() != SHA256_LEN {
        return Err(Error::Crypto(format!(
            "expected a {SHA256_LEN}-byte SHA-256 digest, got {} bytes",
            digest.len()
        )));
    }

    let crypto_err = |e: openssl::error::ErrorStack| Error::Crypto(format!("RSA signing failed: {e}"));

    let mut ctx = PkeyCtx::new(key).map_err(crypto_err)?;
    ctx.sign_init().map_err(crypto_err)?;
    ctx.set_rsa_padding(Padding::PKCS1).map_err(crypto_err)?;
    ctx.set_signature_md(Md::sha256()).map_err(crypto_err)?;

    let mut signature = Vec::with_capacity(key.size());
    ctx.sign_to_vec(digest, &mut signature).map_err(crypto_err)?;

    log::debug!("Produced {}-byte RSA signature", signature.len());
    Ok(signature)
}
