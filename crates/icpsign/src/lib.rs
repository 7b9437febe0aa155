//! Detached CAdES-BES and PAdES-BES signatures for ICP-Brasil A1 certificates.
//!
//! CMS `SignedData` is assembled in hand-written DER; PKCS#12 parsing and
//! RSA are delegated to OpenSSL.

pub mod cache;
pub mod cades;
pub mod cms;
pub mod config;
pub mod crypto;
pub mod der;
pub mod error;
pub mod pades;

#[cfg(test)]
mod test_support;

pub use cache::CredentialCache;
pub use cades::CadesSigner;
pub use config::{AttributeOrder, Profile, SignerConfig};
pub use crypto::Credentials;
pub use error::Error;
pub use pades::{placeholder_hex, ExternalSigner, PadesSigner, SignContent};

pub type Result<T> = std::result::Result<T, Error>;
