//! Cryptographic building blocks: credential extraction, SHA-256, RSA signing.

pub mod credentials;
pub mod digest;
pub mod signature;

pub use credentials::Credentials;
pub use digest::sha256;
pub use signature::sign_digest;
