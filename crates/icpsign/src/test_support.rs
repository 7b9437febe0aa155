//! Key, certificate and PKCS#12 fixtures for unit tests.

use std::sync::OnceLock;

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::stack::Stack;
use openssl::x509::{X509NameBuilder, X509};

pub const PASSWORD: &str = "test1234";

/// Serial with the high bit set, so DER needs a 0x00 pad.
pub const HIGH_BIT_SERIAL: &str = "8F1E2D3C4B5A6978";

fn generate_rsa() -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap()
}

/// A shared RSA-2048 key; generation is slow, so it is created once.
pub fn rsa_key() -> PKey<Private> {
    static KEY: OnceLock<PKey<Private>> = OnceLock::new();
    KEY.get_or_init(generate_rsa).clone()
}

/// A second, different RSA-2048 key.
pub fn other_rsa_key() -> PKey<Private> {
    static KEY: OnceLock<PKey<Private>> = OnceLock::new();
    KEY.get_or_init(generate_rsa).clone()
}

/// A self-signed certificate for `key`.
pub fn self_signed(key: &PKey<Private>, common_name: &str, serial_hex: &str) -> X509 {
    let mut name_builder = X509NameBuilder::new().unwrap();
    name_builder.append_entry_by_text("C", "BR").unwrap();
    name_builder.append_entry_by_text("O", "ICP-Brasil").unwrap();
    name_builder.append_entry_by_text("CN", common_name).unwrap();
    let name = name_builder.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();

    let serial = BigNum::from_hex_str(serial_hex).unwrap();
    builder.set_serial_number(&serial.to_asn1_integer().unwrap()).unwrap();

    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(key).unwrap();

    let not_before = Asn1Time::days_from_now(0).unwrap();
    let not_after = Asn1Time::days_from_now(365).unwrap();
    builder.set_not_before(&not_before).unwrap();
    builder.set_not_after(&not_after).unwrap();

    builder.sign(key, MessageDigest::sha256()).unwrap();
    builder.build()
}

/// DER PKCS#12 with the given bags, encrypted under `password`.
pub fn pkcs12(
    key: Option<&PKey<Private>>,
    cert: Option<&X509>,
    extra: &[X509],
    password: &str,
) -> Vec<u8> {
    let mut builder = Pkcs12::builder();
    builder.name("signer");
    if let Some(key) = key {
        builder.pkey(key);
    }
    if let Some(cert) = cert {
        builder.cert(cert);
    }
    if !extra.is_empty() {
        let mut stack = Stack::new().unwrap();
        for cert in extra {
            stack.push(cert.clone()).unwrap();
        }
        builder.ca(stack);
    }
    builder.build2(password).unwrap().to_der().unwrap()
}

/// The usual fixture: shared key, self-signed certificate, no extra bags.
pub fn signer_pkcs12() -> (Vec<u8>, X509) {
    let key = rsa_key();
    let cert = self_signed(&key, "Signer Test", HIGH_BIT_SERIAL);
    (pkcs12(Some(&key), Some(&cert), &[], PASSWORD), cert)
}
