#![allow(dead_code)]

use std::sync::OnceLock;

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::stack::Stack;
use openssl::x509::{X509Name, X509NameBuilder, X509};

pub const PASSWORD: &str = "test1234";

fn generate() -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap()
}

pub fn signer_key() -> PKey<Private> {
    static KEY: OnceLock<PKey<Private>> = OnceLock::new();
    KEY.get_or_init(generate).clone()
}

pub fn ca_key() -> PKey<Private> {
    static KEY: OnceLock<PKey<Private>> = OnceLock::new();
    KEY.get_or_init(generate).clone()
}

pub fn name(common_name: &str) -> X509Name {
    let mut builder = X509NameBuilder::new().unwrap();
    builder.append_entry_by_text("C", "BR").unwrap();
    builder.append_entry_by_text("O", "ICP-Brasil").unwrap();
    builder.append_entry_by_text("CN", common_name).unwrap();
    builder.build()
}

/// Certificate for `subject_key`, signed by `issuer_key` under `issuer`.
pub fn certificate(
    subject_key: &PKey<Private>,
    subject: &str,
    issuer_key: &PKey<Private>,
    issuer: &str,
    serial_hex: &str,
) -> X509 {
    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_hex_str(serial_hex).unwrap();
    builder.set_serial_number(&serial.to_asn1_integer().unwrap()).unwrap();
    builder.set_subject_name(&name(subject)).unwrap();
    builder.set_issuer_name(&name(issuer)).unwrap();
    builder.set_pubkey(subject_key).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(365).unwrap()).unwrap();
    builder.sign(issuer_key, MessageDigest::sha256()).unwrap();
    builder.build()
}

pub fn self_signed(key: &PKey<Private>, common_name: &str, serial_hex: &str) -> X509 {
    certificate(key, common_name, key, common_name, serial_hex)
}

pub fn pkcs12(key: &PKey<Private>, cert: &X509, chain: &[X509], password: &str) -> Vec<u8> {
    let mut builder = Pkcs12::builder();
    builder.name("icp-brasil a1");
    builder.pkey(key);
    builder.cert(cert);
    if !chain.is_empty() {
        let mut stack = Stack::new().unwrap();
        for ca in chain {
            stack.push(ca.clone()).unwrap();
        }
        builder.ca(stack);
    }
    builder.build2(password).unwrap().to_der().unwrap()
}

/// RSA-2048 key, self-signed certificate, passphrase `test1234`.
pub fn self_signed_pkcs12() -> (Vec<u8>, X509) {
    let key = signer_key();
    let cert = self_signed(&key, "Fulano de Tal:12345678900", "01A2B3");
    (pkcs12(&key, &cert, &[], PASSWORD), cert)
}

/// Leaf issued by an intermediate, plus the intermediate and an unrelated root.
pub fn chained_pkcs12() -> (Vec<u8>, X509, Vec<X509>) {
    let key = signer_key();
    let ca = ca_key();
    let root = self_signed(&ca, "AC Raiz Teste", "01");
    let intermediate = certificate(&ca, "AC Intermediaria Teste", &ca, "AC Raiz Teste", "02");
    let leaf = certificate(
        &key,
        "Beltrano:98765432100",
        &ca,
        "AC Intermediaria Teste",
        "C0FFEE0123456789",
    );
    let chain = vec![intermediate, root];
    (pkcs12(&key, &leaf, &chain, PASSWORD), leaf, chain)
}

/// Helpers for walking the CMS output with the crate's DER reader.
pub mod walk {
    use icpsign::der::{parse_exact, Tlv};

    pub struct SignedDataParts<'a> {
        pub content_type: String,
        pub fields: Vec<Tlv<'a>>,
    }

    pub fn signed_data(cms: &[u8]) -> SignedDataParts<'_> {
        let root = parse_exact(cms).unwrap();
        assert_eq!(root.tag, 0x30);
        let top = root.children().unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[1].tag, 0xa0);
        let explicit = top[1].children().unwrap();
        assert_eq!(explicit.len(), 1);
        SignedDataParts {
            content_type: top[0].oid().unwrap(),
            fields: explicit[0].children().unwrap(),
        }
    }

    pub fn certificates<'a>(parts: &SignedDataParts<'a>) -> Vec<Tlv<'a>> {
        let field = parts.fields.iter().find(|f| f.tag == 0xa0).unwrap();
        field.children().unwrap()
    }

    pub fn signer_infos<'a>(parts: &SignedDataParts<'a>) -> Vec<Tlv<'a>> {
        parts.fields.last().unwrap().children().unwrap()
    }

    /// `(oid, values)` for every signed attribute of the only SignerInfo.
    pub fn signed_attributes<'a>(parts: &SignedDataParts<'a>) -> Vec<(String, Vec<Tlv<'a>>)> {
        let infos = signer_infos(parts);
        let fields = infos[0].children().unwrap();
        let attrs = fields.iter().find(|f| f.tag == 0xa0).unwrap();
        attrs
            .children()
            .unwrap()
            .into_iter()
            .map(|attr| {
                let pair = attr.children().unwrap();
                (pair[0].oid().unwrap(), pair[1].children().unwrap())
            })
            .collect()
    }
}
