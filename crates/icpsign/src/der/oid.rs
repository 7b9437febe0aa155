//! Object identifiers used by the CMS assembler.
//!
//! The table is a closed enumeration: every OID the engine emits has a variant
//! carrying both its arcs and its pre-encoded DER value. [`encode_arcs`] and
//! [`decode_arcs`] handle arbitrary OIDs for callers and for reading DER back.

use crate::{Error, Result};

/// Object identifiers emitted in CAdES/PAdES signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Oid {
    /// id-data (1.2.840.113549.1.7.1)
    Data,
    /// id-signedData (1.2.840.113549.1.7.2)
    SignedData,
    /// id-contentType (1.2.840.113549.1.9.3)
    ContentType,
    /// id-messageDigest (1.2.840.113549.1.9.4)
    MessageDigest,
    /// id-signingTime (1.2.840.113549.1.9.5)
    SigningTime,
    /// id-aa-signingCertificateV2 (1.2.840.113549.1.9.16.2.47)
    SigningCertificateV2,
    /// id-sha256 (2.16.840.1.101.3.4.2.1)
    Sha256,
    /// rsaEncryption (1.2.840.113549.1.1.1)
    RsaEncryption,
}

impl Oid {
    /// Every variant, in declaration order.
    pub const ALL: [Oid; 8] = [
        Oid::Data,
        Oid::SignedData,
        Oid::ContentType,
        Oid::MessageDigest,
        Oid::SigningTime,
        Oid::SigningCertificateV2,
        Oid::Sha256,
        Oid::RsaEncryption,
    ];

    /// Arc values of the identifier.
    pub const fn arcs(self) -> &'static [u64] {
        match self {
            Oid::Data => &[1, 2, 840, 113549, 1, 7, 1],
            Oid::SignedData => &[1, 2, 840, 113549, 1, 7, 2],
            Oid::ContentType => &[1, 2, 840, 113549, 1, 9, 3],
            Oid::MessageDigest => &[1, 2, 840, 113549, 1, 9, 4],
            Oid::SigningTime => &[1, 2, 840, 113549, 1, 9, 5],
            Oid::SigningCertificateV2 => &[1, 2, 840, 113549, 1, 9, 16, 2, 47],
            Oid::Sha256 => &[2, 16, 840, 1, 101, 3, 4, 2, 1],
            Oid::RsaEncryption => &[1, 2, 840, 113549, 1, 1, 1],
        }
    }

    /// DER content octets (no tag or length).
    pub const fn der_value(self) -> &'static [u8] {
        match self {
            Oid::Data => &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x07, 0x01],
            Oid::SignedData => &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x07, 0x02],
            Oid::ContentType => &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x03],
            Oid::MessageDigest => &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x04],
            Oid::SigningTime => &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x05],
            Oid::SigningCertificateV2 => &[
                0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x10, 0x02, 0x2f,
            ],
            Oid::Sha256 => &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01],
            Oid::RsaEncryption => &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01],
        }
    }

    /// Short ASN.1 module name, for logs and diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Oid::Data => "id-data",
            Oid::SignedData => "id-signedData",
            Oid::ContentType => "contentType",
            Oid::MessageDigest => "messageDigest",
            Oid::SigningTime => "signingTime",
            Oid::SigningCertificateV2 => "signingCertificateV2",
            Oid::Sha256 => "sha256",
            Oid::RsaEncryption => "rsaEncryption",
        }
    }

    /// Dotted-decimal form, e.g. `1.2.840.113549.1.7.2`.
    pub fn dotted(self) -> String {
        dotted(self.arcs())
    }

    /// Look up a known identifier by its DER content octets.
    pub fn from_der_value(value: &[u8]) -> Option<Oid> {
        Oid::ALL.into_iter().find(|oid| oid.der_value() == value)
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.dotted())
    }
}

/// Render arcs in dotted-decimal notation.
pub fn dotted(arcs: &[u64]) -> String {
    arcs.iter()
        .map(|arc| arc.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// Encode OID arcs into DER content octets.
///
/// The first two arcs are folded into `40 * a + b`; every remaining arc is
/// written base-128, most significant group first, with the continuation bit
/// set on all but the last octet.
pub fn encode_arcs(arcs: &[u64]) -> Result<Vec<u8>> {
    if arcs.len() < 2 {
        return Err(Error::Encoding(format!(
            "OID needs at least two arcs, got {}",
            arcs.len()
        )));
    }
    let (first, second) = (arcs[0], arcs[1]);
    if first > 2 {
        return Err(Error::Encoding(format!("OID first arc must be 0..=2, got {first}")));
    }
    if first < 2 && second >= 40 {
        return Err(Error::Encoding(format!(
            "OID second arc must be below 40 under arc {first}, got {second}"
        )));
    }

    let mut output = Vec::with_capacity(arcs.len() + 4);
    let head = first
        .checked_mul(40)
        .and_then(|v| v.checked_add(second))
        .ok_or_else(|| Error::Encoding("OID leading arcs overflow".into()))?;
    encode_base128(&mut output, head);
    for &arc in &arcs[2..] {
        encode_base128(&mut output, arc);
    }
    Ok(output)
}

fn encode_base128(output: &mut Vec<u8>, mut value: u64) {
    let mut groups = [0u8; 10];
    let mut count = 0;
    loop {
        groups[count] = (value & 0x7f) as u8;
        count += 1;
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    for i in (0..count).rev() {
        let continuation = if i == 0 { 0x00 } else { 0x80 };
        output.push(groups[i] | continuation);
    }
}

/// Decode DER content octets back into OID arcs.
pub fn decode_arcs(value: &[u8]) -> Result<Vec<u64>> {
    if value.is_empty() {
        return Err(Error::Encoding("empty OID".into()));
    }

    let mut values = Vec::new();
    let mut current: u64 = 0;
    let mut in_progress = false;
    for &byte in value {
        if !in_progress && byte == 0x80 {
            return Err(Error::Encoding("non-minimal OID arc encoding".into()));
        }
        if current > (u64::MAX >> 7) {
            return Err(Error::Encoding("OID arc overflows 64 bits".into()));
        }
        current = (current << 7) | u64::from(byte & 0x7f);
        in_progress = byte & 0x80 != 0;
        if !in_progress {
            values.push(current);
            current = 0;
        }
    }
    if in_progress {
        return Err(Error::Encoding("truncated OID arc".into()));
    }

    let head = values[0];
    let (first, second) = match head {
        0..=39 => (0, head),
        40..=79 => (1, head - 40),
        _ => (2, head - 80),
    };
    let mut arcs = Vec::with_capacity(values.len() + 1);
    arcs.push(first);
    arcs.push(second);
    arcs.extend_from_slice(&values[1..]);
    Ok(arcs)
}
