//! DER constructors for the handful of ASN.1 types a CMS signature needs.
//!
//! Every function returns a complete TLV. Constructed values take their
//! children already encoded, so larger structures are assembled bottom-up by
//! nesting calls, the same way the structures read in RFC 5652.
//!
//! The encoding uses the following ASN.1 DER tags:
//! - 0x02: INTEGER
//! - 0x04: OCTET STRING
//! - 0x05: NULL
//! - 0x06: OBJECT IDENTIFIER
//! - 0x17: UTCTime
//! - 0x18: GeneralizedTime
//! - 0x30: SEQUENCE
//! - 0x31: SET
//! - 0xA0 | n: context-specific constructed `[n]`

use chrono::{DateTime, Datelike, Utc};

use super::oid::{self, Oid};
use crate::{Error, Result};

/// DER tag for INTEGER
pub const TAG_INTEGER: u8 = 0x02;

/// DER tag for OCTET STRING
pub const TAG_OCTET_STRING: u8 = 0x04;

/// DER tag for NULL
pub const TAG_NULL: u8 = 0x05;

/// DER tag for OBJECT IDENTIFIER
pub const TAG_OID: u8 = 0x06;

/// DER tag for UTCTime
pub const TAG_UTC_TIME: u8 = 0x17;

/// DER tag for GeneralizedTime
pub const TAG_GENERALIZED_TIME: u8 = 0x18;

/// DER tag for SEQUENCE / SEQUENCE OF
pub const TAG_SEQUENCE: u8 = 0x30;

/// DER tag for SET / SET OF
pub const TAG_SET: u8 = 0x31;

/// Class and form bits of a context-specific constructed tag.
pub const CONTEXT_CONSTRUCTED: u8 = 0xa0;

/// Highest tag number that fits the single-octet identifier form.
const MAX_LOW_TAG_NUMBER: u8 = 30;

/// Encode a length value in DER format.
///
/// For lengths < 128, uses short form (1 byte).
/// For lengths >= 128, uses long form with the minimal number of octets.
pub fn encode_length(output: &mut Vec<u8>, length: usize) {
    if length < 128 {
        output.push(length as u8);
    } else {
        let bytes_needed = (usize::BITS - length.leading_zeros()).div_ceil(8) as usize;

        output.push(0x80 | bytes_needed as u8);

        for i in (0..bytes_needed).rev() {
            output.push(((length >> (i * 8)) & 0xff) as u8);
        }
    }
}

/// Encode a tag, its length and content.
pub fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(content.len() + 6);
    output.push(tag);
    encode_length(&mut output, content.len());
    output.extend_from_slice(content);
    output
}

fn constructed(tag: u8, parts: &[&[u8]]) -> Vec<u8> {
    let content_len: usize = parts.iter().map(|p| p.len()).sum();
    let mut output = Vec::with_capacity(content_len + 6);
    output.push(tag);
    encode_length(&mut output, content_len);
    for part in parts {
        output.extend_from_slice(part);
    }
    output
}

/// SEQUENCE whose members are the already-encoded `parts`, in order.
pub fn sequence(parts: &[&[u8]]) -> Vec<u8> {
    constructed(TAG_SEQUENCE, parts)
}

/// SET whose members are the already-encoded `parts`, in the order given.
///
/// Use [`set_of`] when the members must be in canonical DER order.
pub fn set(parts: &[&[u8]]) -> Vec<u8> {
    constructed(TAG_SET, parts)
}

/// SET OF with members sorted by their encoded octets (X.690 §11.6).
pub fn set_of(mut members: Vec<Vec<u8>>) -> Vec<u8> {
    members.sort();
    let parts: Vec<&[u8]> = members.iter().map(Vec::as_slice).collect();
    set(&parts)
}

/// Context-specific constructed tag `[tag_number]` around already-encoded parts.
///
/// Used both for implicit tagging (the parts are the members of the replaced
/// type) and explicit tagging (a single complete TLV as the only part).
pub fn context_constructed(tag_number: u8, parts: &[&[u8]]) -> Result<Vec<u8>> {
    if tag_number > MAX_LOW_TAG_NUMBER {
        return Err(Error::Encoding(format!(
            "context tag [{tag_number}] needs the multi-octet identifier form"
        )));
    }
    Ok(constructed(CONTEXT_CONSTRUCTED | tag_number, parts))
}

/// OCTET STRING
pub fn octet_string(bytes: &[u8]) -> Vec<u8> {
    tlv(TAG_OCTET_STRING, bytes)
}

/// NULL
pub fn null() -> Vec<u8> {
    vec![TAG_NULL, 0x00]
}

/// OBJECT IDENTIFIER from the constant table.
pub fn object_identifier(oid: Oid) -> Vec<u8> {
    tlv(TAG_OID, oid.der_value())
}

/// OBJECT IDENTIFIER from arbitrary arcs.
pub fn object_identifier_from_arcs(arcs: &[u64]) -> Result<Vec<u8>> {
    Ok(tlv(TAG_OID, &oid::encode_arcs(arcs)?))
}

/// INTEGER from an unsigned big-endian magnitude.
///
/// Redundant leading zero octets are stripped, then a single `0x00` is
/// prepended when the high bit of the first remaining octet is set, so the
/// value is never read back as negative. An empty or all-zero magnitude
/// encodes zero.
pub fn unsigned_integer(magnitude: &[u8]) -> Vec<u8> {
    let start = magnitude
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(magnitude.len());
    let significant = &magnitude[start..];

    if significant.is_empty() {
        return vec![TAG_INTEGER, 0x01, 0x00];
    }

    let needs_sign_pad = significant[0] & 0x80 != 0;
    let mut output = Vec::with_capacity(significant.len() + 4);
    output.push(TAG_INTEGER);
    encode_length(&mut output, significant.len() + usize::from(needs_sign_pad));
    if needs_sign_pad {
        output.push(0x00);
    }
    output.extend_from_slice(significant);
    output
}

/// INTEGER from a signed value, in minimal two's-complement form.
pub fn integer(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xff && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    tlv(TAG_INTEGER, &bytes[start..])
}

/// UTCTime `YYMMDDHHMMSSZ`.
///
/// UTCTime only covers 1950 through 2049; other years are rejected.
pub fn utc_time(time: &DateTime<Utc>) -> Result<Vec<u8>> {
    let year = time.year();
    if !(1950..=2049).contains(&year) {
        return Err(Error::Encoding(format!(
            "year {year} is outside the UTCTime range 1950-2049"
        )));
    }
    let text = time.format("%y%m%d%H%M%SZ").to_string();
    Ok(tlv(TAG_UTC_TIME, text.as_bytes()))
}

/// GeneralizedTime `YYYYMMDDHHMMSSZ`, without fractional seconds.
pub fn generalized_time(time: &DateTime<Utc>) -> Result<Vec<u8>> {
    let year = time.year();
    if !(0..=9999).contains(&year) {
        return Err(Error::Encoding(format!(
            "year {year} cannot be written as GeneralizedTime"
        )));
    }
    let text = time.format("%Y%m%d%H%M%SZ").to_string();
    Ok(tlv(TAG_GENERALIZED_TIME, text.as_bytes()))
}

/// `Time ::= CHOICE { utcTime, generalTime }` per the RFC 5280 rule:
/// UTCTime through 2049, GeneralizedTime from 2050 on.
pub fn time(time: &DateTime<Utc>) -> Result<Vec<u8>> {
    if (1950..=2049).contains(&time.year()) {
        utc_time(time)
    } else {
        generalized_time(time)
    }
}
