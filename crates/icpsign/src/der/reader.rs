//! Minimal DER reader.
//!
//! Parses single-octet-tag TLVs with definite lengths. It exists to enforce
//! strict framing of PKCS#12 input and to walk the structures this crate
//! produces; it is not a general ASN.1 decoder.

use super::encoder::{TAG_INTEGER, TAG_OID};
use super::oid;
use crate::{Error, Result};

/// One decoded TLV borrowing from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tlv<'a> {
    /// Identifier octet.
    pub tag: u8,
    /// Content octets.
    pub content: &'a [u8],
    /// The whole element, identifier and length included.
    pub raw: &'a [u8],
}

impl<'a> Tlv<'a> {
    /// Whether the constructed bit (0x20) is set.
    pub fn is_constructed(&self) -> bool {
        self.tag & 0x20 != 0
    }

    /// Decode the elements nested in a constructed value.
    pub fn children(&self) -> Result<Vec<Tlv<'a>>> {
        if !self.is_constructed() {
            return Err(Error::Encoding(format!(
                "tag 0x{:02x} is primitive and has no children",
                self.tag
            )));
        }
        let mut children = Vec::new();
        let mut rest = self.content;
        while !rest.is_empty() {
            let (child, remaining) = parse(rest)?;
            children.push(child);
            rest = remaining;
        }
        Ok(children)
    }

    /// Dotted-decimal value of an OBJECT IDENTIFIER.
    pub fn oid(&self) -> Result<String> {
        self.expect_tag(TAG_OID)?;
        Ok(oid::dotted(&oid::decode_arcs(self.content)?))
    }

    /// Magnitude of a non-negative INTEGER, without the sign pad.
    pub fn unsigned_integer(&self) -> Result<&'a [u8]> {
        self.expect_tag(TAG_INTEGER)?;
        match self.content {
            [] => Err(Error::Encoding("empty INTEGER".into())),
            [first, ..] if first & 0x80 != 0 => {
                Err(Error::Encoding("INTEGER is negative".into()))
            }
            [0x00, second, ..] if second & 0x80 == 0 => {
                Err(Error::Encoding("INTEGER has a redundant leading zero".into()))
            }
            [0x00, rest @ ..] if !rest.is_empty() => Ok(rest),
            content => Ok(content),
        }
    }

    /// Fail unless the identifier octet equals `tag`.
    pub fn expect_tag(&self, tag: u8) -> Result<&Self> {
        if self.tag != tag {
            return Err(Error::Encoding(format!(
                "expected tag 0x{:02x}, found 0x{:02x}",
                tag, self.tag
            )));
        }
        Ok(self)
    }
}

/// Parse one TLV from the front of `input`, returning it and the unread rest.
pub fn parse(input: &[u8]) -> Result<(Tlv<'_>, &[u8])> {
    let (&tag, after_tag) = input
        .split_first()
        .ok_or_else(|| Error::Encoding("unexpected end of input".into()))?;
    if tag & 0x1f == 0x1f {
        return Err(Error::Encoding("multi-octet tags are not supported".into()));
    }

    let (&first, after_first) = after_tag
        .split_first()
        .ok_or_else(|| Error::Encoding("missing length octet".into()))?;

    let (length, header_len) = if first < 0x80 {
        (usize::from(first), 2)
    } else if first == 0x80 {
        return Err(Error::Encoding("indefinite length is not DER".into()));
    } else {
        let count = usize::from(first & 0x7f);
        if count > std::mem::size_of::<usize>() || after_first.len() < count {
            return Err(Error::Encoding("length field is truncated or too large".into()));
        }
        let octets = &after_first[..count];
        if octets[0] == 0 {
            return Err(Error::Encoding("length has a leading zero octet".into()));
        }
        let length = octets
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | usize::from(b));
        if length < 128 {
            return Err(Error::Encoding("long-form length used for a short value".into()));
        }
        (length, 2 + count)
    };

    let total = header_len
        .checked_add(length)
        .ok_or_else(|| Error::Encoding("length overflows".into()))?;
    if input.len() < total {
        return Err(Error::Encoding(format!(
            "content needs {} bytes but only {} remain",
            length,
            input.len() - header_len
        )));
    }

    let tlv = Tlv {
        tag,
        content: &input[header_len..total],
        raw: &input[..total],
    };
    Ok((tlv, &input[total..]))
}

/// Parse exactly one TLV spanning all of `input`.
pub fn parse_exact(input: &[u8]) -> Result<Tlv<'_>> {
    let (tlv, rest) = parse(input)?;
    if !rest.is_empty() {
        return Err(Error::Encoding(format!("{} trailing bytes after DER value", rest.len())));
    }
    Ok(tlv)
}
