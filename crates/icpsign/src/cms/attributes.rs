//! CMS signed attributes (RFC 5652 §5.3, RFC 5035).
//!
//! ```text
//! signedAttrs = SET OF Attribute {
//!   { contentType,          SET { id-data } },
//!   { messageDigest,        SET { OCTET STRING (SHA-256 of content) } },
//!   { signingCertificateV2, SET { SigningCertificateV2 } },
//!   { signingTime,          SET { UTCTime } },          -- CAdES only
//! }
//! ```
//!
//! The signature covers the DER of this SET with its universal SET tag
//! (0x31); inside `SignerInfo` the same content is carried under an implicit
//! `[0]` tag.

use openssl::x509::X509Ref;

use super::signed_data::IssuerSerial;
use crate::config::{AttributeOrder, SignerConfig};
use crate::crypto::digest::{sha256, SHA256_LEN};
use crate::der::{self, Oid};
use crate::{Error, Result};

/// One attribute: type plus its SET OF values, each already DER-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub oid: Oid,
    pub values: Vec<Vec<u8>>,
}

impl Attribute {
    /// Single-valued attribute.
    pub fn new(oid: Oid, value: Vec<u8>) -> Self {
        Self {
            oid,
            values: vec![value],
        }
    }

    /// `SEQUENCE { attrType OBJECT IDENTIFIER, attrValues SET OF AttributeValue }`
    pub fn to_der(&self) -> Vec<u8> {
        der::sequence(&[
            &der::object_identifier(self.oid),
            &der::set_of(self.values.clone()),
        ])
    }
}

/// The ordered signed-attribute list of one signer.
#[derive(Debug, Clone)]
pub struct SignedAttributes {
    attributes: Vec<Attribute>,
    encoded: Vec<Vec<u8>>,
}

impl SignedAttributes {
    /// Build the attribute set for `certificate` over content with digest `content_digest`.
    ///
    /// `signingTime` is emitted only when the configured profile asks for it.
    pub fn build(
        content_digest: &[u8; SHA256_LEN],
        certificate: &X509Ref,
        config: &SignerConfig,
    ) -> Result<Self> {
        let mut attributes = vec![
            Attribute::new(Oid::ContentType, der::object_identifier(Oid::Data)),
            Attribute::new(Oid::MessageDigest, der::octet_string(content_digest)),
            Attribute::new(
                Oid::SigningCertificateV2,
                signing_certificate_v2(certificate)?,
            ),
        ];

        if let Some(time) = config.resolve_signing_time() {
            attributes.push(Attribute::new(Oid::SigningTime, der::time(&time)?));
        }

        Ok(Self::from_attributes(attributes, config.attribute_order))
    }

    /// Wrap an explicit attribute list.
    pub fn from_attributes(attributes: Vec<Attribute>, order: AttributeOrder) -> Self {
        let mut pairs: Vec<(Vec<u8>, Attribute)> =
            attributes.into_iter().map(|a| (a.to_der(), a)).collect();
        if order == AttributeOrder::Canonical {
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
        }
        let (encoded, attributes) = pairs.into_iter().unzip();
        Self {
            attributes,
            encoded,
        }
    }

    /// Attributes in encoding order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// First attribute of the given type.
    pub fn get(&self, oid: Oid) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.oid == oid)
    }

    /// DER under the universal SET tag; these are the bytes that get signed.
    pub fn to_der_set(&self) -> Vec<u8> {
        der::set(&self.parts())
    }

    /// DER under the implicit `[0]` tag, as embedded in `SignerInfo`.
    pub fn to_der_implicit(&self) -> Result<Vec<u8>> {
        der::context_constructed(0, &self.parts())
    }

    fn parts(&self) -> Vec<&[u8]> {
        self.encoded.iter().map(Vec::as_slice).collect()
    }
}

/// `SigningCertificateV2` value binding the signature to `certificate`.
///
/// ```text
/// SigningCertificateV2 ::= SEQUENCE { certs SEQUENCE OF ESSCertIDv2 }
/// ESSCertIDv2 ::= SEQUENCE {
///   hashAlgorithm AlgorithmIdentifier DEFAULT sha256,   -- omitted
///   certHash      OCTET STRING,
///   issuerSerial  IssuerSerial }
/// IssuerSerial ::= SEQUENCE { issuer GeneralNames, serialNumber INTEGER }
/// ```
pub fn signing_certificate_v2(certificate: &X509Ref) -> Result<Vec<u8>> {
    let cert_der = certificate
        .to_der()
        .map_err(|e| Error::Encoding(format!("Failed to encode certificate: {e}")))?;
    let cert_hash = sha256(&cert_der);

    let id = IssuerSerial::from_certificate(certificate)?;
    // GeneralName directoryName is [4], explicit because Name is a CHOICE
    let general_names = der::sequence(&[&der::context_constructed(4, &[&id.issuer])?]);
    let issuer_serial = der::sequence(&[&general_names, &der::unsigned_integer(&id.serial)]);

    let ess_cert_id = der::sequence(&[&der::octet_string(&cert_hash), &issuer_serial]);
    let certs = der::sequence(&[&ess_cert_id]);
    Ok(der::sequence(&[&certs]))
}
