//! `ContentInfo` / `SignedData` assembly (RFC 5652 §5).
//!
//! ```text
//! ContentInfo {
//!   contentType: id-signedData,
//!   content: [0] EXPLICIT SignedData {
//!     version: 1,
//!     digestAlgorithms: { sha256 },
//!     encapContentInfo: { id-data },                 -- detached: no eContent
//!     certificates: [0] IMPLICIT { signer, chain... },
//!     signerInfos: { SignerInfo {
//!       version: 1,
//!       sid: IssuerAndSerialNumber,
//!       digestAlgorithm: sha256,
//!       signedAttrs: [0] IMPLICIT SET OF Attribute,
//!       signatureAlgorithm: rsaEncryption,
//!       signature: OCTET STRING } }
//!   }
//! }
//! ```
//!
//! The two `[0]` tags do not clash: tag numbers are scoped to the enclosing
//! SEQUENCE (SignedData for certificates, SignerInfo for signedAttrs).

use openssl::x509::{X509Ref, X509};

use super::attributes::SignedAttributes;
use crate::der::{self, Oid};
use crate::{Error, Result};

/// CMSVersion used for SignedData and SignerInfo when the signer is
/// identified by issuer and serial number.
const CMS_VERSION: i64 = 1;

/// Issuer name and serial number of a certificate, both ready for DER.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerSerial {
    /// DER of the issuer `Name`.
    pub issuer: Vec<u8>,
    /// Serial number as an unsigned big-endian magnitude.
    pub serial: Vec<u8>,
}

impl IssuerSerial {
    /// Read the issuer and serial of `certificate`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] for a negative serial number, which X.509
    /// forbids and which cannot be written as an unsigned INTEGER.
    pub fn from_certificate(certificate: &X509Ref) -> Result<Self> {
        let issuer = certificate
            .issuer_name()
            .to_der()
            .map_err(|e| Error::Encoding(format!("Failed to encode issuer name: {e}")))?;

        let serial = certificate
            .serial_number()
            .to_bn()
            .map_err(|e| Error::Encoding(format!("Failed to read serial number: {e}")))?;
        if serial.is_negative() {
            return Err(Error::Encoding("certificate serial number is negative".into()));
        }

        Ok(Self {
            issuer,
            serial: serial.to_vec(),
        })
    }

    /// `IssuerAndSerialNumber ::= SEQUENCE { issuer Name, serialNumber INTEGER }`
    pub fn to_der(&self) -> Vec<u8> {
        der::sequence(&[&self.issuer, &der::unsigned_integer(&self.serial)])
    }
}

/// `AlgorithmIdentifier ::= SEQUENCE { algorithm OID, parameters ANY OPTIONAL }`
pub fn algorithm_identifier(oid: Oid, parameters: Option<&[u8]>) -> Vec<u8> {
    let oid = der::object_identifier(oid);
    match parameters {
        Some(params) => der::sequence(&[&oid, params]),
        None => der::sequence(&[&oid]),
    }
}

/// SHA-256 with absent parameters (RFC 5754 §2).
pub fn sha256_algorithm() -> Vec<u8> {
    algorithm_identifier(Oid::Sha256, None)
}

/// rsaEncryption with NULL parameters (RFC 3370 §3.2).
pub fn rsa_encryption_algorithm() -> Vec<u8> {
    algorithm_identifier(Oid::RsaEncryption, Some(&der::null()))
}

/// Encode the single `SignerInfo` of a signature.
pub fn signer_info(
    certificate: &X509Ref,
    signed_attributes: &SignedAttributes,
    signature: &[u8],
) -> Result<Vec<u8>> {
    let sid = IssuerSerial::from_certificate(certificate)?.to_der();
    Ok(der::sequence(&[
        &der::integer(CMS_VERSION),
        &sid,
        &sha256_algorithm(),
        &signed_attributes.to_der_implicit()?,
        &rsa_encryption_algorithm(),
        &der::octet_string(signature),
    ]))
}

/// Encode a detached `SignedData` wrapped in its `ContentInfo`.
///
/// `certificates` are embedded in the order given; the caller decides whether
/// that is only the signer or the whole chain.
pub fn content_info(
    signer: &X509Ref,
    certificates: &[X509],
    signed_attributes: &SignedAttributes,
    signature: &[u8],
) -> Result<Vec<u8>> {
    if signature.is_empty() {
        return Err(Error::Crypto("refusing to assemble CMS without a signature".into()));
    }

    let mut encoded_certs = Vec::with_capacity(certificates.len());
    for cert in certificates {
        encoded_certs.push(
            cert.to_der()
                .map_err(|e| Error::Encoding(format!("Failed to encode certificate: {e}")))?,
        );
    }
    let cert_parts: Vec<&[u8]> = encoded_certs.iter().map(Vec::as_slice).collect();

    let digest_algorithms = der::set(&[&sha256_algorithm()]);
    let encap_content_info = der::sequence(&[&der::object_identifier(Oid::Data)]);
    let certificate_set = der::context_constructed(0, &cert_parts)?;
    let signer_infos = der::set(&[&signer_info(signer, signed_attributes, signature)?]);

    let signed_data = der::sequence(&[
        &der::integer(CMS_VERSION),
        &digest_algorithms,
        &encap_content_info,
        &certificate_set,
        &signer_infos,
    ]);

    Ok(der::sequence(&[
        &der::object_identifier(Oid::SignedData),
        &der::context_constructed(0, &[&signed_data])?,
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Profile, SignerConfig};
    use crate::crypto::digest::sha256;
    use crate::der::parse_exact;
    use crate::test_support::{other_rsa_key, rsa_key, self_signed, HIGH_BIT_SERIAL};

    #[test]
    fn test_issuer_serial_pads_high_bit() {
        let cert = self_signed(&rsa_key(), "Serial", HIGH_BIT_SERIAL);
        let id = IssuerSerial::from_certificate(&cert).unwrap();
        assert_eq!(id.serial, hex::decode(HIGH_BIT_SERIAL).unwrap());

        let encoded = id.to_der();
        let fields = parse_exact(&encoded).unwrap().children().unwrap();
        assert_eq!(fields[1].content[0], 0x00);
        assert_eq!(fields[1].content.len(), 9);
        assert_eq!(fields[1].unsigned_integer().unwrap(), id.serial.as_slice());
    }

    #[test]
    fn test_algorithm_identifiers() {
        assert_eq!(
            sha256_algorithm(),
            hex::decode("300b0609608648016503040201").unwrap()
        );
        assert_eq!(
            rsa_encryption_algorithm(),
            hex::decode("300d06092a864886f70d0101010500").unwrap()
        );
    }

    #[test]
    fn test_content_info_layout() {
        let key = rsa_key();
        let signer = self_signed(&key, "Layout", HIGH_BIT_SERIAL);
        let extra = self_signed(&other_rsa_key(), "Intermediate", "0A");
        let attrs = SignedAttributes::build(
            &sha256(b"content"),
            &signer,
            &SignerConfig::for_profile(Profile::Pades),
        )
        .unwrap();
        let signature = vec![0x5a; 256];

        let der = content_info(&signer, &[signer.clone(), extra], &attrs, &signature).unwrap();
        let root = parse_exact(&der).unwrap();
        let top = root.children().unwrap();
        assert_eq!(top[0].oid().unwrap(), "1.2.840.113549.1.7.2");
        assert_eq!(top[1].tag, 0xa0);

        let signed_data = top[1].children().unwrap()[0];
        let fields = signed_data.children().unwrap();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[0].content, &[0x01]);

        let encap = fields[2].children().unwrap();
        assert_eq!(encap.len(), 1, "detached signature carries no eContent");
        assert_eq!(encap[0].oid().unwrap(), Oid::Data.dotted());

        assert_eq!(fields[3].tag, 0xa0);
        assert_eq!(fields[3].children().unwrap().len(), 2);

        let signer_infos = fields[4].children().unwrap();
        assert_eq!(signer_infos.len(), 1);
        let signer_info = signer_infos[0].children().unwrap();
        assert_eq!(signer_info.len(), 6);
        assert_eq!(signer_info[3].tag, 0xa0);
        assert_eq!(signer_info[5].content, signature.as_slice());
    }

    #[test]
    fn test_content_info_rejects_empty_signature() {
        let signer = self_signed(&rsa_key(), "Empty", "01");
        let attrs =
            SignedAttributes::build(&sha256(b"x"), &signer, &SignerConfig::default()).unwrap();
        let result = content_info(&signer, &[], &attrs, &[]);
        assert!(matches!(result, Err(Error::Crypto(_))));
    }
}
