//! ASN.1 DER primitives: constructors, the OID table, and a small reader.

pub mod encoder;
pub mod oid;
pub mod reader;

pub use encoder::{
    context_constructed, integer, null, object_identifier, octet_string, sequence, set, set_of,
    time, unsigned_integer, utc_time,
};
pub use oid::Oid;
pub use reader::{parse, parse_exact, Tlv};
