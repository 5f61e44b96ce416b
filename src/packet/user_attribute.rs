use bytes::Bytes;

use crate::types::Tag;

/// User Attribute Packet, treated as an opaque blob. The only subpacket
/// RFC 4880 defines is an image; we never look inside, we only bind
/// signatures to the raw bytes.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.12>
#[derive(Clone, PartialEq, Eq, derive_more::Debug, derive_more::Display)]
#[display("User Attribute ({} bytes)", data.len())]
#[debug("UserAttribute({})", hex::encode(data))]
pub struct UserAttribute {
    data: Bytes,
}

impl UserAttribute {
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        UserAttribute { data: data.into() }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn tag(&self) -> Tag {
        Tag::UserAttribute
    }
}
