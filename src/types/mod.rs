mod fingerprint;
mod key_id;
mod mpi;
mod params;

pub use self::fingerprint::Fingerprint;
pub use self::key_id::KeyId;
pub use self::mpi::Mpi;
pub use self::params::ParamValue;

use num_enum::{FromPrimitive, IntoPrimitive};

/// Packet tags for the packet types the key model is made of.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-4.3>
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Tag {
    Signature = 2,
    SecretKey = 5,
    PublicKey = 6,
    SecretSubkey = 7,
    UserId = 13,
    PublicSubkey = 14,
    UserAttribute = 17,

    #[num_enum(catch_all)]
    Other(u8),
}

impl Tag {
    /// True for the four key-material tags.
    pub fn is_key_tag(self) -> bool {
        matches!(
            self,
            Tag::PublicKey | Tag::SecretKey | Tag::PublicSubkey | Tag::SecretSubkey
        )
    }

    /// True for the two subkey tags.
    pub fn is_subkey_tag(self) -> bool {
        matches!(self, Tag::PublicSubkey | Tag::SecretSubkey)
    }

    /// True for the two tags carrying secret material.
    pub fn is_secret_tag(self) -> bool {
        matches!(self, Tag::SecretKey | Tag::SecretSubkey)
    }
}

/// Key packet format version.
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum KeyVersion {
    V3 = 3,
    V4 = 4,

    #[num_enum(catch_all)]
    Other(u8),
}

impl Default for KeyVersion {
    fn default() -> Self {
        KeyVersion::V4
    }
}

/// Outcome of evaluating the trust status of a key, subkey or user at a
/// given date.
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum KeyStatus {
    Invalid = 0,
    Expired = 1,
    Revoked = 2,
    Valid = 3,
    NoSelfCert = 4,

    #[num_enum(catch_all)]
    Other(u8),
}

/// Compression algorithms advertised in self-certifications.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-9.3>
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum CompressionAlgorithm {
    Uncompressed = 0,
    ZIP = 1,
    ZLIB = 2,
    BZip2 = 3,

    #[num_enum(catch_all)]
    Other(u8),
}

/// Armor block types the read layer dispatches on. The armor codec itself
/// lives outside this crate; only the decoded block type reaches us.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BlockType {
    PublicKey,
    PrivateKey,
    Message,
    Signature,
}
