use std::{fmt::Display, str::FromStr};

use digest::Digest;
use md5::Md5;
use num_enum::{FromPrimitive, IntoPrimitive};
use ripemd::Ripemd160;
use sha1::Sha1;

use crate::errors::{Error, Result};

/// Available hash algorithms.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-9.4>
#[derive(Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive, Hash)]
#[repr(u8)]
pub enum HashAlgorithm {
    None = 0,
    Md5 = 1,
    Sha1 = 2,
    Ripemd160 = 3,

    Sha256 = 8,
    Sha384 = 9,
    Sha512 = 10,
    Sha224 = 11,
    Sha3_256 = 12,
    Sha3_512 = 14,

    #[num_enum(catch_all)]
    Other(u8),
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        Self::Sha256
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "None" => Ok(Self::None),
            "MD5" => Ok(Self::Md5),
            "SHA1" => Ok(Self::Sha1),
            "RIPEMD160" => Ok(Self::Ripemd160),
            "SHA256" => Ok(Self::Sha256),
            "SHA384" => Ok(Self::Sha384),
            "SHA512" => Ok(Self::Sha512),
            "SHA224" => Ok(Self::Sha224),
            "SHA3-256" => Ok(Self::Sha3_256),
            "SHA3-512" => Ok(Self::Sha3_512),
            _ => bail!("unknown hash"),
        }
    }
}

impl Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::None => "None",
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA1",
            Self::Ripemd160 => "RIPEMD160",
            Self::Sha256 => "SHA256",
            Self::Sha384 => "SHA384",
            Self::Sha512 => "SHA512",
            Self::Sha224 => "SHA224",
            Self::Sha3_256 => "SHA3-256",
            Self::Sha3_512 => "SHA3-512",
            Self::Other(v) => return write!(f, "Other({})", v),
        };
        write!(f, "{}", s)
    }
}

impl HashAlgorithm {
    /// Calculate the digest of the given input data.
    pub fn digest(self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(match self {
            HashAlgorithm::Md5 => Md5::digest(data).to_vec(),
            HashAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            HashAlgorithm::Ripemd160 => Ripemd160::digest(data).to_vec(),
            HashAlgorithm::Sha256 => sha2::Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha384 => sha2::Sha384::digest(data).to_vec(),
            HashAlgorithm::Sha512 => sha2::Sha512::digest(data).to_vec(),
            HashAlgorithm::Sha224 => sha2::Sha224::digest(data).to_vec(),
            HashAlgorithm::Sha3_256 => sha3::Sha3_256::digest(data).to_vec(),
            HashAlgorithm::Sha3_512 => sha3::Sha3_512::digest(data).to_vec(),
            _ => unimplemented_err!("hasher: {:?}", self),
        })
    }

    /// Returns the expected digest size for the given algorithm, in bytes.
    /// Unknown algorithms report zero, which loses every preference
    /// comparison.
    pub fn digest_size(self) -> usize {
        match self {
            HashAlgorithm::Md5 => Md5::output_size(),
            HashAlgorithm::Sha1 => Sha1::output_size(),
            HashAlgorithm::Ripemd160 => Ripemd160::output_size(),
            HashAlgorithm::Sha256 => sha2::Sha256::output_size(),
            HashAlgorithm::Sha384 => sha2::Sha384::output_size(),
            HashAlgorithm::Sha512 => sha2::Sha512::output_size(),
            HashAlgorithm::Sha224 => sha2::Sha224::output_size(),
            HashAlgorithm::Sha3_256 => sha3::Sha3_256::output_size(),
            HashAlgorithm::Sha3_512 => sha3::Sha3_512::output_size(),
            _ => 0,
        }
    }
}
