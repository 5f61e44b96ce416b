use num_enum::{FromPrimitive, IntoPrimitive};

/// Available symmetric key algorithms.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-9.2>
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SymmetricKeyAlgorithm {
    /// Plaintext or unencrypted data
    Plaintext = 0,
    IDEA = 1,
    /// TripleDES (DES-EDE, 168 bit key derived from 192)
    TripleDES = 2,
    /// CAST5 (128 bit key, as per [RFC2144])
    CAST5 = 3,
    /// Blowfish (128 bit key, 16 rounds)
    Blowfish = 4,
    AES128 = 7,
    AES192 = 8,
    AES256 = 9,
    /// Twofish with 256-bit key [TWOFISH]
    Twofish = 10,

    #[num_enum(catch_all)]
    Other(u8),
}

impl SymmetricKeyAlgorithm {
    /// The key size of the algorithm, in bytes.
    pub fn key_size(self) -> usize {
        match self {
            SymmetricKeyAlgorithm::Plaintext => 0,
            SymmetricKeyAlgorithm::IDEA => 16,
            SymmetricKeyAlgorithm::TripleDES => 24,
            SymmetricKeyAlgorithm::CAST5 => 16,
            SymmetricKeyAlgorithm::Blowfish => 16,
            SymmetricKeyAlgorithm::AES128 => 16,
            SymmetricKeyAlgorithm::AES192 => 24,
            SymmetricKeyAlgorithm::AES256 => 32,
            SymmetricKeyAlgorithm::Twofish => 32,
            SymmetricKeyAlgorithm::Other(_) => 0,
        }
    }

    /// The block size of the algorithm, in bytes.
    pub fn block_size(self) -> usize {
        match self {
            SymmetricKeyAlgorithm::Plaintext => 0,
            SymmetricKeyAlgorithm::IDEA => 8,
            SymmetricKeyAlgorithm::TripleDES => 8,
            SymmetricKeyAlgorithm::CAST5 => 8,
            SymmetricKeyAlgorithm::Blowfish => 8,
            SymmetricKeyAlgorithm::AES128 => 16,
            SymmetricKeyAlgorithm::AES192 => 16,
            SymmetricKeyAlgorithm::AES256 => 16,
            SymmetricKeyAlgorithm::Twofish => 16,
            SymmetricKeyAlgorithm::Other(_) => 0,
        }
    }

    /// Whether the preference negotiator may ever select this algorithm.
    pub fn is_negotiable(self) -> bool {
        !matches!(
            self,
            SymmetricKeyAlgorithm::Plaintext
                | SymmetricKeyAlgorithm::IDEA
                | SymmetricKeyAlgorithm::Other(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        assert_eq!(SymmetricKeyAlgorithm::AES128.key_size(), 16);
        assert_eq!(SymmetricKeyAlgorithm::AES256.key_size(), 32);
        assert_eq!(SymmetricKeyAlgorithm::TripleDES.block_size(), 8);
    }

    #[test]
    fn test_negotiable() {
        assert!(!SymmetricKeyAlgorithm::Plaintext.is_negotiable());
        assert!(!SymmetricKeyAlgorithm::IDEA.is_negotiable());
        assert!(!SymmetricKeyAlgorithm::Other(42).is_negotiable());
        assert!(SymmetricKeyAlgorithm::AES256.is_negotiable());
        assert!(SymmetricKeyAlgorithm::CAST5.is_negotiable());
    }
}
