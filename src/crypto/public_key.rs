use num_enum::{FromPrimitive, IntoPrimitive};

/// Available public key algorithms.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-9.1>
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
#[non_exhaustive]
pub enum PublicKeyAlgorithm {
    /// RSA (Encrypt and Sign)
    RSA = 1,
    /// DEPRECATED: RSA (Encrypt-Only)
    RSAEncrypt = 2,
    /// DEPRECATED: RSA (Sign-Only)
    RSASign = 3,
    /// Elgamal (Encrypt-Only)
    Elgamal = 16,
    /// DSA (Digital Signature Algorithm)
    DSA = 17,
    /// Elliptic Curve: RFC 6637
    ECDH = 18,
    /// ECDSA: RFC 6637
    ECDSA = 19,
    /// DEPRECATED: Elgamal (Encrypt and Sign)
    ElgamalSign = 20,
    /// EdDSA (not yet assigned by IANA at the time RFC 4880 shipped)
    EdDSA = 22,

    #[num_enum(catch_all)]
    Unknown(u8),
}

impl PublicKeyAlgorithm {
    /// Whether key material of this algorithm can ever produce signatures.
    pub fn can_sign(self) -> bool {
        !matches!(
            self,
            PublicKeyAlgorithm::RSAEncrypt
                | PublicKeyAlgorithm::Elgamal
                | PublicKeyAlgorithm::ElgamalSign
                | PublicKeyAlgorithm::ECDH
        )
    }

    /// Whether key material of this algorithm can ever encrypt.
    pub fn can_encrypt(self) -> bool {
        !matches!(
            self,
            PublicKeyAlgorithm::DSA
                | PublicKeyAlgorithm::RSASign
                | PublicKeyAlgorithm::ECDSA
                | PublicKeyAlgorithm::EdDSA
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_map() {
        assert_eq!(u8::from(PublicKeyAlgorithm::RSA), 1);
        assert_eq!(u8::from(PublicKeyAlgorithm::ECDH), 18);
        assert_eq!(PublicKeyAlgorithm::from(19), PublicKeyAlgorithm::ECDSA);
        assert_eq!(PublicKeyAlgorithm::from(22), PublicKeyAlgorithm::EdDSA);
        assert_eq!(PublicKeyAlgorithm::from(99), PublicKeyAlgorithm::Unknown(99));
    }

    #[test]
    fn test_capability_split() {
        assert!(PublicKeyAlgorithm::RSA.can_sign());
        assert!(PublicKeyAlgorithm::RSA.can_encrypt());
        assert!(!PublicKeyAlgorithm::ECDH.can_sign());
        assert!(!PublicKeyAlgorithm::EdDSA.can_encrypt());
    }
}
