use std::fmt;
use std::str::FromStr;

use const_oid::ObjectIdentifier;
use snafu::GenerateImplicitData;

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::Error;

/// The named curves of the ECC registry, plus a fallback for OIDs we can
/// carry but not operate on.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ECCCurve {
    Curve25519,
    Ed25519,
    P256,
    P384,
    P521,
    BrainpoolP256r1,
    BrainpoolP384r1,
    BrainpoolP512r1,
    Secp256k1,
    Unknown(ObjectIdentifier),
}

impl ECCCurve {
    /// Standard name
    pub fn name(&self) -> &str {
        match self {
            ECCCurve::Curve25519 => "Curve25519",
            ECCCurve::Ed25519 => "Ed25519",
            ECCCurve::P256 => "NIST P-256",
            ECCCurve::P384 => "NIST P-384",
            ECCCurve::P521 => "NIST P-521",
            ECCCurve::BrainpoolP256r1 => "brainpoolP256r1",
            ECCCurve::BrainpoolP384r1 => "brainpoolP384r1",
            ECCCurve::BrainpoolP512r1 => "brainpoolP512r1",
            ECCCurve::Secp256k1 => "secp256k1",
            ECCCurve::Unknown(_oid) => "unknown",
        }
    }

    /// IETF formatted OID
    pub fn oid_str(&self) -> String {
        match self {
            ECCCurve::Curve25519 => "1.3.6.1.4.1.3029.1.5.1".into(),
            ECCCurve::Ed25519 => "1.3.6.1.4.1.11591.15.1".into(),
            ECCCurve::P256 => "1.2.840.10045.3.1.7".into(),
            ECCCurve::P384 => "1.3.132.0.34".into(),
            ECCCurve::P521 => "1.3.132.0.35".into(),
            ECCCurve::BrainpoolP256r1 => "1.3.36.3.3.2.8.1.1.7".into(),
            ECCCurve::BrainpoolP384r1 => "1.3.36.3.3.2.8.1.1.11".into(),
            ECCCurve::BrainpoolP512r1 => "1.3.36.3.3.2.8.1.1.13".into(),
            ECCCurve::Secp256k1 => "1.3.132.0.10".into(),
            ECCCurve::Unknown(oid) => oid.to_string(),
        }
    }

    /// Alternative name of the curve
    pub fn alias(&self) -> Option<&str> {
        match self {
            ECCCurve::Curve25519 => Some("cv25519"),
            ECCCurve::Ed25519 => Some("ed25519"),
            ECCCurve::P256 => Some("nistp256"),
            ECCCurve::P384 => Some("nistp384"),
            ECCCurve::P521 => Some("nistp521"),
            _ => None,
        }
    }

    /// Nominal bit length of the curve
    pub fn nbits(&self) -> u16 {
        match self {
            ECCCurve::Curve25519 => 255,
            ECCCurve::Ed25519 => 255,
            ECCCurve::P256 => 256,
            ECCCurve::P384 => 384,
            ECCCurve::P521 => 521,
            ECCCurve::BrainpoolP256r1 => 256,
            ECCCurve::BrainpoolP384r1 => 384,
            ECCCurve::BrainpoolP512r1 => 512,
            ECCCurve::Secp256k1 => 256,
            ECCCurve::Unknown(_oid) => 0,
        }
    }

    /// Key category: the algorithm this curve is locked to, or `None` for
    /// curves usable with both ECDSA and ECDH.
    pub fn pubkey_algo(&self) -> Option<PublicKeyAlgorithm> {
        match self {
            ECCCurve::Curve25519 => Some(PublicKeyAlgorithm::ECDH),
            ECCCurve::Ed25519 => Some(PublicKeyAlgorithm::EdDSA),
            _ => None,
        }
    }

    /// The hash this curve prefers; the negotiation in
    /// [`crate::composed::preferred_hash_algo`] treats it as a floor.
    pub fn hash_algo(&self) -> HashAlgorithm {
        match self {
            ECCCurve::Curve25519 => HashAlgorithm::Sha256,
            ECCCurve::Ed25519 => HashAlgorithm::Sha512,
            ECCCurve::P256 => HashAlgorithm::Sha256,
            ECCCurve::P384 => HashAlgorithm::Sha384,
            ECCCurve::P521 => HashAlgorithm::Sha512,
            ECCCurve::BrainpoolP256r1 => HashAlgorithm::Sha256,
            ECCCurve::BrainpoolP384r1 => HashAlgorithm::Sha384,
            ECCCurve::BrainpoolP512r1 => HashAlgorithm::Sha512,
            ECCCurve::Secp256k1 => HashAlgorithm::Sha256,
            ECCCurve::Unknown(_oid) => HashAlgorithm::Sha256,
        }
    }

    /// The symmetric cipher paired with this curve in ECDH KDF parameters.
    pub fn sym_algo(&self) -> SymmetricKeyAlgorithm {
        match self {
            ECCCurve::Curve25519 => SymmetricKeyAlgorithm::AES128,
            ECCCurve::Ed25519 => SymmetricKeyAlgorithm::AES128,
            ECCCurve::P256 => SymmetricKeyAlgorithm::AES128,
            ECCCurve::P384 => SymmetricKeyAlgorithm::AES192,
            ECCCurve::P521 => SymmetricKeyAlgorithm::AES256,
            ECCCurve::BrainpoolP256r1 => SymmetricKeyAlgorithm::AES128,
            ECCCurve::BrainpoolP384r1 => SymmetricKeyAlgorithm::AES192,
            ECCCurve::BrainpoolP512r1 => SymmetricKeyAlgorithm::AES256,
            ECCCurve::Secp256k1 => SymmetricKeyAlgorithm::AES128,
            ECCCurve::Unknown(_oid) => SymmetricKeyAlgorithm::AES128,
        }
    }

    /// Byte length of the secret scalar.
    pub fn secret_key_length(&self) -> usize {
        match self {
            ECCCurve::Curve25519 => 32,
            ECCCurve::Ed25519 => 32,
            ECCCurve::P256 => 32,
            ECCCurve::P384 => 48,
            ECCCurve::P521 => 66,
            ECCCurve::BrainpoolP256r1 => 32,
            ECCCurve::BrainpoolP384r1 => 48,
            ECCCurve::BrainpoolP512r1 => 64,
            ECCCurve::Secp256k1 => 32,
            ECCCurve::Unknown(_oid) => 0,
        }
    }

    /// Byte length of the encoded public point, including its prefix octet
    /// (`0x04` uncompressed SEC1, `0x40` native for the 25519 curves).
    pub fn public_point_length(&self) -> usize {
        match self {
            ECCCurve::Curve25519 => 33,
            ECCCurve::Ed25519 => 33,
            ECCCurve::P256 => 65,
            ECCCurve::P384 => 97,
            ECCCurve::P521 => 133,
            ECCCurve::BrainpoolP256r1 => 65,
            ECCCurve::BrainpoolP384r1 => 97,
            ECCCurve::BrainpoolP512r1 => 129,
            ECCCurve::Secp256k1 => 65,
            ECCCurve::Unknown(_oid) => 0,
        }
    }

    /// The DER encoded OID bytes, the canonical on-wire representation.
    pub fn oid(&self) -> Vec<u8> {
        // the OID String is turned into bytes
        // with the first two numbers combined
        let mut id: Vec<u32> = self
            .oid_str()
            .split('.')
            // safe as we hard coded these
            .map(|v| v.parse::<u32>().expect("bad oid string"))
            .collect();

        // combine the first two
        let first = id.remove(0) * 40 + id.remove(0);
        id.insert(0, first);

        id.iter()
            .flat_map(|ident| asn1_der_object_id_val_enc(*ident))
            .collect()
    }
}

/// Get the right curve given an oid.
pub fn ecc_curve_from_oid(oid: &[u8]) -> Option<ECCCurve> {
    let known = [
        ECCCurve::Curve25519,
        ECCCurve::Ed25519,
        ECCCurve::P256,
        ECCCurve::P384,
        ECCCurve::P521,
        ECCCurve::BrainpoolP256r1,
        ECCCurve::BrainpoolP384r1,
        ECCCurve::BrainpoolP512r1,
        ECCCurve::Secp256k1,
    ];
    for curve in known {
        if curve.oid().as_slice() == oid {
            return Some(curve);
        }
    }

    if let Ok(oid) = ObjectIdentifier::from_bytes(oid) {
        Some(ECCCurve::Unknown(oid))
    } else {
        None
    }
}

impl FromStr for ECCCurve {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "curve25519" | "cv25519" => Ok(ECCCurve::Curve25519),
            "ed25519" => Ok(ECCCurve::Ed25519),
            "p256" | "p-256" | "nist p-256" | "nistp256" | "prime256v1" | "secp256r1" => {
                Ok(ECCCurve::P256)
            }
            "p384" | "p-384" | "nist p-384" | "nistp384" | "secp384r1" => Ok(ECCCurve::P384),
            "p521" | "p-521" | "nist p-521" | "nistp521" | "secp521r1" => Ok(ECCCurve::P521),
            "secp256k1" => Ok(ECCCurve::Secp256k1),
            "brainpoolp256r1" => Ok(ECCCurve::BrainpoolP256r1),
            "brainpoolp384r1" => Ok(ECCCurve::BrainpoolP384r1),
            "brainpoolp512r1" => Ok(ECCCurve::BrainpoolP512r1),
            _ => Err(Error::UnknownCurve {
                name: s.to_string(),
                backtrace: Some(GenerateImplicitData::generate()),
            }),
        }
    }
}

impl fmt::Display for ECCCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn asn1_der_object_id_val_enc(val: u32) -> Vec<u8> {
    let mut val = val;
    let mut acc = vec![(val & 0x7f) as u8];
    val >>= 7;

    while val > 0 {
        acc.insert(0, (0x80 | (val & 0x7f)) as u8);
        val >>= 7;
    }

    acc
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_ecc_curve_to_oid() {
        assert_eq!(
            ECCCurve::P256.oid(),
            vec![0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07]
        );
        assert_eq!(ECCCurve::P384.oid(), vec![0x2B, 0x81, 0x04, 0x00, 0x22]);
        assert_eq!(ECCCurve::P521.oid(), vec![0x2B, 0x81, 0x04, 0x00, 0x23]);
        assert_eq!(
            ECCCurve::Ed25519.oid(),
            vec![0x2B, 0x06, 0x01, 0x04, 0x01, 0xDA, 0x47, 0x0F, 0x01]
        );
        assert_eq!(
            ECCCurve::Curve25519.oid(),
            vec![0x2B, 0x06, 0x01, 0x04, 0x01, 0x97, 0x55, 0x01, 0x05, 0x01]
        );
        assert_eq!(
            ECCCurve::Secp256k1.oid(),
            vec![0x2B, 0x81, 0x04, 0x00, 0x0A]
        );
        assert_eq!(
            ECCCurve::BrainpoolP256r1.oid(),
            vec![0x2B, 0x24, 0x03, 0x03, 0x02, 0x08, 0x01, 0x01, 0x07]
        );
    }

    #[test]
    fn test_ecc_curve_from_oid() {
        let one = vec![0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07];
        assert_eq!(ecc_curve_from_oid(one.as_slice()).unwrap(), ECCCurve::P256);

        assert_eq!(
            ecc_curve_from_oid(vec![1, 2, 3].as_slice()),
            Some(ECCCurve::Unknown(
                ObjectIdentifier::from_bytes(&[1, 2, 3]).unwrap()
            ))
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!("ed25519".parse::<ECCCurve>().unwrap(), ECCCurve::Ed25519);
        assert_eq!("P-256".parse::<ECCCurve>().unwrap(), ECCCurve::P256);
        assert_eq!(
            "brainpoolP512r1".parse::<ECCCurve>().unwrap(),
            ECCCurve::BrainpoolP512r1
        );
        assert!(matches!(
            "wiggly25519".parse::<ECCCurve>(),
            Err(Error::UnknownCurve { .. })
        ));
    }

    #[test]
    fn test_category_and_pairings() {
        assert_eq!(
            ECCCurve::Ed25519.pubkey_algo(),
            Some(PublicKeyAlgorithm::EdDSA)
        );
        assert_eq!(
            ECCCurve::Curve25519.pubkey_algo(),
            Some(PublicKeyAlgorithm::ECDH)
        );
        assert_eq!(ECCCurve::P384.pubkey_algo(), None);

        assert_eq!(ECCCurve::P384.hash_algo(), HashAlgorithm::Sha384);
        assert_eq!(ECCCurve::P521.sym_algo(), SymmetricKeyAlgorithm::AES256);
        assert_eq!(ECCCurve::P521.secret_key_length(), 66);
        assert_eq!(ECCCurve::Curve25519.public_point_length(), 33);
    }

    #[test]
    fn test_asn1_der_object_id_val_enc() {
        assert_eq!(asn1_der_object_id_val_enc(840), vec![0x86, 0x48]);
        assert_eq!(asn1_der_object_id_val_enc(113_549), vec![0x86, 0xf7, 0x0d]);
    }
}
