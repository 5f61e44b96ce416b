use bytes::Bytes;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::{CryptoRng, Rng};
use zeroize::Zeroizing;

use crate::crypto::ecc_curve::ECCCurve;
use crate::errors::Result;
use crate::types::{Mpi, ParamValue};

/// Generate an ECDH key pair on the given curve as (public, secret)
/// parameter vectors: `[oid, Q, kdf]` and `[d]`.
///
/// The KDF block carries the curve's preferred hash/cipher pairing. The
/// actual session-key agreement lives outside this crate; only the key
/// material shapes are produced here.
pub fn generate_key<R: Rng + CryptoRng>(
    rng: &mut R,
    curve: &ECCCurve,
) -> Result<(Vec<ParamValue>, Vec<ParamValue>)> {
    let (q, d) = match curve {
        ECCCurve::Curve25519 => {
            let secret = x25519_dalek::StaticSecret::random_from_rng(&mut *rng);
            let public = x25519_dalek::PublicKey::from(&secret);

            let mut q = Vec::with_capacity(33);
            q.push(0x40);
            q.extend_from_slice(public.as_bytes());

            // OpenPGP stores the scalar as a big-endian MPI
            let mut d = secret.to_bytes();
            d.reverse();
            (q, d.to_vec())
        }
        ECCCurve::P256 => {
            let secret = p256::SecretKey::random(rng);
            let point = secret.public_key().to_encoded_point(false);
            (point.as_bytes().to_vec(), secret.to_bytes().as_slice().to_vec())
        }
        ECCCurve::P384 => {
            let secret = p384::SecretKey::random(rng);
            let point = secret.public_key().to_encoded_point(false);
            (point.as_bytes().to_vec(), secret.to_bytes().as_slice().to_vec())
        }
        _ => unsupported_err!("curve {} for ECDH", curve),
    };

    let pub_params = vec![
        ParamValue::Oid(Bytes::from(curve.oid())),
        ParamValue::Mpi(Mpi::from_slice(&q)),
        ParamValue::Kdf {
            hash: curve.hash_algo(),
            sym: curve.sym_algo(),
        },
    ];
    let d = Zeroizing::new(d);
    let secret_params = vec![ParamValue::Mpi(Mpi::from_slice(&d))];

    Ok((pub_params, secret_params))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::crypto::hash::HashAlgorithm;
    use crate::crypto::sym::SymmetricKeyAlgorithm;

    #[test]
    fn test_curve25519_shape() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let (pub_params, secret_params) =
            generate_key(&mut rng, &ECCCurve::Curve25519).expect("keygen");

        assert_eq!(pub_params[0].as_oid().expect("oid"), &ECCCurve::Curve25519.oid()[..]);
        let q = pub_params[1].as_mpi().expect("q");
        assert_eq!(q.len(), 33);
        assert_eq!(q.as_bytes()[0], 0x40);
        assert_eq!(
            pub_params[2],
            ParamValue::Kdf {
                hash: HashAlgorithm::Sha256,
                sym: SymmetricKeyAlgorithm::AES128,
            }
        );
        assert_eq!(secret_params.len(), 1);
    }

    #[test]
    fn test_nist_shape() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let (pub_params, _) = generate_key(&mut rng, &ECCCurve::P384).expect("keygen");

        let q = pub_params[1].as_mpi().expect("q");
        assert_eq!(q.len(), 97);
        assert_eq!(q.as_bytes()[0], 0x04);
        assert_eq!(
            pub_params[2],
            ParamValue::Kdf {
                hash: HashAlgorithm::Sha384,
                sym: SymmetricKeyAlgorithm::AES192,
            }
        );
    }

    #[test]
    fn test_unsupported() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(generate_key(&mut rng, &ECCCurve::Secp256k1).is_err());
        assert!(generate_key(&mut rng, &ECCCurve::P521).is_err());
    }
}
