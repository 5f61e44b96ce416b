use bytes::Bytes;
#[allow(unused_imports)]
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::{CryptoRng, Rng};
use signature::hazmat::{PrehashSigner, PrehashVerifier};
use zeroize::Zeroizing;

use crate::crypto::ecc_curve::ECCCurve;
use crate::crypto::left_pad;
use crate::errors::Result;
use crate::types::{Mpi, ParamValue};

/// Generate an ECDSA key pair on the given curve as (public, secret)
/// parameter vectors: `[oid, Q]` and `[d]`. `Q` is the uncompressed SEC1
/// point.
pub fn generate_key<R: Rng + CryptoRng>(
    rng: &mut R,
    curve: &ECCCurve,
) -> Result<(Vec<ParamValue>, Vec<ParamValue>)> {
    let (q, d) = match curve {
        ECCCurve::P256 => {
            let secret = p256::ecdsa::SigningKey::random(rng);
            let point = p256::ecdsa::VerifyingKey::from(&secret).to_encoded_point(false);
            (point.as_bytes().to_vec(), secret.to_bytes().as_slice().to_vec())
        }
        ECCCurve::P384 => {
            let secret = p384::ecdsa::SigningKey::random(rng);
            let point = p384::ecdsa::VerifyingKey::from(&secret).to_encoded_point(false);
            (point.as_bytes().to_vec(), secret.to_bytes().as_slice().to_vec())
        }
        ECCCurve::Secp256k1 => {
            let secret = k256::ecdsa::SigningKey::random(rng);
            let point = k256::ecdsa::VerifyingKey::from(&secret).to_encoded_point(false);
            (point.as_bytes().to_vec(), secret.to_bytes().as_slice().to_vec())
        }
        _ => unsupported_err!("curve {} for ECDSA", curve),
    };

    let pub_params = vec![
        ParamValue::Oid(Bytes::from(curve.oid())),
        ParamValue::Mpi(Mpi::from_slice(&q)),
    ];
    let d = Zeroizing::new(d);
    let secret_params = vec![ParamValue::Mpi(Mpi::from_slice(&d))];

    Ok((pub_params, secret_params))
}

/// Sign a prehashed digest, returning the fixed width `r ‖ s` encoding.
pub fn sign(curve: &ECCCurve, d: &[u8], digest: &[u8]) -> Result<Vec<u8>> {
    let d = Zeroizing::new(left_pad(d, curve.secret_key_length())?);
    let sig = match curve {
        ECCCurve::P256 => {
            let key = p256::ecdsa::SigningKey::from_slice(&d)?;
            let sig: p256::ecdsa::Signature = key.sign_prehash(digest)?;
            sig.to_bytes().as_slice().to_vec()
        }
        ECCCurve::P384 => {
            let key = p384::ecdsa::SigningKey::from_slice(&d)?;
            let sig: p384::ecdsa::Signature = key.sign_prehash(digest)?;
            sig.to_bytes().as_slice().to_vec()
        }
        ECCCurve::Secp256k1 => {
            let key = k256::ecdsa::SigningKey::from_slice(&d)?;
            let sig: k256::ecdsa::Signature = key.sign_prehash(digest)?;
            sig.to_bytes().as_slice().to_vec()
        }
        _ => unsupported_err!("curve {} for ECDSA", curve),
    };

    Ok(sig)
}

/// Verify an ECDSA signature over a prehashed digest.
pub fn verify(curve: &ECCCurve, q: &[u8], hashed: &[u8], sig: &[u8]) -> Result<()> {
    ensure_eq!(q.len(), curve.public_point_length(), "invalid Q (len)");
    ensure_eq!(q[0], 0x04, "invalid Q (prefix)");

    match curve {
        ECCCurve::P256 => {
            let key = p256::ecdsa::VerifyingKey::from_sec1_bytes(q)?;
            let sig = p256::ecdsa::Signature::from_slice(sig)?;
            key.verify_prehash(hashed, &sig)?;
        }
        ECCCurve::P384 => {
            let key = p384::ecdsa::VerifyingKey::from_sec1_bytes(q)?;
            let sig = p384::ecdsa::Signature::from_slice(sig)?;
            key.verify_prehash(hashed, &sig)?;
        }
        ECCCurve::Secp256k1 => {
            let key = k256::ecdsa::VerifyingKey::from_sec1_bytes(q)?;
            let sig = k256::ecdsa::Signature::from_slice(sig)?;
            key.verify_prehash(hashed, &sig)?;
        }
        _ => unsupported_err!("curve {} for ECDSA", curve),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::crypto::hash::HashAlgorithm;

    fn roundtrip(curve: ECCCurve, hash: HashAlgorithm) {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let (pub_params, secret_params) = generate_key(&mut rng, &curve).expect("keygen");

        let q = pub_params[1].as_mpi().expect("q").as_bytes().to_vec();
        let d = secret_params[0].as_mpi().expect("d").as_bytes().to_vec();

        let digest = hash.digest(b"bound data").expect("digest");
        let sig = sign(&curve, &d, &digest).expect("sign");
        verify(&curve, &q, &digest, &sig).expect("verify");

        let other = hash.digest(b"other data").expect("digest");
        assert!(verify(&curve, &q, &other, &sig).is_err());
    }

    #[test]
    fn test_p256() {
        roundtrip(ECCCurve::P256, HashAlgorithm::Sha256);
    }

    #[test]
    fn test_p384() {
        roundtrip(ECCCurve::P384, HashAlgorithm::Sha384);
    }

    #[test]
    fn test_secp256k1() {
        roundtrip(ECCCurve::Secp256k1, HashAlgorithm::Sha256);
    }

    #[test]
    fn test_unsupported_curves() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(generate_key(&mut rng, &ECCCurve::P521).is_err());
        assert!(generate_key(&mut rng, &ECCCurve::BrainpoolP256r1).is_err());
    }
}
