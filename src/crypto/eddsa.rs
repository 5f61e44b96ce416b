//! EdDSA over Ed25519 for OpenPGP.
//!
//! OpenPGP frames the public point as `0x40 ‖ compressed point` inside an
//! MPI; the secret scalar is a plain 32 byte MPI. Signatures are the 64
//! byte `R ‖ S` concatenation.

use bytes::Bytes;
use rand::{CryptoRng, Rng};
use signature::{Signer as _, Verifier as _};
use zeroize::Zeroizing;

use crate::crypto::ecc_curve::ECCCurve;
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::left_pad;
use crate::errors::Result;
use crate::types::{Mpi, ParamValue};

/// Generate an EdDSA key pair as (public, secret) parameter vectors:
/// `[oid, Q]` and `[d]`.
pub fn generate_key<R: Rng + CryptoRng>(
    rng: &mut R,
) -> Result<(Vec<ParamValue>, Vec<ParamValue>)> {
    let mut bytes = Zeroizing::new([0u8; ed25519_dalek::SECRET_KEY_LENGTH]);
    rng.fill_bytes(&mut *bytes);
    let secret = ed25519_dalek::SigningKey::from_bytes(&bytes);

    let mut q = Vec::with_capacity(33);
    q.push(0x40);
    q.extend_from_slice(secret.verifying_key().as_bytes());

    let pub_params = vec![
        ParamValue::Oid(Bytes::from(ECCCurve::Ed25519.oid())),
        ParamValue::Mpi(Mpi::from_slice(&q)),
    ];
    let secret_params = vec![ParamValue::Mpi(Mpi::from_slice(secret.as_bytes()))];

    Ok((pub_params, secret_params))
}

/// Sign the given digest, returning the 64 byte `R ‖ S` signature.
pub fn sign(d: &[u8], digest: &[u8]) -> Result<Vec<u8>> {
    let raw = Zeroizing::new(left_pad(d, ed25519_dalek::SECRET_KEY_LENGTH)?);
    let bytes: [u8; 32] = raw
        .as_slice()
        .try_into()
        .map_err(|_| format_err!("invalid EdDSA secret length"))?;
    let secret = ed25519_dalek::SigningKey::from_bytes(&bytes);

    let signature = secret.sign(digest);
    Ok(signature.to_bytes().to_vec())
}

/// Verify an EdDSA signature.
pub fn verify(q: &[u8], hash: HashAlgorithm, hashed: &[u8], sig_bytes: &[u8]) -> Result<()> {
    ensure!(
        hash.digest_size() * 8 >= 256,
        "EdDSA signature: hash algorithm {:?} is too weak for Ed25519",
        hash,
    );
    ensure_eq!(q.len(), 33, "invalid Q (len)");
    ensure_eq!(q[0], 0x40, "invalid Q (prefix)");

    let pk_bytes: [u8; 32] = q[1..]
        .try_into()
        .map_err(|_| format_err!("invalid EdDSA point length"))?;
    let key = ed25519_dalek::VerifyingKey::from_bytes(&pk_bytes)?;

    let sig: ed25519_dalek::Signature = sig_bytes.try_into()?;

    Ok(key.verify(hashed, &sig)?)
}
