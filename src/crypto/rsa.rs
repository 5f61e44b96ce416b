use num_bigint_dig::ModInverse;
use rand::{CryptoRng, Rng};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};

use crate::crypto::hash::HashAlgorithm;
use crate::errors::Result;
use crate::types::{Mpi, ParamValue};

/// Generate an RSA key pair as (public, secret) parameter vectors:
/// `[n, e]` and `[d, p, q, u]`.
pub fn generate_key<R: Rng + CryptoRng>(
    rng: &mut R,
    bit_size: usize,
) -> Result<(Vec<ParamValue>, Vec<ParamValue>)> {
    let key = RsaPrivateKey::new(rng, bit_size)?;

    let p = &key.primes()[0];
    let q = &key.primes()[1];
    // u is the CRT coefficient p^-1 mod q, in OpenPGP parameter order
    let u = p
        .clone()
        .mod_inverse(q)
        .and_then(|v| v.to_biguint())
        .ok_or_else(|| format_err!("invalid prime"))?;

    let pub_params = vec![
        ParamValue::Mpi(Mpi::from_slice(&key.n().to_bytes_be())),
        ParamValue::Mpi(Mpi::from_slice(&key.e().to_bytes_be())),
    ];
    let secret_params = vec![
        ParamValue::Mpi(Mpi::from_slice(&key.d().to_bytes_be())),
        ParamValue::Mpi(Mpi::from_slice(&p.to_bytes_be())),
        ParamValue::Mpi(Mpi::from_slice(&q.to_bytes_be())),
        ParamValue::Mpi(Mpi::from_slice(&u.to_bytes_be())),
    ];

    Ok((pub_params, secret_params))
}

fn pkcs1v15_scheme(hash: HashAlgorithm) -> Result<Pkcs1v15Sign> {
    Ok(match hash {
        HashAlgorithm::Md5 => Pkcs1v15Sign::new::<md5::Md5>(),
        HashAlgorithm::Sha1 => Pkcs1v15Sign::new::<sha1::Sha1>(),
        HashAlgorithm::Ripemd160 => Pkcs1v15Sign::new::<ripemd::Ripemd160>(),
        HashAlgorithm::Sha224 => Pkcs1v15Sign::new::<sha2::Sha224>(),
        HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<sha2::Sha256>(),
        HashAlgorithm::Sha384 => Pkcs1v15Sign::new::<sha2::Sha384>(),
        HashAlgorithm::Sha512 => Pkcs1v15Sign::new::<sha2::Sha512>(),
        _ => unsupported_err!("RSA signing with hash {:?}", hash),
    })
}

/// Sign using RSA, with PKCS1v15 padding.
pub fn sign(
    n: &[u8],
    e: &[u8],
    d: &[u8],
    p: &[u8],
    q: &[u8],
    hash: HashAlgorithm,
    digest: &[u8],
) -> Result<Vec<u8>> {
    let key = RsaPrivateKey::from_components(
        BigUint::from_bytes_be(n),
        BigUint::from_bytes_be(e),
        BigUint::from_bytes_be(d),
        vec![BigUint::from_bytes_be(p), BigUint::from_bytes_be(q)],
    )?;

    let sig = key.sign(pkcs1v15_scheme(hash)?, digest)?;
    Ok(sig)
}

/// Verify an RSA, PKCS1v15 padded signature.
pub fn verify(n: &[u8], e: &[u8], hash: HashAlgorithm, hashed: &[u8], sig: &[u8]) -> Result<()> {
    let key = RsaPublicKey::new(BigUint::from_bytes_be(n), BigUint::from_bytes_be(e))?;
    key.verify(pkcs1v15_scheme(hash)?, hashed, sig)
        .map_err(Into::into)
}
