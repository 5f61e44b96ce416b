use bytes::Bytes;

use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::errors::Result;
use crate::types::ParamValue;

/// Shape of one slot in an algorithm's parameter vector. The static label
/// on MPI slots names the value the way RFC 4880 does (n, e, d, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Mpi(&'static str),
    Oid,
    Kdf,
    EcdhSymkey,
}

/// The ordered parameter shapes of an algorithm's public key material.
pub fn pub_key_param_shapes(alg: PublicKeyAlgorithm) -> Result<&'static [ParamKind]> {
    match alg {
        PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::RSAEncrypt | PublicKeyAlgorithm::RSASign => {
            Ok(&[ParamKind::Mpi("n"), ParamKind::Mpi("e")])
        }
        PublicKeyAlgorithm::Elgamal | PublicKeyAlgorithm::ElgamalSign => Ok(&[
            ParamKind::Mpi("p"),
            ParamKind::Mpi("g"),
            ParamKind::Mpi("y"),
        ]),
        PublicKeyAlgorithm::DSA => Ok(&[
            ParamKind::Mpi("p"),
            ParamKind::Mpi("q"),
            ParamKind::Mpi("g"),
            ParamKind::Mpi("y"),
        ]),
        PublicKeyAlgorithm::ECDSA | PublicKeyAlgorithm::EdDSA => {
            Ok(&[ParamKind::Oid, ParamKind::Mpi("Q")])
        }
        PublicKeyAlgorithm::ECDH => Ok(&[ParamKind::Oid, ParamKind::Mpi("Q"), ParamKind::Kdf]),
        PublicKeyAlgorithm::Unknown(alg) => Err(crate::errors::Error::UnknownAlgorithm { alg }),
    }
}

/// The ordered parameter shapes of an algorithm's secret key material.
pub fn secret_key_param_shapes(alg: PublicKeyAlgorithm) -> Result<&'static [ParamKind]> {
    match alg {
        PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::RSAEncrypt | PublicKeyAlgorithm::RSASign => {
            Ok(&[
                ParamKind::Mpi("d"),
                ParamKind::Mpi("p"),
                ParamKind::Mpi("q"),
                ParamKind::Mpi("u"),
            ])
        }
        PublicKeyAlgorithm::Elgamal | PublicKeyAlgorithm::ElgamalSign | PublicKeyAlgorithm::DSA => {
            Ok(&[ParamKind::Mpi("x")])
        }
        PublicKeyAlgorithm::ECDSA | PublicKeyAlgorithm::EdDSA | PublicKeyAlgorithm::ECDH => {
            Ok(&[ParamKind::Mpi("d")])
        }
        PublicKeyAlgorithm::Unknown(alg) => Err(crate::errors::Error::UnknownAlgorithm { alg }),
    }
}

/// The ordered parameter shapes of an algorithm's encrypted session key.
/// Sign-only algorithms carry none and report `Unsupported`.
pub fn session_key_param_shapes(alg: PublicKeyAlgorithm) -> Result<&'static [ParamKind]> {
    match alg {
        PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::RSAEncrypt | PublicKeyAlgorithm::RSASign => {
            Ok(&[ParamKind::Mpi("c")])
        }
        PublicKeyAlgorithm::Elgamal | PublicKeyAlgorithm::ElgamalSign => {
            Ok(&[ParamKind::Mpi("c1"), ParamKind::Mpi("c2")])
        }
        PublicKeyAlgorithm::ECDH => Ok(&[ParamKind::Mpi("V"), ParamKind::EcdhSymkey]),
        PublicKeyAlgorithm::DSA | PublicKeyAlgorithm::ECDSA | PublicKeyAlgorithm::EdDSA => {
            unsupported_err!("no session key shape for {:?}", alg)
        }
        PublicKeyAlgorithm::Unknown(alg) => Err(crate::errors::Error::UnknownAlgorithm { alg }),
    }
}

/// Emits a parameter vector, checking it against the expected shapes.
pub fn emit_params(shapes: &[ParamKind], values: &[ParamValue]) -> Result<Vec<u8>> {
    ensure_eq!(shapes.len(), values.len(), "parameter count mismatch");
    let mut out = Vec::new();
    for (kind, value) in shapes.iter().zip(values) {
        ensure!(
            value.matches_kind(*kind),
            "parameter shape mismatch: expected {:?}, got {:?}",
            kind,
            value.kind()
        );
        value.to_writer(&mut out)?;
    }
    Ok(out)
}

/// Parses a parameter vector of the given shapes out of `data`, requiring
/// the buffer to be fully consumed.
pub fn parse_params(shapes: &[ParamKind], data: &[u8]) -> Result<Vec<ParamValue>> {
    let mut buf = Bytes::from(data.to_vec());
    let mut values = Vec::with_capacity(shapes.len());
    for kind in shapes {
        values.push(ParamValue::try_from_buf(*kind, &mut buf)?);
    }
    ensure!(buf.is_empty(), "trailing bytes after parameter vector");
    Ok(values)
}
