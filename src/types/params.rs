use bytes::{Buf, Bytes};

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::params::ParamKind;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::Result;
use crate::types::Mpi;

/// One slot of a key packet's algorithm-specific parameter vector.
///
/// The shape of a complete vector is dictated by the per-algorithm tables
/// in [`crate::crypto::params`]; a value parses or emits itself given its
/// [`ParamKind`].
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub enum ParamValue {
    Mpi(Mpi),
    /// DER-encoded curve OID.
    Oid(#[debug("{}", hex::encode(_0))] Bytes),
    /// The ECDH KDF parameter block.
    Kdf {
        hash: HashAlgorithm,
        sym: SymmetricKeyAlgorithm,
    },
    /// Wrapped session key material in an ECDH encrypted session key.
    EcdhSymkey(#[debug("{}", hex::encode(_0))] Bytes),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Mpi(_) => ParamKind::Mpi(""),
            ParamValue::Oid(_) => ParamKind::Oid,
            ParamValue::Kdf { .. } => ParamKind::Kdf,
            ParamValue::EcdhSymkey(_) => ParamKind::EcdhSymkey,
        }
    }

    /// Whether this value fills a slot of the given kind.
    pub fn matches_kind(&self, kind: ParamKind) -> bool {
        match (self, kind) {
            (ParamValue::Mpi(_), ParamKind::Mpi(_)) => true,
            (ParamValue::Oid(_), ParamKind::Oid) => true,
            (ParamValue::Kdf { .. }, ParamKind::Kdf) => true,
            (ParamValue::EcdhSymkey(_), ParamKind::EcdhSymkey) => true,
            _ => false,
        }
    }

    pub fn to_writer(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            ParamValue::Mpi(mpi) => mpi.to_writer(out)?,
            ParamValue::Oid(oid) => {
                ensure!(oid.len() < 256, "oid too long");
                out.push(oid.len() as u8);
                out.extend_from_slice(oid);
            }
            ParamValue::Kdf { hash, sym } => {
                // length, reserved format octet, then the two ids
                out.push(3);
                out.push(1);
                out.push((*hash).into());
                out.push((*sym).into());
            }
            ParamValue::EcdhSymkey(data) => {
                ensure!(data.len() < 256, "symkey blob too long");
                out.push(data.len() as u8);
                out.extend_from_slice(data);
            }
        }
        Ok(())
    }

    /// Parses one value of the given kind out of `buf`.
    pub fn try_from_buf(kind: ParamKind, buf: &mut Bytes) -> Result<Self> {
        match kind {
            ParamKind::Mpi(_) => Ok(ParamValue::Mpi(Mpi::try_from_buf(buf)?)),
            ParamKind::Oid => {
                ensure!(buf.remaining() >= 1, "oid: missing length");
                let len = usize::from(buf.get_u8());
                ensure!(buf.remaining() >= len, "oid: truncated");
                Ok(ParamValue::Oid(buf.copy_to_bytes(len)))
            }
            ParamKind::Kdf => {
                ensure!(buf.remaining() >= 4, "kdf: truncated");
                let len = buf.get_u8();
                ensure_eq!(len, 3, "kdf: unexpected length");
                let _reserved = buf.get_u8();
                let hash = HashAlgorithm::from(buf.get_u8());
                let sym = SymmetricKeyAlgorithm::from(buf.get_u8());
                Ok(ParamValue::Kdf { hash, sym })
            }
            ParamKind::EcdhSymkey => {
                ensure!(buf.remaining() >= 1, "symkey: missing length");
                let len = usize::from(buf.get_u8());
                ensure!(buf.remaining() >= len, "symkey: truncated");
                Ok(ParamValue::EcdhSymkey(buf.copy_to_bytes(len)))
            }
        }
    }

    /// The inner MPI, if this is an MPI slot.
    pub fn as_mpi(&self) -> Option<&Mpi> {
        match self {
            ParamValue::Mpi(mpi) => Some(mpi),
            _ => None,
        }
    }

    /// The inner OID bytes, if this is an OID slot.
    pub fn as_oid(&self) -> Option<&[u8]> {
        match self {
            ParamValue::Oid(oid) => Some(oid),
            _ => None,
        }
    }
}
