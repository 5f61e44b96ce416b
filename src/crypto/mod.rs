pub mod ecc_curve;
pub mod ecdh;
pub mod ecdsa;
pub mod eddsa;
pub mod hash;
pub mod params;
pub mod public_key;
pub mod rsa;
pub mod sym;

pub use self::ecc_curve::{ecc_curve_from_oid, ECCCurve};
pub use self::hash::HashAlgorithm;
pub use self::public_key::PublicKeyAlgorithm;
pub use self::sym::SymmetricKeyAlgorithm;

use crate::errors::Result;

/// Restores the leading zero octets an MPI encoding strips.
pub(crate) fn left_pad(value: &[u8], size: usize) -> Result<Vec<u8>> {
    ensure!(value.len() <= size, "invalid field length");
    let mut out = vec![0u8; size - value.len()];
    out.extend_from_slice(value);
    Ok(out)
}
