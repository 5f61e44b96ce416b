use byteorder::{BigEndian, WriteBytesExt};
use bytes::{Buf, Bytes};

use crate::errors::Result;

/// Number of bits we accept when reading or writing MPIs.
/// The value is the same as gnupgs.
const MAX_EXTERN_MPI_BITS: u16 = 16384;

/// An OpenPGP multi-precision integer, stored ready to serialize with no
/// leading zeros. The arithmetic on these values happens in the primitive
/// adapters; this type only carries the wire framing.
///
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-3.2>
#[derive(Default, Clone, PartialEq, Eq, derive_more::Debug)]
pub struct Mpi(#[debug("{}", hex::encode(_0))] Bytes);

impl Mpi {
    /// Represent the data in `raw` as an Mpi, stripping leading zeros.
    pub fn from_slice(raw: &[u8]) -> Self {
        Mpi(strip_leading_zeros(raw).to_vec().into())
    }

    /// Parses a length-prefixed MPI out of the given buffer.
    pub fn try_from_buf(i: &mut Bytes) -> Result<Self> {
        ensure!(i.remaining() >= 2, "mpi: missing length prefix");
        let len_bits = i.get_u16();
        ensure!(len_bits <= MAX_EXTERN_MPI_BITS, "mpi too large");

        let len_bytes = usize::from((len_bits + 7) >> 3);
        ensure!(i.remaining() >= len_bytes, "mpi: truncated value");

        let n = i.copy_to_bytes(len_bytes);
        Ok(Mpi(strip_leading_zeros(&n).to_vec().into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Emits the value with its two byte bit-length prefix.
    pub fn to_writer(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_u16::<BigEndian>(bit_size(&self.0) as u16)?;
        out.extend_from_slice(&self.0);
        Ok(())
    }
}

impl AsRef<[u8]> for Mpi {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Returns the bit length of a given slice.
#[inline]
fn bit_size(val: &[u8]) -> usize {
    if val.is_empty() {
        0
    } else {
        (val.len() * 8) - val[0].leading_zeros() as usize
    }
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let offset = bytes.iter().position(|b| b != &0).unwrap_or(bytes.len());
    &bytes[offset..]
}
