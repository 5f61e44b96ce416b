use crate::errors::Result;
use crate::types::KeyVersion;

/// Represents a Fingerprint.
///
/// OpenPGP fingerprints consist of two pieces of information:
/// the key version, and the binary data of the fingerprint itself.
#[derive(Clone, Eq, Hash, PartialEq, derive_more::Debug, derive_more::Display)]
pub enum Fingerprint {
    #[debug("{}", hex::encode(_0))]
    #[display("{}", hex::encode(_0))]
    V3([u8; 16]),
    #[debug("{}", hex::encode(_0))]
    #[display("{}", hex::encode(_0))]
    V4([u8; 20]),
}

impl Fingerprint {
    /// Constructor for an OpenPGP fingerprint.
    ///
    /// The length of the binary data in `fp` must match the expected length
    /// for `version`, otherwise an error is returned.
    pub fn new(version: KeyVersion, fp: &[u8]) -> Result<Self> {
        let e = |_| {
            format_err!(
                "Illegal fingerprint length {} for key version {:?}",
                fp.len(),
                version
            )
        };

        let fp = match version {
            KeyVersion::V3 => Fingerprint::V3(fp.try_into().map_err(e)?),
            KeyVersion::V4 => Fingerprint::V4(fp.try_into().map_err(e)?),
            KeyVersion::Other(v) => bail!("Unsupported version {}", v),
        };

        Ok(fp)
    }

    /// Returns the length of the fingerprint's binary data.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        match self {
            Self::V3(_) => 16,
            Self::V4(_) => 20,
        }
    }

    /// The key version of the key that this fingerprint references.
    pub fn version(&self) -> KeyVersion {
        match self {
            Self::V3(_) => KeyVersion::V3,
            Self::V4(_) => KeyVersion::V4,
        }
    }

    /// The binary data of this fingerprint.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::V3(fp) => &fp[..],
            Self::V4(fp) => &fp[..],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths() {
        let v4 = Fingerprint::new(KeyVersion::V4, &[0xAB; 20]).expect("v4");
        assert_eq!(v4.len(), 20);
        assert_eq!(v4.version(), KeyVersion::V4);
        assert_eq!(v4.to_string(), "ab".repeat(20));

        assert!(Fingerprint::new(KeyVersion::V4, &[0u8; 16]).is_err());
        assert!(Fingerprint::new(KeyVersion::V3, &[0u8; 16]).is_ok());
    }
}
