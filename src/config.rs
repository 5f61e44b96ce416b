use crate::crypto::hash::HashAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;

/// Process-wide configuration.
///
/// Established once at startup and treated as immutable by the key engine;
/// every operation that consults it takes `&Config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Hash algorithm to prefer when none is negotiated.
    pub prefer_hash_algorithm: HashAlgorithm,
    /// Symmetric cipher to fall back to when preference negotiation fails.
    pub encryption_cipher: SymmetricKeyAlgorithm,
    /// Whether revocation signatures are subject to their own expiration.
    pub revocations_expire: bool,
    /// Whether generated self-certifications advertise the
    /// modification-detection feature.
    pub integrity_protect: bool,
    /// Hint for outer layers to use platform crypto acceleration.
    pub use_native: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            prefer_hash_algorithm: HashAlgorithm::Sha256,
            encryption_cipher: SymmetricKeyAlgorithm::AES256,
            revocations_expire: false,
            integrity_protect: true,
            use_native: true,
        }
    }
}
