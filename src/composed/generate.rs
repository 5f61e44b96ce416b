use chrono::{DateTime, Utc};
use derive_builder::Builder;
use rand::{CryptoRng, Rng};
use smallvec::smallvec;

use crate::composed::key::Key;
use crate::composed::prefs::preferred_hash_algo_for_packet;
use crate::config::Config;
use crate::crypto::{ECCCurve, HashAlgorithm, PublicKeyAlgorithm, SymmetricKeyAlgorithm};
use crate::errors::{Error, Result};
use crate::packet::{
    KeyFlags, KeyPacket, PacketList, SignatureConfig, SignaturePacket, SignatureType, UserId,
};
use crate::types::{CompressionAlgorithm, Tag};
use crate::util;

/// Options for `generate` and `reformat`.
///
/// `key_type`/`subkey_type` default from the chosen curve: the 25519
/// curves imply an EdDSA primary, any other named curve an ECDSA primary,
/// and no curve at all means RSA. Subkeys default to ECDH (RSA for an RSA
/// primary).
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(build_fn(validate = "Self::validate", error = "crate::errors::Error"))]
pub struct KeyOptions {
    #[builder(default)]
    key_type: Option<PublicKeyAlgorithm>,
    #[builder(default)]
    subkey_type: Option<PublicKeyAlgorithm>,
    /// RSA modulus size.
    #[builder(default)]
    num_bits: Option<u32>,
    /// Curve name, resolved through the curve registry.
    #[builder(default)]
    curve: Option<String>,
    /// The first entry becomes the primary user.
    user_ids: Vec<String>,
    #[builder(default)]
    passphrase: Option<String>,
    /// Keep the plain secret parameters in memory after encrypting them.
    /// Implied when no passphrase is given.
    #[builder(default)]
    unlocked: bool,
    /// Key lifetime in seconds; zero or unset means no expiration.
    #[builder(default)]
    key_expiration_time: Option<u32>,
}

impl KeyOptionsBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(user_ids) = &self.user_ids {
            if user_ids.is_empty() {
                return Err("at least one user id is required".into());
            }
        }
        if let Some(Some(bits)) = self.num_bits {
            if bits < 2048 {
                return Err("Keys with less than 2048bits are considered insecure".into());
            }
        }
        Ok(())
    }

    pub fn user_id<VALUE: Into<String>>(&mut self, value: VALUE) -> &mut Self {
        if let Some(ref mut user_ids) = self.user_ids {
            user_ids.push(value.into());
        } else {
            self.user_ids = Some(vec![value.into()]);
        }
        self
    }
}

/// Generate a fresh private key: a certifying/signing primary, an
/// encryption subkey, one self-certification per user id and a subkey
/// binding, optionally locked under a passphrase.
pub fn generate<R: Rng + CryptoRng>(
    rng: &mut R,
    config: &Config,
    opts: KeyOptions,
) -> Result<Key> {
    let curve = match &opts.curve {
        Some(name) => Some(name.parse::<ECCCurve>()?),
        None => None,
    };

    let key_type = match opts.key_type {
        Some(key_type) => key_type,
        None => match &curve {
            Some(ECCCurve::Ed25519) | Some(ECCCurve::Curve25519) => PublicKeyAlgorithm::EdDSA,
            Some(_) => PublicKeyAlgorithm::ECDSA,
            None => PublicKeyAlgorithm::RSA,
        },
    };
    match key_type {
        PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::ECDSA | PublicKeyAlgorithm::EdDSA => {}
        alg => {
            return Err(Error::UnsupportedKeyType {
                message: format!("{:?}", alg),
            })
        }
    }

    let subkey_type = match opts.subkey_type {
        Some(subkey_type) => subkey_type,
        None => match key_type {
            PublicKeyAlgorithm::RSA => PublicKeyAlgorithm::RSA,
            _ => PublicKeyAlgorithm::ECDH,
        },
    };
    match subkey_type {
        PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::ECDH => {}
        alg => {
            return Err(Error::UnsupportedSubkeyType {
                message: format!("{:?}", alg),
            })
        }
    }

    // the 25519 curves come as a fixed pair: Ed25519 signs, Curve25519
    // encrypts, whichever of the two was asked for
    let (primary_curve, subkey_curve) = match curve {
        Some(ECCCurve::Ed25519) | Some(ECCCurve::Curve25519) => {
            (ECCCurve::Ed25519, ECCCurve::Curve25519)
        }
        // no ECDH over secp256k1
        Some(ECCCurve::Secp256k1) => (ECCCurve::Secp256k1, ECCCurve::Curve25519),
        Some(c) => (c.clone(), c),
        None => match key_type {
            PublicKeyAlgorithm::EdDSA => (ECCCurve::Ed25519, ECCCurve::Curve25519),
            _ => (ECCCurve::P256, ECCCurve::P256),
        },
    };

    let created_at = util::now();
    let primary = KeyPacket::generate(
        rng,
        Tag::SecretKey,
        key_type,
        opts.num_bits,
        Some(&primary_curve),
        created_at,
    )?;
    let subkey = KeyPacket::generate(
        rng,
        Tag::SecretSubkey,
        subkey_type,
        opts.num_bits,
        Some(&subkey_curve),
        created_at,
    )?;

    assemble(rng, config, primary, Some(subkey), &opts)
}

/// Re-sign an existing decrypted private key with a new user set,
/// reusing its primary and subkey packets. Only RSA keys are supported.
pub fn reformat<R: Rng + CryptoRng>(
    rng: &mut R,
    config: &Config,
    key: &Key,
    opts: KeyOptions,
) -> Result<Key> {
    if key.primary_key.algorithm() != PublicKeyAlgorithm::RSA {
        return Err(Error::UnsupportedKeyType {
            message: "only RSA keys can be reformatted".to_string(),
        });
    }
    if !key.primary_key.is_decrypted() {
        return Err(Error::NotDecrypted);
    }

    let primary = key.primary_key.clone();
    let subkey = key.subkeys.first().map(|s| s.key.clone());
    if let Some(sub) = &subkey {
        if sub.is_secret() && !sub.is_decrypted() {
            return Err(Error::NotDecrypted);
        }
    }

    assemble(rng, config, primary, subkey, &opts)
}

fn assemble<R: Rng + CryptoRng>(
    rng: &mut R,
    config: &Config,
    mut primary: KeyPacket,
    mut subkey: Option<KeyPacket>,
    opts: &KeyOptions,
) -> Result<Key> {
    let hash_algorithm = preferred_hash_algo_for_packet(config, Some(&primary));
    let now = util::now();

    let mut certified_users: Vec<(UserId, SignaturePacket)> = Vec::new();
    for (n, user_id) in opts.user_ids.iter().enumerate() {
        let id = UserId::from_str(user_id);
        let sig_config =
            certification_config(config, opts, hash_algorithm, now, /* primary */ n == 0);
        let sig = sig_config.sign_user_id_certificate(&primary, &primary, &id)?;
        certified_users.push((id, sig));
    }

    let binding = match &subkey {
        Some(sub) => {
            let mut sig_config =
                SignatureConfig::new(SignatureType::SubkeyBinding, hash_algorithm, now);
            let mut flags = KeyFlags::default();
            flags.set_encrypt_comms(true);
            flags.set_encrypt_storage(true);
            sig_config.key_flags = Some(flags);
            if let Some(secs) = opts.key_expiration_time {
                if secs > 0 {
                    sig_config.key_expiration_time = Some(secs);
                    sig_config.key_never_expires = Some(false);
                }
            }
            Some(sig_config.sign_key_binding(&primary, &primary, sub)?)
        }
        None => None,
    };

    if let Some(passphrase) = &opts.passphrase {
        primary.encrypt(rng, passphrase)?;
        if let Some(sub) = &mut subkey {
            if sub.is_secret() {
                sub.encrypt(rng, passphrase)?;
            }
        }
        if !opts.unlocked {
            primary.clear_private_params()?;
            if let Some(sub) = &mut subkey {
                if sub.is_secret() {
                    sub.clear_private_params()?;
                }
            }
        }
    }

    let mut packets = PacketList::new();
    packets.push(primary);
    for (id, sig) in certified_users {
        packets.push(id);
        packets.push(sig);
    }
    if let (Some(sub), Some(binding)) = (subkey, binding) {
        packets.push(sub);
        packets.push(binding);
    }

    Key::from_packets(packets)
}

fn certification_config(
    config: &Config,
    opts: &KeyOptions,
    hash_algorithm: HashAlgorithm,
    created: DateTime<Utc>,
    primary_user: bool,
) -> SignatureConfig {
    let mut sig_config = SignatureConfig::new(SignatureType::CertGeneric, hash_algorithm, created);

    let mut flags = KeyFlags::default();
    flags.set_certify(true);
    flags.set_sign(true);
    sig_config.key_flags = Some(flags);

    sig_config.preferred_symmetric_algorithms = smallvec![
        SymmetricKeyAlgorithm::AES256,
        SymmetricKeyAlgorithm::AES128,
        SymmetricKeyAlgorithm::AES192,
        SymmetricKeyAlgorithm::CAST5,
        SymmetricKeyAlgorithm::TripleDES,
    ];
    sig_config.preferred_hash_algorithms = smallvec![
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha512,
        HashAlgorithm::Sha1,
    ];
    sig_config.preferred_compression_algorithms =
        smallvec![CompressionAlgorithm::ZLIB, CompressionAlgorithm::ZIP];

    if primary_user {
        sig_config.is_primary_user_id = Some(1);
    }
    if config.integrity_protect {
        // modification detection
        sig_config.features = smallvec![1];
    }
    if let Some(secs) = opts.key_expiration_time {
        if secs > 0 {
            sig_config.key_expiration_time = Some(secs);
            sig_config.key_never_expires = Some(false);
        }
    }

    sig_config
}

impl KeyOptions {
    pub fn user_ids(&self) -> &[String] {
        &self.user_ids
    }

    pub fn passphrase(&self) -> Option<&str> {
        self.passphrase.as_deref()
    }
}
