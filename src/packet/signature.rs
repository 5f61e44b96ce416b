use byteorder::{BigEndian, WriteBytesExt};
use bytes::Bytes;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use num_enum::{FromPrimitive, IntoPrimitive};
use smallvec::SmallVec;

use crate::crypto::{HashAlgorithm, PublicKeyAlgorithm, SymmetricKeyAlgorithm};
use crate::errors::Result;
use crate::packet::{KeyPacket, UserAttribute, UserId};
use crate::types::{CompressionAlgorithm, KeyId};

/// Signature types.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.2.1>
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SignatureType {
    /// Signature of a binary document.
    Binary = 0x00,
    /// Signature of a canonical text document.
    Text = 0x01,
    /// Standalone signature, over only its own subpacket contents.
    Standalone = 0x02,
    /// Generic certification of a User ID and Public-Key packet.
    CertGeneric = 0x10,
    /// Persona certification of a User ID and Public-Key packet.
    CertPersona = 0x11,
    /// Casual certification of a User ID and Public-Key packet.
    CertCasual = 0x12,
    /// Positive certification of a User ID and Public-Key packet.
    CertPositive = 0x13,
    /// Subkey Binding Signature: issued by the primary key over a subkey.
    SubkeyBinding = 0x18,
    /// Primary Key Binding Signature, issued by a signing subkey.
    KeyBinding = 0x19,
    /// Signature directly on a key.
    Key = 0x1F,
    /// Key revocation signature.
    KeyRevocation = 0x20,
    /// Subkey revocation signature.
    SubkeyRevocation = 0x28,
    /// Certification revocation signature.
    CertRevocation = 0x30,
    /// Timestamp signature.
    Timestamp = 0x40,
    /// Third-Party Confirmation signature.
    ThirdParty = 0x50,

    #[num_enum(catch_all)]
    Other(u8),
}

impl SignatureType {
    /// True for the four certification types binding a user to a key.
    pub fn is_certification(self) -> bool {
        matches!(
            self,
            SignatureType::CertGeneric
                | SignatureType::CertPersona
                | SignatureType::CertCasual
                | SignatureType::CertPositive
        )
    }
}

/// The key flags bit field carried in self-signatures.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.2.3.21>
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KeyFlags(u8);

impl KeyFlags {
    pub const CERTIFY: u8 = 0x01;
    pub const SIGN: u8 = 0x02;
    pub const ENCRYPT_COMMS: u8 = 0x04;
    pub const ENCRYPT_STORAGE: u8 = 0x08;
    pub const SPLIT: u8 = 0x10;
    pub const AUTHENTICATION: u8 = 0x20;
    pub const SHARED: u8 = 0x80;

    pub fn certify(&self) -> bool {
        self.0 & Self::CERTIFY != 0
    }

    pub fn sign(&self) -> bool {
        self.0 & Self::SIGN != 0
    }

    pub fn encrypt_comms(&self) -> bool {
        self.0 & Self::ENCRYPT_COMMS != 0
    }

    pub fn encrypt_storage(&self) -> bool {
        self.0 & Self::ENCRYPT_STORAGE != 0
    }

    pub fn authentication(&self) -> bool {
        self.0 & Self::AUTHENTICATION != 0
    }

    pub fn set_certify(&mut self, value: bool) {
        self.set(Self::CERTIFY, value)
    }

    pub fn set_sign(&mut self, value: bool) {
        self.set(Self::SIGN, value)
    }

    pub fn set_encrypt_comms(&mut self, value: bool) {
        self.set(Self::ENCRYPT_COMMS, value)
    }

    pub fn set_encrypt_storage(&mut self, value: bool) {
        self.set(Self::ENCRYPT_STORAGE, value)
    }

    pub fn set_authentication(&mut self, value: bool) {
        self.set(Self::AUTHENTICATION, value)
    }

    fn set(&mut self, mask: u8, value: bool) {
        if value {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }
}

impl From<u8> for KeyFlags {
    fn from(value: u8) -> Self {
        KeyFlags(value)
    }
}

impl From<KeyFlags> for u8 {
    fn from(value: KeyFlags) -> Self {
        value.0
    }
}

/// A signature packet: binds data to a key and carries the metadata the
/// validation engine evaluates.
///
/// The `verified` and `revoked` caches are explicit, monotonic booleans:
/// they only ever go from `false` to `true`, and they are excluded from
/// equality so that lazily validated copies still compare equal.
#[derive(Debug, Clone)]
pub struct SignaturePacket {
    pub typ: SignatureType,
    pub issuer_key_id: KeyId,
    /// Algorithm of the signing key.
    pub algorithm: PublicKeyAlgorithm,
    pub hash_algorithm: HashAlgorithm,
    pub created: DateTime<Utc>,
    /// Lifetime of the signature itself, in seconds after `created`.
    pub signature_expiration_time: Option<u32>,
    /// Lifetime the signature assigns to the bound key, in seconds after
    /// the key's creation time.
    pub key_expiration_time: Option<u32>,
    pub key_never_expires: Option<bool>,
    /// Primary-user claim with its numeric weight; unset ranks lowest.
    pub is_primary_user_id: Option<u8>,
    pub key_flags: Option<KeyFlags>,
    pub preferred_symmetric_algorithms: SmallVec<[SymmetricKeyAlgorithm; 8]>,
    pub preferred_hash_algorithms: SmallVec<[HashAlgorithm; 8]>,
    pub preferred_compression_algorithms: SmallVec<[CompressionAlgorithm; 8]>,
    pub features: SmallVec<[u8; 1]>,
    /// The raw signature bytes; also the dedup key during merges.
    pub signature: Bytes,

    pub verified: bool,
    pub revoked: bool,
}

impl PartialEq for SignaturePacket {
    fn eq(&self, other: &Self) -> bool {
        // the verified/revoked caches are not part of the identity
        self.typ == other.typ
            && self.issuer_key_id == other.issuer_key_id
            && self.algorithm == other.algorithm
            && self.hash_algorithm == other.hash_algorithm
            && self.created == other.created
            && self.signature_expiration_time == other.signature_expiration_time
            && self.key_expiration_time == other.key_expiration_time
            && self.key_never_expires == other.key_never_expires
            && self.is_primary_user_id == other.is_primary_user_id
            && self.key_flags == other.key_flags
            && self.preferred_symmetric_algorithms == other.preferred_symmetric_algorithms
            && self.preferred_hash_algorithms == other.preferred_hash_algorithms
            && self.preferred_compression_algorithms == other.preferred_compression_algorithms
            && self.features == other.features
            && self.signature == other.signature
    }
}

impl Eq for SignaturePacket {}

impl SignaturePacket {
    /// Whether the signature itself has lapsed at `date`. A signature is
    /// also "expired" before its own creation time.
    pub fn is_expired(&self, date: DateTime<Utc>) -> bool {
        let date = date.trunc_subsecs(0);
        let alive = self.created <= date
            && match self.signature_expiration_time {
                None => true,
                Some(secs) => date < self.created + Duration::seconds(i64::from(secs)),
            };
        !alive
    }

    /// Verify this signature as a signature directly over `key` (key
    /// signatures and key revocations).
    pub fn verify_key(&self, signer: &KeyPacket, key: &KeyPacket) -> Result<()> {
        let data = key_frame(key)?;
        self.verify_payload(signer, &data)
    }

    /// Verify this signature as a binding (or binding revocation) issued
    /// over the (primary, subkey) pair.
    pub fn verify_key_binding(
        &self,
        signer: &KeyPacket,
        primary: &KeyPacket,
        subkey: &KeyPacket,
    ) -> Result<()> {
        let mut data = key_frame(primary)?;
        data.extend_from_slice(&key_frame(subkey)?);
        self.verify_payload(signer, &data)
    }

    /// Verify this signature as a certification (or certification
    /// revocation) over the (signee key, user id) pair.
    pub fn verify_user_id_certificate(
        &self,
        signer: &KeyPacket,
        signee: &KeyPacket,
        id: &UserId,
    ) -> Result<()> {
        let mut data = key_frame(signee)?;
        data.extend_from_slice(&uid_frame(id));
        self.verify_payload(signer, &data)
    }

    /// Like `verify_user_id_certificate`, over an opaque user attribute.
    pub fn verify_user_attribute_certificate(
        &self,
        signer: &KeyPacket,
        signee: &KeyPacket,
        attr: &UserAttribute,
    ) -> Result<()> {
        let mut data = key_frame(signee)?;
        data.extend_from_slice(&attr_frame(attr));
        self.verify_payload(signer, &data)
    }

    fn verify_payload(&self, signer: &KeyPacket, data: &[u8]) -> Result<()> {
        let payload = self.hashed_payload(data)?;
        let digest = self.hash_algorithm.digest(&payload)?;
        signer.verify_digest(self.hash_algorithm, &digest, &self.signature)
    }

    /// The bytes that get hashed: the bound data followed by a fixed
    /// layout trailer binding every metadata field of this signature.
    fn hashed_payload(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut buf = data.to_vec();
        buf.push(0x04);
        buf.push(self.typ.into());
        buf.push(self.algorithm.into());
        buf.push(self.hash_algorithm.into());
        buf.write_u32::<BigEndian>(self.created.timestamp() as u32)?;
        buf.write_u32::<BigEndian>(self.signature_expiration_time.unwrap_or(0))?;
        buf.write_u32::<BigEndian>(self.key_expiration_time.unwrap_or(0))?;
        buf.push(match self.key_never_expires {
            None => 2,
            Some(false) => 0,
            Some(true) => 1,
        });
        match self.is_primary_user_id {
            None => buf.extend_from_slice(&[0, 0]),
            Some(weight) => buf.extend_from_slice(&[1, weight]),
        }
        match self.key_flags {
            None => buf.extend_from_slice(&[0, 0]),
            Some(flags) => buf.extend_from_slice(&[1, flags.into()]),
        }
        buf.push(self.preferred_symmetric_algorithms.len() as u8);
        buf.extend(self.preferred_symmetric_algorithms.iter().map(|a| u8::from(*a)));
        buf.push(self.preferred_hash_algorithms.len() as u8);
        buf.extend(self.preferred_hash_algorithms.iter().map(|a| u8::from(*a)));
        buf.push(self.preferred_compression_algorithms.len() as u8);
        buf.extend(
            self.preferred_compression_algorithms
                .iter()
                .map(|a| u8::from(*a)),
        );
        buf.push(self.features.len() as u8);
        buf.extend_from_slice(&self.features);
        Ok(buf)
    }
}

/// The mutable half of signing: collects the metadata, then signs a
/// target with a secret key packet, producing a [`SignaturePacket`].
#[derive(Debug, Clone)]
pub struct SignatureConfig {
    pub typ: SignatureType,
    pub hash_algorithm: HashAlgorithm,
    pub created: DateTime<Utc>,
    pub signature_expiration_time: Option<u32>,
    pub key_expiration_time: Option<u32>,
    pub key_never_expires: Option<bool>,
    pub is_primary_user_id: Option<u8>,
    pub key_flags: Option<KeyFlags>,
    pub preferred_symmetric_algorithms: SmallVec<[SymmetricKeyAlgorithm; 8]>,
    pub preferred_hash_algorithms: SmallVec<[HashAlgorithm; 8]>,
    pub preferred_compression_algorithms: SmallVec<[CompressionAlgorithm; 8]>,
    pub features: SmallVec<[u8; 1]>,
}

impl SignatureConfig {
    pub fn new(typ: SignatureType, hash_algorithm: HashAlgorithm, created: DateTime<Utc>) -> Self {
        SignatureConfig {
            typ,
            hash_algorithm,
            created: created.trunc_subsecs(0),
            signature_expiration_time: None,
            key_expiration_time: None,
            key_never_expires: None,
            is_primary_user_id: None,
            key_flags: None,
            preferred_symmetric_algorithms: SmallVec::new(),
            preferred_hash_algorithms: SmallVec::new(),
            preferred_compression_algorithms: SmallVec::new(),
            features: SmallVec::new(),
        }
    }

    /// Sign directly over `key` (key signatures, key revocations).
    pub fn sign_key(self, signer: &KeyPacket, key: &KeyPacket) -> Result<SignaturePacket> {
        let data = key_frame(key)?;
        self.sign_payload(signer, &data)
    }

    /// Sign the (primary, subkey) pair (bindings, binding revocations).
    pub fn sign_key_binding(
        self,
        signer: &KeyPacket,
        primary: &KeyPacket,
        subkey: &KeyPacket,
    ) -> Result<SignaturePacket> {
        let mut data = key_frame(primary)?;
        data.extend_from_slice(&key_frame(subkey)?);
        self.sign_payload(signer, &data)
    }

    /// Certify the (signee, user id) pair.
    pub fn sign_user_id_certificate(
        self,
        signer: &KeyPacket,
        signee: &KeyPacket,
        id: &UserId,
    ) -> Result<SignaturePacket> {
        let mut data = key_frame(signee)?;
        data.extend_from_slice(&uid_frame(id));
        self.sign_payload(signer, &data)
    }

    /// Certify the (signee, user attribute) pair.
    pub fn sign_user_attribute_certificate(
        self,
        signer: &KeyPacket,
        signee: &KeyPacket,
        attr: &UserAttribute,
    ) -> Result<SignaturePacket> {
        let mut data = key_frame(signee)?;
        data.extend_from_slice(&attr_frame(attr));
        self.sign_payload(signer, &data)
    }

    fn sign_payload(self, signer: &KeyPacket, data: &[u8]) -> Result<SignaturePacket> {
        let mut packet = SignaturePacket {
            typ: self.typ,
            issuer_key_id: signer.key_id().clone(),
            algorithm: signer.algorithm(),
            hash_algorithm: self.hash_algorithm,
            created: self.created,
            signature_expiration_time: self.signature_expiration_time,
            key_expiration_time: self.key_expiration_time,
            key_never_expires: self.key_never_expires,
            is_primary_user_id: self.is_primary_user_id,
            key_flags: self.key_flags,
            preferred_symmetric_algorithms: self.preferred_symmetric_algorithms,
            preferred_hash_algorithms: self.preferred_hash_algorithms,
            preferred_compression_algorithms: self.preferred_compression_algorithms,
            features: self.features,
            signature: Bytes::new(),
            verified: false,
            revoked: false,
        };

        let payload = packet.hashed_payload(data)?;
        let digest = packet.hash_algorithm.digest(&payload)?;
        packet.signature = signer.sign_digest(packet.hash_algorithm, &digest)?.into();

        Ok(packet)
    }
}

fn key_frame(key: &KeyPacket) -> Result<Vec<u8>> {
    let body = key.write_public_key()?;
    let mut out = Vec::with_capacity(3 + body.len());
    out.push(0x99);
    out.write_u16::<BigEndian>(body.len() as u16)?;
    out.extend_from_slice(&body);
    Ok(out)
}

fn uid_frame(id: &UserId) -> Vec<u8> {
    let bytes = id.id().as_bytes();
    let mut out = Vec::with_capacity(5 + bytes.len());
    out.push(0xB4);
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(bytes);
    out
}

fn attr_frame(attr: &UserAttribute) -> Vec<u8> {
    let bytes = attr.data();
    let mut out = Vec::with_capacity(5 + bytes.len());
    out.push(0xD1);
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(bytes);
    out
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::types::Tag;
    use crate::util;

    fn secret_key(seed: u64) -> KeyPacket {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        KeyPacket::generate(
            &mut rng,
            Tag::SecretKey,
            PublicKeyAlgorithm::EdDSA,
            None,
            None,
            util::now(),
        )
        .expect("keygen")
    }

    #[test]
    fn test_certification_roundtrip() {
        let key = secret_key(1);
        let id = UserId::from_str("Me <me@mail.com>");

        let config = SignatureConfig::new(
            SignatureType::CertGeneric,
            HashAlgorithm::Sha256,
            util::now(),
        );
        let sig = config
            .sign_user_id_certificate(&key, &key, &id)
            .expect("sign");

        assert_eq!(sig.typ, SignatureType::CertGeneric);
        assert_eq!(&sig.issuer_key_id, key.key_id());
        sig.verify_user_id_certificate(&key, &key, &id)
            .expect("verify");

        // a different id must not verify
        let other = UserId::from_str("Mallory <m@mail.com>");
        assert!(sig.verify_user_id_certificate(&key, &key, &other).is_err());
    }

    #[test]
    fn test_metadata_is_bound() {
        let key = secret_key(2);
        let id = UserId::from_str("Me <me@mail.com>");

        let mut config = SignatureConfig::new(
            SignatureType::CertGeneric,
            HashAlgorithm::Sha256,
            util::now(),
        );
        config.key_expiration_time = Some(3600);
        let mut sig = config
            .sign_user_id_certificate(&key, &key, &id)
            .expect("sign");
        sig.verify_user_id_certificate(&key, &key, &id)
            .expect("verify");

        // tampering with bound metadata breaks the signature
        sig.key_expiration_time = Some(7200);
        assert!(sig.verify_user_id_certificate(&key, &key, &id).is_err());
    }

    #[test]
    fn test_binding_roundtrip() {
        let primary = secret_key(3);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let subkey = KeyPacket::generate(
            &mut rng,
            Tag::SecretSubkey,
            PublicKeyAlgorithm::ECDH,
            None,
            Some(&crate::crypto::ECCCurve::Curve25519),
            util::now(),
        )
        .expect("subkey");

        let config = SignatureConfig::new(
            SignatureType::SubkeyBinding,
            HashAlgorithm::Sha256,
            util::now(),
        );
        let sig = config
            .sign_key_binding(&primary, &primary, &subkey)
            .expect("sign");
        sig.verify_key_binding(&primary, &primary, &subkey)
            .expect("verify");

        // swapped roles must fail
        assert!(sig.verify_key_binding(&primary, &subkey, &primary).is_err());
    }

    #[test]
    fn test_is_expired() {
        let key = secret_key(5);
        let created = util::now();
        let mut config = SignatureConfig::new(SignatureType::Key, HashAlgorithm::Sha256, created);
        config.signature_expiration_time = Some(600);
        let sig = config.sign_key(&key, &key).expect("sign");

        assert!(sig.is_expired(created - Duration::seconds(1)));
        assert!(!sig.is_expired(created));
        assert!(!sig.is_expired(created + Duration::seconds(599)));
        assert!(sig.is_expired(created + Duration::seconds(600)));
    }

    #[test]
    fn test_eq_ignores_caches() {
        let key = secret_key(6);
        let config = SignatureConfig::new(SignatureType::Key, HashAlgorithm::Sha256, util::now());
        let sig = config.sign_key(&key, &key).expect("sign");

        let mut verified = sig.clone();
        verified.verified = true;
        verified.revoked = true;
        assert_eq!(sig, verified);
    }
}
