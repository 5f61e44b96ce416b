use log::warn;
use rand::{CryptoRng, Rng};

use crate::errors::{Error, InvalidKeySnafu, MalformedArmorSnafu, Result};
use crate::packet::{KeyPacket, Packet, PacketList, SignaturePacket, UserAttribute, UserId};
use crate::types::{BlockType, Fingerprint, KeyId, Tag};

/// The identity a [`User`] is built around: exactly one of a textual
/// user id or an opaque user attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserBody {
    Id(UserId),
    Attribute(UserAttribute),
}

impl UserBody {
    pub fn id(&self) -> Option<&UserId> {
        match self {
            UserBody::Id(id) => Some(id),
            UserBody::Attribute(_) => None,
        }
    }

    pub fn attribute(&self) -> Option<&UserAttribute> {
        match self {
            UserBody::Id(_) => None,
            UserBody::Attribute(attr) => Some(attr),
        }
    }

    pub fn tag(&self) -> Tag {
        match self {
            UserBody::Id(_) => Tag::UserId,
            UserBody::Attribute(_) => Tag::UserAttribute,
        }
    }
}

/// A user of a key, with the certifications over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub body: UserBody,
    /// Certifications issued by the key's own primary key.
    pub self_certifications: Vec<SignaturePacket>,
    /// Certifications issued by third-party keys.
    pub other_certifications: Vec<SignaturePacket>,
    /// Revocations of certifications on this user.
    pub revocation_signatures: Vec<SignaturePacket>,
}

impl User {
    pub fn new(body: UserBody) -> Self {
        User {
            body,
            self_certifications: Vec::new(),
            other_certifications: Vec::new(),
            revocation_signatures: Vec::new(),
        }
    }
}

/// A subkey with its binding signatures. Every binding signature's issuer
/// is the primary key of the enclosing [`Key`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubKey {
    pub key: KeyPacket,
    pub binding_signatures: Vec<SignaturePacket>,
    pub revocation_signatures: Vec<SignaturePacket>,
}

impl SubKey {
    pub fn new(key: KeyPacket) -> Self {
        SubKey {
            key,
            binding_signatures: Vec::new(),
            revocation_signatures: Vec::new(),
        }
    }
}

/// A transferable OpenPGP key: the primary key packet, the signatures
/// directly over it, its users and its subkeys.
///
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-11.1>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub primary_key: KeyPacket,
    /// Key revocation signatures over the primary key.
    pub revocation_signatures: Vec<SignaturePacket>,
    /// Key signatures over the primary key without a user binding.
    pub direct_signatures: Vec<SignaturePacket>,
    pub users: Vec<User>,
    pub subkeys: Vec<SubKey>,
}

impl Key {
    /// Build the key tree out of an ordered packet sequence.
    ///
    /// Signatures attach to the most recent user or subkey packet;
    /// signatures with no valid anchor are dropped with a warning.
    pub fn from_packets(packets: PacketList) -> Result<Key> {
        let mut primary: Option<KeyPacket> = None;
        let mut revocation_signatures = Vec::new();
        let mut direct_signatures = Vec::new();
        let mut users: Vec<User> = Vec::new();
        let mut subkeys: Vec<SubKey> = Vec::new();

        let mut current_user: Option<usize> = None;
        let mut current_subkey: Option<usize> = None;

        for packet in packets {
            match packet {
                Packet::Key(key) if !key.tag().is_subkey_tag() => {
                    if primary.is_some() {
                        return Err(InvalidKeySnafu {
                            message: "packet block contains multiple primary keys",
                        }
                        .build());
                    }
                    primary = Some(key);
                }
                Packet::Key(key) => {
                    subkeys.push(SubKey::new(key));
                    current_user = None;
                    current_subkey = Some(subkeys.len() - 1);
                }
                Packet::UserId(id) => {
                    users.push(User::new(UserBody::Id(id)));
                    current_subkey = None;
                    current_user = Some(users.len() - 1);
                }
                Packet::UserAttribute(attr) => {
                    users.push(User::new(UserBody::Attribute(attr)));
                    current_subkey = None;
                    current_user = Some(users.len() - 1);
                }
                Packet::Signature(sig) => {
                    use crate::packet::SignatureType;
                    match sig.typ {
                        typ if typ.is_certification() => match current_user {
                            Some(i) => {
                                let from_primary = primary
                                    .as_ref()
                                    .is_some_and(|p| p.key_id() == &sig.issuer_key_id);
                                if from_primary {
                                    users[i].self_certifications.push(sig);
                                } else {
                                    users[i].other_certifications.push(sig);
                                }
                            }
                            None => {
                                warn!("dropping certification without a preceding user packet");
                            }
                        },
                        SignatureType::CertRevocation => match current_user {
                            Some(i) => users[i].revocation_signatures.push(sig),
                            None => direct_signatures.push(sig),
                        },
                        SignatureType::Key => direct_signatures.push(sig),
                        SignatureType::SubkeyBinding => match current_subkey {
                            Some(i) => subkeys[i].binding_signatures.push(sig),
                            None => {
                                warn!("dropping subkey binding without a preceding subkey packet");
                            }
                        },
                        SignatureType::KeyRevocation => revocation_signatures.push(sig),
                        SignatureType::SubkeyRevocation => match current_subkey {
                            Some(i) => subkeys[i].revocation_signatures.push(sig),
                            None => {
                                warn!(
                                    "dropping subkey revocation without a preceding subkey packet"
                                );
                            }
                        },
                        typ => warn!("dropping signature of unexpected type {:?}", typ),
                    }
                }
            }
        }

        let primary_key = primary.ok_or_else(|| {
            InvalidKeySnafu {
                message: "missing primary key packet",
            }
            .build()
        })?;
        if users.is_empty() {
            return Err(InvalidKeySnafu {
                message: "missing user ids",
            }
            .build());
        }

        Ok(Key {
            primary_key,
            revocation_signatures,
            direct_signatures,
            users,
            subkeys,
        })
    }

    /// Emit the canonical packet order: primary key, key revocations,
    /// direct signatures, then each user (packet, revocations, self
    /// certifications, other certifications), then each subkey (packet,
    /// revocations, bindings). `from_packets` inverts this exactly.
    pub fn to_packet_list(&self) -> PacketList {
        let mut list = PacketList::new();
        list.push(self.primary_key.clone());
        for sig in &self.revocation_signatures {
            list.push(sig.clone());
        }
        for sig in &self.direct_signatures {
            list.push(sig.clone());
        }
        for user in &self.users {
            match &user.body {
                UserBody::Id(id) => list.push(id.clone()),
                UserBody::Attribute(attr) => list.push(attr.clone()),
            }
            for sig in &user.revocation_signatures {
                list.push(sig.clone());
            }
            for sig in &user.self_certifications {
                list.push(sig.clone());
            }
            for sig in &user.other_certifications {
                list.push(sig.clone());
            }
        }
        for subkey in &self.subkeys {
            list.push(subkey.key.clone());
            for sig in &subkey.revocation_signatures {
                list.push(sig.clone());
            }
            for sig in &subkey.binding_signatures {
                list.push(sig.clone());
            }
        }
        list
    }

    pub fn is_public(&self) -> bool {
        !self.primary_key.is_secret()
    }

    pub fn is_private(&self) -> bool {
        self.primary_key.is_secret()
    }

    /// A copy of this key with every key packet converted to its public
    /// variant and all secret material dropped.
    pub fn to_public(&self) -> Key {
        let mut key = self.clone();
        key.primary_key = key.primary_key.to_public();
        for subkey in &mut key.subkeys {
            subkey.key = subkey.key.to_public();
        }
        key
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        self.primary_key.fingerprint()
    }

    pub fn key_id(&self) -> &KeyId {
        self.primary_key.key_id()
    }

    /// The key ids of the primary key and every subkey, in order.
    pub fn key_ids(&self) -> Vec<KeyId> {
        let mut ids = vec![self.primary_key.key_id().clone()];
        ids.extend(self.subkeys.iter().map(|s| s.key.key_id().clone()));
        ids
    }

    /// The textual ids of all users carrying one.
    pub fn user_ids(&self) -> Vec<String> {
        self.users
            .iter()
            .filter_map(|u| u.body.id().map(|id| id.id().to_string()))
            .collect()
    }

    /// Whether the primary secret material is present in usable form.
    pub fn is_decrypted(&self) -> bool {
        self.primary_key.is_decrypted()
    }

    /// Lock all secret packets under the passphrase.
    pub fn encrypt_secrets<R: Rng + CryptoRng>(
        &mut self,
        rng: &mut R,
        passphrase: &str,
    ) -> Result<()> {
        if !self.is_private() {
            return Err(Error::NothingToEncrypt);
        }
        self.primary_key.encrypt(rng, passphrase)?;
        for subkey in &mut self.subkeys {
            if subkey.key.is_secret() {
                subkey.key.encrypt(rng, passphrase)?;
            }
        }
        Ok(())
    }

    /// Unlock all secret packets with the passphrase.
    pub fn decrypt_secrets(&mut self, passphrase: &str) -> Result<()> {
        if !self.is_private() {
            return Err(Error::NothingToDecrypt);
        }
        self.primary_key.decrypt(passphrase)?;
        for subkey in &mut self.subkeys {
            if subkey.key.is_secret() {
                subkey.key.decrypt(passphrase)?;
            }
        }
        Ok(())
    }
}

/// Outcome of reading a keyring: the keys that built, and the per-key
/// errors for the ones that did not.
#[derive(Debug, Default)]
pub struct ReadResult {
    pub keys: Vec<Key>,
    pub errors: Vec<Error>,
}

/// Read every key out of a packet sequence. A keyring with one bad key
/// still yields the good ones; the bad one lands in `errors`.
pub fn read(packets: PacketList) -> ReadResult {
    let mut result = ReadResult::default();

    let boundaries = packets.index_of_tag(&[Tag::PublicKey, Tag::SecretKey]);
    if boundaries.is_empty() {
        result.errors.push(
            InvalidKeySnafu {
                message: "no key packet found",
            }
            .build(),
        );
        return result;
    }

    for (n, &start) in boundaries.iter().enumerate() {
        let end = boundaries.get(n + 1).copied().unwrap_or(packets.len());
        match Key::from_packets(packets.slice(start..end)) {
            Ok(key) => result.keys.push(key),
            Err(err) => result.errors.push(err),
        }
    }

    result
}

/// Read keys from a decoded armor block, rejecting non-key block types.
pub fn read_armored(typ: BlockType, packets: PacketList) -> Result<ReadResult> {
    match typ {
        BlockType::PublicKey | BlockType::PrivateKey => Ok(read(packets)),
        _ => Err(MalformedArmorSnafu.build()),
    }
}
