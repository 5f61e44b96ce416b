use chrono::{DateTime, Utc};
use log::debug;

use crate::composed::key::{Key, SubKey, User};
use crate::composed::validate::{check_signature, SignedData};
use crate::config::Config;
use crate::errors::{Error, Result};
use crate::packet::SignaturePacket;
use crate::types::KeyStatus;

/// Copy the signatures of `src` into `dst`, deduplicating by raw
/// signature bytes. `include` sees a mutable clone so lazy verification
/// can cache into the copy that gets kept.
fn merge_signatures(
    dst: &mut Vec<SignaturePacket>,
    src: &[SignaturePacket],
    mut include: impl FnMut(&mut SignaturePacket) -> bool,
) {
    for sig in src {
        if dst.iter().any(|d| d.signature == sig.signature) {
            continue;
        }
        let mut sig = sig.clone();
        if include(&mut sig) {
            dst.push(sig);
        }
    }
}

/// Binding signatures keep at most one effective entry per issuer: when
/// source and destination share an issuer, the later-created signature
/// wins and the other is dropped.
fn merge_binding_signatures(
    dst: &mut Vec<SignaturePacket>,
    src: &[SignaturePacket],
    mut include: impl FnMut(&mut SignaturePacket) -> bool,
) {
    for sig in src {
        if dst.iter().any(|d| d.signature == sig.signature) {
            continue;
        }
        let mut sig = sig.clone();
        if !include(&mut sig) {
            continue;
        }
        if let Some(existing) = dst
            .iter()
            .position(|d| d.issuer_key_id == sig.issuer_key_id)
        {
            if dst[existing].created < sig.created {
                dst.remove(existing);
                dst.push(sig);
            }
            continue;
        }
        dst.push(sig);
    }
}

impl Key {
    /// Merge a newer copy of the same key into this one.
    ///
    /// The merge is idempotent and, apart from the per-issuer keep-newer
    /// rule on binding signatures, order independent. A structurally
    /// invalid source is ignored silently; a different primary
    /// fingerprint is an error.
    pub fn update(&mut self, other: &Key, config: &Config, date: DateTime<Utc>) -> Result<()> {
        let mut other = other.clone();

        if other.verify_primary_key(config, date) == KeyStatus::Invalid {
            debug!("ignoring invalid source key in update");
            return Ok(());
        }

        if self.fingerprint() != other.fingerprint() {
            return Err(Error::FingerprintMismatch);
        }

        if self.is_public() && other.is_private() {
            // upgrade a public tree with the private primary, but only when
            // the subkey sets agree
            let equal = self.subkeys.len() == other.subkeys.len()
                && self.subkeys.iter().all(|dst| {
                    other
                        .subkeys
                        .iter()
                        .any(|src| dst.key.fingerprint() == src.key.fingerprint())
                });
            if !equal {
                return Err(Error::SubkeyMismatch);
            }
            self.primary_key = other.primary_key.clone();
        }

        let primary = self.primary_key.clone();

        let data = SignedData::Key { key: &primary };
        merge_signatures(
            &mut self.revocation_signatures,
            &other.revocation_signatures,
            |sig| !sig.is_expired(date) && check_signature(sig, &primary, &data),
        );

        merge_signatures(&mut self.direct_signatures, &other.direct_signatures, |_| {
            true
        });

        for src_user in &other.users {
            match self.users.iter().position(|u| u.same_identity(src_user)) {
                Some(n) => {
                    let dst_user = &mut self.users[n];
                    let data = SignedData::User {
                        key: &primary,
                        body: &dst_user.body,
                    };
                    merge_signatures(
                        &mut dst_user.self_certifications,
                        &src_user.self_certifications,
                        |sig| check_signature(sig, &primary, &data),
                    );
                    merge_signatures(
                        &mut dst_user.other_certifications,
                        &src_user.other_certifications,
                        |_| true,
                    );
                    merge_signatures(
                        &mut dst_user.revocation_signatures,
                        &src_user.revocation_signatures,
                        |sig| check_signature(sig, &primary, &data),
                    );
                }
                None => self.users.push(src_user.clone()),
            }
        }

        for src_subkey in &other.subkeys {
            match self.subkeys.iter().position(|s| s.same_key(src_subkey)) {
                Some(n) => {
                    let dst_subkey = &mut self.subkeys[n];
                    let data = SignedData::Binding {
                        primary: &primary,
                        subkey: &dst_subkey.key,
                    };
                    merge_binding_signatures(
                        &mut dst_subkey.binding_signatures,
                        &src_subkey.binding_signatures,
                        |sig| check_signature(sig, &primary, &data),
                    );
                    merge_signatures(
                        &mut dst_subkey.revocation_signatures,
                        &src_subkey.revocation_signatures,
                        |sig| check_signature(sig, &primary, &data),
                    );
                }
                None => self.subkeys.push(src_subkey.clone()),
            }
        }

        Ok(())
    }
}

impl User {
    /// Whether two users denote the same identity: byte equality of the
    /// user id text or the attribute payload.
    pub fn same_identity(&self, other: &User) -> bool {
        self.body == other.body
    }
}

impl SubKey {
    /// Whether two subkeys carry the same key material.
    pub fn same_key(&self, other: &SubKey) -> bool {
        self.key.fingerprint() == other.key.fingerprint()
    }
}
