use chrono::{DateTime, Utc};

use crate::composed::key::Key;
use crate::composed::validate::is_data_expired;
use crate::config::Config;
use crate::errors::{Error, Result};
use crate::packet::{KeyPacket, SignaturePacket};
use crate::types::{KeyId, KeyStatus};

enum Selected {
    Primary,
    Subkey(usize),
}

/// A key packet may sign iff its algorithm can, the governing signature
/// carries the sign-data flag (or none at all), and neither the signature
/// nor the key has lapsed.
fn is_valid_signing_key_packet(key: &KeyPacket, sig: &SignaturePacket, date: DateTime<Utc>) -> bool {
    key.algorithm().can_sign()
        && sig.key_flags.map_or(true, |flags| flags.sign())
        && sig.verified
        && !sig.revoked
        && !sig.is_expired(date)
        && !is_data_expired(key, Some(sig), date)
}

fn is_valid_encryption_key_packet(
    key: &KeyPacket,
    sig: &SignaturePacket,
    date: DateTime<Utc>,
) -> bool {
    key.algorithm().can_encrypt()
        && sig
            .key_flags
            .map_or(true, |flags| flags.encrypt_comms() || flags.encrypt_storage())
        && sig.verified
        && !sig.revoked
        && !sig.is_expired(date)
        && !is_data_expired(key, Some(sig), date)
}

impl Key {
    /// The key packet to sign with at `date`: the primary key when it is
    /// fully valid and allowed to sign, otherwise the first eligible
    /// subkey in declaration order. `key_id` restricts the search (the
    /// wildcard id matches everything).
    pub fn get_signing_key_packet(
        &mut self,
        config: &Config,
        key_id: Option<&KeyId>,
        date: DateTime<Utc>,
    ) -> Option<&KeyPacket> {
        let selected = self.select_signing(config, key_id, date)?;
        match selected {
            Selected::Primary => Some(&self.primary_key),
            Selected::Subkey(i) => Some(&self.subkeys[i].key),
        }
    }

    fn select_signing(
        &mut self,
        config: &Config,
        key_id: Option<&KeyId>,
        date: DateTime<Utc>,
    ) -> Option<Selected> {
        if let Some(primary_user) = self.get_primary_user(config, date) {
            let hint_ok = key_id.map_or(true, |id| id.matches(self.primary_key.key_id()));
            if hint_ok
                && is_valid_signing_key_packet(
                    &self.primary_key,
                    &primary_user.self_certification,
                    date,
                )
                && self.verify_primary_key(config, date) == KeyStatus::Valid
            {
                return Some(Selected::Primary);
            }
        }

        let Key {
            primary_key,
            subkeys,
            ..
        } = self;
        for (i, subkey) in subkeys.iter_mut().enumerate() {
            if !key_id.map_or(true, |id| id.matches(subkey.key.key_id())) {
                continue;
            }
            // populate the verified/revoked caches on the bindings
            subkey.verify(primary_key, config, date);

            if subkey
                .binding_signatures
                .iter()
                .any(|binding| is_valid_signing_key_packet(&subkey.key, binding, date))
            {
                return Some(Selected::Subkey(i));
            }
        }

        None
    }

    /// Like `get_signing_key_packet`, raising `SigningKeyNotFound` when no
    /// packet is eligible.
    pub fn signing_key_packet(
        &mut self,
        config: &Config,
        key_id: Option<&KeyId>,
        date: DateTime<Utc>,
    ) -> Result<&KeyPacket> {
        self.get_signing_key_packet(config, key_id, date)
            .ok_or(Error::SigningKeyNotFound)
    }

    /// The key packet to encrypt to at `date`. By convention subkeys are
    /// preferred; the primary key is only a fallback.
    pub fn get_encryption_key_packet(
        &mut self,
        config: &Config,
        key_id: Option<&KeyId>,
        date: DateTime<Utc>,
    ) -> Option<&KeyPacket> {
        let selected = self.select_encryption(config, key_id, date)?;
        match selected {
            Selected::Primary => Some(&self.primary_key),
            Selected::Subkey(i) => Some(&self.subkeys[i].key),
        }
    }

    fn select_encryption(
        &mut self,
        config: &Config,
        key_id: Option<&KeyId>,
        date: DateTime<Utc>,
    ) -> Option<Selected> {
        {
            let Key {
                primary_key,
                subkeys,
                ..
            } = self;
            for (i, subkey) in subkeys.iter_mut().enumerate() {
                if !key_id.map_or(true, |id| id.matches(subkey.key.key_id())) {
                    continue;
                }
                subkey.verify(primary_key, config, date);

                if subkey
                    .binding_signatures
                    .iter()
                    .any(|binding| is_valid_encryption_key_packet(&subkey.key, binding, date))
                {
                    return Some(Selected::Subkey(i));
                }
            }
        }

        if let Some(primary_user) = self.get_primary_user(config, date) {
            let hint_ok = key_id.map_or(true, |id| id.matches(self.primary_key.key_id()));
            if hint_ok
                && is_valid_encryption_key_packet(
                    &self.primary_key,
                    &primary_user.self_certification,
                    date,
                )
            {
                return Some(Selected::Primary);
            }
        }

        None
    }
}
