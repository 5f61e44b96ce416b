use chrono::{DateTime, Duration, SubsecRound, Utc};
use log::debug;

use crate::composed::key::{Key, SubKey, User, UserBody};
use crate::config::Config;
use crate::errors::{Error, Result};
use crate::packet::{KeyPacket, SignaturePacket};
use crate::types::{KeyStatus, KeyVersion};
use crate::util;

/// The user judged most significant at a given date, together with the
/// self-certification that won the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryUser {
    /// Index into the key's user sequence.
    pub index: usize,
    pub self_certification: SignaturePacket,
}

/// What a signature under evaluation was issued over.
#[derive(Debug, Clone, Copy)]
pub(crate) enum SignedData<'a> {
    Key {
        key: &'a KeyPacket,
    },
    Binding {
        primary: &'a KeyPacket,
        subkey: &'a KeyPacket,
    },
    User {
        key: &'a KeyPacket,
        body: &'a UserBody,
    },
}

fn verify_signature(sig: &SignaturePacket, signer: &KeyPacket, data: &SignedData<'_>) -> Result<()> {
    match data {
        SignedData::Key { key } => sig.verify_key(signer, key),
        SignedData::Binding { primary, subkey } => sig.verify_key_binding(signer, primary, subkey),
        SignedData::User { key, body } => match body {
            UserBody::Id(id) => sig.verify_user_id_certificate(signer, key, id),
            UserBody::Attribute(attr) => sig.verify_user_attribute_certificate(signer, key, attr),
        },
    }
}

/// Lazily verify a signature, caching the outcome in its monotonic
/// `verified` flag. Verification failures downgrade, they never raise.
pub(crate) fn check_signature(
    sig: &mut SignaturePacket,
    signer: &KeyPacket,
    data: &SignedData<'_>,
) -> bool {
    if sig.verified {
        return true;
    }
    match verify_signature(sig, signer, data) {
        Ok(()) => {
            sig.verified = true;
            true
        }
        Err(err) => {
            debug!("signature did not verify: {:?}", err);
            false
        }
    }
}

/// Evaluate the candidate revocations over `data`.
///
/// With a target signature, the data counts as revoked only when a
/// surviving revocation's issuer equals the target's issuer, and the
/// target's `revoked` cache is updated. This issuer-match shortcut stands
/// in for full designated-revoker handling.
pub(crate) fn is_data_revoked(
    config: &Config,
    signer: &KeyPacket,
    data: &SignedData<'_>,
    revocations: &mut [SignaturePacket],
    target: Option<&mut SignaturePacket>,
    date: DateTime<Utc>,
) -> bool {
    let mut issuers = Vec::new();
    for revocation in revocations.iter_mut() {
        if config.revocations_expire && revocation.is_expired(date) {
            continue;
        }
        if !check_signature(revocation, signer, data) {
            continue;
        }
        issuers.push(revocation.issuer_key_id.clone());
    }

    match target {
        Some(sig) => {
            if issuers.iter().any(|id| id == &sig.issuer_key_id) {
                sig.revoked = true;
            }
            sig.revoked
        }
        None => !issuers.is_empty(),
    }
}

/// The instant the key governed by `sig` stops being valid, or `None`
/// when it never expires. v3 keys carry their lifetime on the packet in
/// days; v4 keys derive it from the governing signature.
pub(crate) fn key_expiration(
    key: &KeyPacket,
    sig: Option<&SignaturePacket>,
) -> Option<DateTime<Utc>> {
    match key.version() {
        KeyVersion::V3 => match key.expiration_days() {
            None | Some(0) => None,
            Some(days) => Some(key.created_at() + Duration::days(i64::from(days))),
        },
        _ => sig.and_then(|s| {
            if s.key_never_expires == Some(true) {
                return None;
            }
            s.key_expiration_time
                .map(|secs| key.created_at() + Duration::seconds(i64::from(secs)))
        }),
    }
}

/// Whether the key is outside its validity window at `date`, or the
/// governing signature itself has lapsed.
pub(crate) fn is_data_expired(
    key: &KeyPacket,
    sig: Option<&SignaturePacket>,
    date: DateTime<Utc>,
) -> bool {
    let date = date.trunc_subsecs(0);
    let in_window = key.created_at() <= date
        && match key_expiration(key, sig) {
            None => true,
            Some(expiration) => date < expiration,
        };
    !in_window || sig.is_some_and(|s| s.is_expired(date))
}

fn primary_weight(sig: &SignaturePacket) -> i16 {
    sig.is_primary_user_id.map_or(-1, i16::from)
}

/// Select the primary user: among users whose self-certifications verify,
/// are unrevoked and unexpired at `date`, the higher primary-user weight
/// wins, ties broken by later certification creation time.
pub(crate) fn primary_user_inner(
    primary: &KeyPacket,
    users: &mut [User],
    config: &Config,
    date: DateTime<Utc>,
) -> Option<PrimaryUser> {
    let mut best: Option<(usize, SignaturePacket)> = None;

    for (index, user) in users.iter_mut().enumerate() {
        if user.body.id().is_none() {
            continue;
        }
        let User {
            body,
            self_certifications,
            revocation_signatures,
            ..
        } = user;
        let data = SignedData::User { key: primary, body };

        for cert in self_certifications.iter_mut() {
            if !check_signature(cert, primary, &data) {
                continue;
            }
            if cert.is_expired(date) {
                continue;
            }
            if is_data_revoked(
                config,
                primary,
                &data,
                revocation_signatures,
                Some(&mut *cert),
                date,
            ) {
                continue;
            }

            let better = match &best {
                None => true,
                Some((_, current)) => {
                    (primary_weight(cert), cert.created)
                        > (primary_weight(current), current.created)
                }
            };
            if better {
                best = Some((index, cert.clone()));
            }
        }
    }

    best.map(|(index, self_certification)| PrimaryUser {
        index,
        self_certification,
    })
}

impl Key {
    /// The primary user at `date`, if any self-certification survives.
    pub fn get_primary_user(&mut self, config: &Config, date: DateTime<Utc>) -> Option<PrimaryUser> {
        primary_user_inner(&self.primary_key, &mut self.users, config, date)
    }

    /// Like `get_primary_user`, raising `PrimaryUserNotFound` when no user
    /// survives.
    pub fn primary_user(&mut self, config: &Config, date: DateTime<Utc>) -> Result<PrimaryUser> {
        self.get_primary_user(config, date)
            .ok_or(Error::PrimaryUserNotFound)
    }

    /// Evaluate the trust status of the primary key at `date`.
    pub fn verify_primary_key(&mut self, config: &Config, date: DateTime<Utc>) -> KeyStatus {
        let Key {
            primary_key,
            revocation_signatures,
            users,
            ..
        } = self;

        let data = SignedData::Key { key: primary_key };
        if is_data_revoked(config, primary_key, &data, revocation_signatures, None, date) {
            return KeyStatus::Revoked;
        }

        if !users.iter().any(|u| !u.self_certifications.is_empty()) {
            return KeyStatus::NoSelfCert;
        }

        let Some(primary_user) = primary_user_inner(primary_key, users, config, date) else {
            return KeyStatus::Invalid;
        };

        let expired = match primary_key.version() {
            KeyVersion::V3 => is_data_expired(primary_key, None, date),
            _ => is_data_expired(primary_key, Some(&primary_user.self_certification), date),
        };
        if expired {
            return KeyStatus::Expired;
        }

        KeyStatus::Valid
    }

    /// The instant the primary key expires, or `None` when it never does.
    pub fn get_expiration_time(&mut self, config: &Config) -> Option<DateTime<Utc>> {
        match self.primary_key.version() {
            KeyVersion::V3 => key_expiration(&self.primary_key, None),
            _ => {
                let primary_user = self.get_primary_user(config, util::now())?;
                key_expiration(&self.primary_key, Some(&primary_user.self_certification))
            }
        }
    }
}

impl SubKey {
    /// Evaluate this subkey against the primary key at `date`: the first
    /// binding signature that verifies, is unrevoked and unexpired makes
    /// the subkey valid; otherwise the status of the last examined
    /// binding falls out.
    pub fn verify(&mut self, primary: &KeyPacket, config: &Config, date: DateTime<Utc>) -> KeyStatus {
        let SubKey {
            key,
            binding_signatures,
            revocation_signatures,
        } = self;

        // v3 keys expire on the packet itself, before any signature is looked at
        if key.version() == KeyVersion::V3 && is_data_expired(key, None, date) {
            return KeyStatus::Expired;
        }

        let data = SignedData::Binding {
            primary,
            subkey: key,
        };
        let mut status = KeyStatus::Invalid;

        for binding in binding_signatures.iter_mut() {
            if !check_signature(binding, primary, &data) {
                status = KeyStatus::Invalid;
                continue;
            }
            if is_data_revoked(
                config,
                primary,
                &data,
                revocation_signatures,
                Some(&mut *binding),
                date,
            ) {
                status = KeyStatus::Revoked;
                continue;
            }
            if binding.is_expired(date) || is_data_expired(key, Some(binding), date) {
                status = KeyStatus::Expired;
                continue;
            }
            return KeyStatus::Valid;
        }

        status
    }

    /// The latest expiration over all binding signatures, or `None` as
    /// soon as any binding asserts non-expiry.
    pub fn get_expiration_time(&self) -> Option<DateTime<Utc>> {
        let mut latest: Option<DateTime<Utc>> = None;
        for binding in &self.binding_signatures {
            match key_expiration(&self.key, Some(binding)) {
                None => return None,
                Some(expiration) => {
                    latest = Some(latest.map_or(expiration, |current| current.max(expiration)));
                }
            }
        }
        latest
    }
}

impl User {
    /// Evaluate this user's self-certifications against the primary key.
    pub fn verify(&mut self, primary: &KeyPacket, config: &Config, date: DateTime<Utc>) -> KeyStatus {
        if self.self_certifications.is_empty() {
            return KeyStatus::NoSelfCert;
        }

        let User {
            body,
            self_certifications,
            revocation_signatures,
            ..
        } = self;
        let data = SignedData::User { key: primary, body };
        let mut status = KeyStatus::Invalid;

        for cert in self_certifications.iter_mut() {
            if !check_signature(cert, primary, &data) {
                status = KeyStatus::Invalid;
                continue;
            }
            if is_data_revoked(
                config,
                primary,
                &data,
                revocation_signatures,
                Some(&mut *cert),
                date,
            ) {
                status = KeyStatus::Revoked;
                continue;
            }
            if cert.is_expired(date) {
                status = KeyStatus::Expired;
                continue;
            }
            return KeyStatus::Valid;
        }

        status
    }

    /// Evaluate a third-party certification on this user against a
    /// keyring. Returns `None` when no key in `keys` carries the issuer.
    pub fn verify_certificate(
        &mut self,
        primary: &KeyPacket,
        certificate: &mut SignaturePacket,
        keys: &mut [Key],
        config: &Config,
        date: DateTime<Utc>,
    ) -> Option<KeyStatus> {
        let issuer = certificate.issuer_key_id.clone();

        for key in keys.iter_mut() {
            if !key.key_ids().iter().any(|id| id.matches(&issuer)) {
                continue;
            }
            let Some(signer) = key
                .get_signing_key_packet(config, Some(&issuer), date)
                .cloned()
            else {
                return Some(KeyStatus::Invalid);
            };

            let User {
                body,
                revocation_signatures,
                ..
            } = self;
            let data = SignedData::User { key: primary, body };

            if is_data_revoked(
                config,
                &signer,
                &data,
                revocation_signatures,
                Some(certificate),
                date,
            ) {
                return Some(KeyStatus::Revoked);
            }
            if !check_signature(certificate, &signer, &data) {
                return Some(KeyStatus::Invalid);
            }
            if certificate.is_expired(date) {
                return Some(KeyStatus::Expired);
            }
            return Some(KeyStatus::Valid);
        }

        None
    }
}
