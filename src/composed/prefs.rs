use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::composed::key::Key;
use crate::config::Config;
use crate::crypto::{HashAlgorithm, PublicKeyAlgorithm, SymmetricKeyAlgorithm};
use crate::packet::KeyPacket;

fn is_ecc(algorithm: PublicKeyAlgorithm) -> bool {
    matches!(
        algorithm,
        PublicKeyAlgorithm::ECDH | PublicKeyAlgorithm::ECDSA | PublicKeyAlgorithm::EdDSA
    )
}

/// Replace `current` with `candidate` only when the candidate digest is
/// at least as long; a shorter hash never wins a negotiation.
fn stronger(current: HashAlgorithm, candidate: HashAlgorithm) -> HashAlgorithm {
    if current.digest_size() <= candidate.digest_size() {
        candidate
    } else {
        current
    }
}

fn ecc_floor(current: HashAlgorithm, key: &KeyPacket) -> HashAlgorithm {
    if !is_ecc(key.algorithm()) {
        return current;
    }
    match key.curve() {
        Ok(curve) => stronger(current, curve.hash_algo()),
        Err(_) => current,
    }
}

/// The hash to sign with for a bare key packet: the configured default,
/// raised to the curve's preferred hash for ECC material.
pub fn preferred_hash_algo_for_packet(config: &Config, key: Option<&KeyPacket>) -> HashAlgorithm {
    let hash = config.prefer_hash_algorithm;
    match key {
        Some(key) => ecc_floor(hash, key),
        None => hash,
    }
}

/// The hash to sign with for a full key: start from the configured
/// default, consider the primary user's first hash preference, then the
/// signing packet's curve floor. A preference only wins when its digest
/// is at least as long as the configured one.
pub fn preferred_hash_algo(config: &Config, key: &mut Key, date: DateTime<Utc>) -> HashAlgorithm {
    let mut hash = config.prefer_hash_algorithm;

    if let Some(primary_user) = key.get_primary_user(config, date) {
        // a user with no preference list silently keeps the default
        if let Some(&first) = primary_user
            .self_certification
            .preferred_hash_algorithms
            .first()
        {
            hash = stronger(hash, first);
        }
    }

    let signing_packet = key.get_signing_key_packet(config, None, date).cloned();
    match signing_packet {
        Some(packet) => ecc_floor(hash, &packet),
        None => hash,
    }
}

/// Negotiate a symmetric cipher across several keys: score each
/// algorithm by its position in every primary user's preference list
/// (`64 >> index`), and pick the best scorer that every key advertises.
/// Plaintext, IDEA and unknown algorithms never qualify.
pub fn preferred_sym_algo(
    config: &Config,
    keys: &mut [Key],
    date: DateTime<Utc>,
) -> SymmetricKeyAlgorithm {
    if keys.is_empty() {
        return config.encryption_cipher;
    }

    let mut scores: HashMap<SymmetricKeyAlgorithm, (u32, usize)> = HashMap::new();
    for key in keys.iter_mut() {
        let Some(primary_user) = key.get_primary_user(config, date) else {
            continue;
        };
        for (n, algorithm) in primary_user
            .self_certification
            .preferred_symmetric_algorithms
            .iter()
            .enumerate()
        {
            let entry = scores.entry(*algorithm).or_insert((0, 0));
            entry.0 += 64u32 >> n.min(31);
            entry.1 += 1;
        }
    }

    scores
        .into_iter()
        .filter(|(algorithm, (_, count))| *count == keys.len() && algorithm.is_negotiable())
        .max_by_key(|(algorithm, (score, _))| (*score, u8::from(*algorithm)))
        .map(|(algorithm, _)| algorithm)
        .unwrap_or(config.encryption_cipher)
}
