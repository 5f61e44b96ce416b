#![allow(clippy::unwrap_used)]

use std::sync::OnceLock;

use chrono::Duration;
use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use tpk::composed::{preferred_hash_algo, preferred_sym_algo};
use tpk::crypto::{ECCCurve, HashAlgorithm, PublicKeyAlgorithm, SymmetricKeyAlgorithm};
use tpk::errors::Error;
use tpk::packet::{SignatureConfig, SignatureType, UserId};
use tpk::types::{BlockType, KeyId, KeyStatus, Tag};
use tpk::{generate, read, read_armored, reformat, Config, Key, KeyOptionsBuilder, PacketList};

fn ed25519_key(seed: u64, user_id: &str) -> Key {
    let _ = pretty_env_logger::try_init();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let opts = KeyOptionsBuilder::default()
        .curve(Some("ed25519".into()))
        .user_ids(vec![user_id.into()])
        .build()
        .unwrap();
    generate(&mut rng, &Config::default(), opts).expect("failed to generate key")
}

/// RSA generation is expensive; generate the locked S1 key once and hand
/// out clones.
fn rsa_key() -> Key {
    static KEY: OnceLock<Key> = OnceLock::new();
    KEY.get_or_init(|| {
        let _ = pretty_env_logger::try_init();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let opts = KeyOptionsBuilder::default()
            .key_type(Some(PublicKeyAlgorithm::RSA))
            .num_bits(Some(2048))
            .user_ids(vec!["Alice <a@x>".into()])
            .passphrase(Some("pw".into()))
            .build()
            .unwrap();
        generate(&mut rng, &Config::default(), opts).expect("failed to generate rsa key")
    })
    .clone()
}

#[test]
fn test_rsa_roundtrip() {
    // S1
    let config = Config::default();
    let key = rsa_key();

    let packets = key.to_packet_list();
    let mut rebuilt = Key::from_packets(packets).expect("failed to rebuild key");

    assert!(rebuilt.is_private());
    assert!(!rebuilt.is_decrypted(), "passphrase leaves the key locked");
    assert_eq!(rebuilt.primary_key.algorithm(), PublicKeyAlgorithm::RSA);

    let primary_user = rebuilt
        .get_primary_user(&config, tpk::util::now())
        .expect("no primary user");
    assert_eq!(primary_user.index, 0);
    assert_eq!(
        rebuilt.users[primary_user.index].body.id().unwrap().id(),
        "Alice <a@x>"
    );
    assert_eq!(primary_user.self_certification.is_primary_user_id, Some(1));

    assert_eq!(rebuilt.subkeys.len(), 1);
    let subkey = &rebuilt.subkeys[0];
    assert_eq!(subkey.key.algorithm(), PublicKeyAlgorithm::RSA);
    assert_eq!(subkey.binding_signatures.len(), 1);
    let flags = subkey.binding_signatures[0].key_flags.expect("key flags");
    assert!(flags.encrypt_comms());

    assert_eq!(rebuilt.users[0].self_certifications.len(), 1);
}

#[test]
fn test_eddsa_ecdh_generation() {
    // S2
    let key = ed25519_key(1, "Bob <b@x>");

    assert_eq!(key.primary_key.algorithm(), PublicKeyAlgorithm::EdDSA);
    assert_eq!(key.primary_key.curve().unwrap(), ECCCurve::Ed25519);
    assert_eq!(
        key.primary_key.public_params()[0].as_oid().unwrap(),
        &[0x2B, 0x06, 0x01, 0x04, 0x01, 0xDA, 0x47, 0x0F, 0x01]
    );

    let subkey = &key.subkeys[0].key;
    assert_eq!(subkey.algorithm(), PublicKeyAlgorithm::ECDH);
    assert_eq!(subkey.curve().unwrap(), ECCCurve::Curve25519);
    assert_eq!(
        subkey.public_params()[0].as_oid().unwrap(),
        &[0x2B, 0x06, 0x01, 0x04, 0x01, 0x97, 0x55, 0x01, 0x05, 0x01]
    );
}

#[test]
fn test_ecdsa_generation() {
    let config = Config::default();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let opts = KeyOptionsBuilder::default()
        .curve(Some("p256".into()))
        .user_ids(vec!["Nisha <n@x>".into()])
        .build()
        .unwrap();
    let mut key = generate(&mut rng, &config, opts).unwrap();

    assert_eq!(key.primary_key.algorithm(), PublicKeyAlgorithm::ECDSA);
    assert_eq!(key.primary_key.curve().unwrap(), ECCCurve::P256);
    assert_eq!(key.subkeys[0].key.algorithm(), PublicKeyAlgorithm::ECDH);
    assert_eq!(key.subkeys[0].key.curve().unwrap(), ECCCurve::P256);

    let now = tpk::util::now();
    assert_eq!(key.verify_primary_key(&config, now), KeyStatus::Valid);

    // no ECDH over secp256k1: the subkey falls back to Curve25519
    let opts = KeyOptionsBuilder::default()
        .curve(Some("secp256k1".into()))
        .user_ids(vec!["Koblitz <k@x>".into()])
        .build()
        .unwrap();
    let key = generate(&mut rng, &config, opts).unwrap();
    assert_eq!(key.primary_key.curve().unwrap(), ECCCurve::Secp256k1);
    assert_eq!(key.subkeys[0].key.curve().unwrap(), ECCCurve::Curve25519);
}

#[test]
fn test_packet_roundtrip_stability() {
    // property 1: to_packet_list inverts from_packets
    let key = ed25519_key(2, "Carol <c@x>");
    let p1 = key.to_packet_list();
    let rebuilt = Key::from_packets(p1.clone()).unwrap();
    let p2 = rebuilt.to_packet_list();
    assert_eq!(p1, p2);
    assert_eq!(key, rebuilt);
}

#[test]
fn test_verify_primary_and_subkey() {
    let config = Config::default();
    let now = tpk::util::now();
    let mut key = ed25519_key(3, "Dave <d@x>");

    assert_eq!(key.verify_primary_key(&config, now), KeyStatus::Valid);

    let primary = key.primary_key.clone();
    assert_eq!(key.subkeys[0].verify(&primary, &config, now), KeyStatus::Valid);
    assert_eq!(key.users[0].verify(&primary, &config, now), KeyStatus::Valid);
}

#[test]
fn test_update_merges_third_party_certification() {
    // S3
    let config = Config::default();
    let now = tpk::util::now();
    let mut alice = ed25519_key(4, "Alice <a@x>").to_public();
    let mut bob = ed25519_key(5, "Bob <b@x>");

    let mut copy = alice.clone();
    let cert = SignatureConfig::new(SignatureType::CertGeneric, HashAlgorithm::Sha512, now)
        .sign_user_id_certificate(
            &bob.primary_key,
            &alice.primary_key,
            copy.users[0].body.id().unwrap(),
        )
        .expect("failed to certify");
    copy.users[0].other_certifications.push(cert.clone());

    alice.update(&copy, &config, now).expect("update failed");
    assert_eq!(alice.users[0].other_certifications.len(), 1);

    // no duplicate by raw signature bytes
    alice.update(&copy, &config, now).expect("update failed");
    assert_eq!(alice.users[0].other_certifications.len(), 1);

    // the certification checks out against bob's key
    let primary = alice.primary_key.clone();
    let mut cert = alice.users[0].other_certifications[0].clone();
    let status = alice.users[0].verify_certificate(
        &primary,
        &mut cert,
        std::slice::from_mut(&mut bob),
        &config,
        now,
    );
    assert_eq!(status, Some(KeyStatus::Valid));

    // unknown issuer yields no verdict
    let status =
        alice.users[0].verify_certificate(&primary, &mut cert, &mut [], &config, now);
    assert_eq!(status, None);
}

#[test]
fn test_update_is_idempotent() {
    // property 2
    let config = Config::default();
    let now = tpk::util::now();
    let mut key = ed25519_key(6, "Erin <e@x>");
    let copy = key.clone();

    key.update(&copy, &config, now).expect("update failed");
    assert_eq!(key, copy);
}

#[test]
fn test_update_commutes_on_signature_sets() {
    // property 3
    let config = Config::default();
    let now = tpk::util::now();
    let base = ed25519_key(7, "Frank <f@x>").to_public();
    let signer = ed25519_key(8, "Grace <g@x>");

    let left = base.clone();
    let mut right = base.clone();
    let cert = SignatureConfig::new(SignatureType::CertGeneric, HashAlgorithm::Sha512, now)
        .sign_user_id_certificate(
            &signer.primary_key,
            &base.primary_key,
            base.users[0].body.id().unwrap(),
        )
        .unwrap();
    right.users[0].other_certifications.push(cert);

    let mut a = left.clone();
    a.update(&right, &config, now).unwrap();
    let mut b = right.clone();
    b.update(&left, &config, now).unwrap();

    assert_eq!(a.users, b.users);
    assert_eq!(a.subkeys, b.subkeys);
    assert_eq!(a.revocation_signatures, b.revocation_signatures);
}

#[test]
fn test_update_rejects_foreign_key() {
    let config = Config::default();
    let now = tpk::util::now();
    let mut alice = ed25519_key(9, "Alice <a@x>");
    let bob = ed25519_key(10, "Bob <b@x>");

    assert!(matches!(
        alice.update(&bob, &config, now),
        Err(Error::FingerprintMismatch)
    ));
}

#[test]
fn test_update_upgrades_public_to_private() {
    let config = Config::default();
    let now = tpk::util::now();
    let private = ed25519_key(11, "Heidi <h@x>");
    let mut public = private.to_public();

    public.update(&private, &config, now).expect("update failed");
    assert!(public.is_private());

    // a public tree with a different subkey set must not upgrade
    let mut truncated = private.to_public();
    truncated.subkeys.clear();
    assert!(matches!(
        truncated.update(&private, &config, now),
        Err(Error::SubkeyMismatch)
    ));
}

#[test]
fn test_to_public_is_idempotent() {
    // property 4
    let key = ed25519_key(12, "Ivan <i@x>");
    let public = key.to_public();

    assert!(public.is_public());
    assert_eq!(public.primary_key.tag(), Tag::PublicKey);
    assert_eq!(public.subkeys[0].key.tag(), Tag::PublicSubkey);
    assert!(!public.is_decrypted());
    assert!(public.primary_key.plain_secret_params().is_err());
    assert_eq!(public.to_public(), public);
    assert_eq!(public.fingerprint(), key.fingerprint());
}

#[test]
fn test_primary_user_tiebreak() {
    // S5 and property 5
    let config = Config::default();
    let now = tpk::util::now();
    let mut rng = ChaCha8Rng::seed_from_u64(13);
    let primary = tpk::KeyPacket::generate(
        &mut rng,
        Tag::SecretKey,
        PublicKeyAlgorithm::EdDSA,
        None,
        None,
        now - Duration::seconds(100),
    )
    .unwrap();

    let first = UserId::from_str("First <1@x>");
    let second = UserId::from_str("Second <2@x>");

    let mut early = SignatureConfig::new(
        SignatureType::CertGeneric,
        HashAlgorithm::Sha512,
        now - Duration::seconds(100),
    );
    early.is_primary_user_id = Some(0);
    let early_sig = early
        .sign_user_id_certificate(&primary, &primary, &first)
        .unwrap();

    let mut late = SignatureConfig::new(
        SignatureType::CertGeneric,
        HashAlgorithm::Sha512,
        now - Duration::seconds(10),
    );
    late.is_primary_user_id = Some(1);
    let late_sig = late
        .sign_user_id_certificate(&primary, &primary, &second)
        .unwrap();

    let mut packets = PacketList::new();
    packets.push(primary);
    packets.push(first);
    packets.push(early_sig);
    packets.push(second);
    packets.push(late_sig);
    let mut key = Key::from_packets(packets).unwrap();

    let primary_user = key.get_primary_user(&config, now).expect("no primary user");
    assert_eq!(primary_user.index, 1);
    assert_eq!(primary_user.self_certification.is_primary_user_id, Some(1));
    assert_eq!(
        key.users[primary_user.index].body.id().unwrap().id(),
        "Second <2@x>"
    );
}

#[test]
fn test_revocation_dominates() {
    // S4 and property 6
    let config = Config::default();
    let now = tpk::util::now();
    let mut key = ed25519_key(14, "Judy <j@x>");
    assert_eq!(key.verify_primary_key(&config, now), KeyStatus::Valid);

    let revocation = SignatureConfig::new(SignatureType::KeyRevocation, HashAlgorithm::Sha512, now)
        .sign_key(&key.primary_key, &key.primary_key)
        .expect("failed to revoke");
    key.revocation_signatures.push(revocation);

    assert_eq!(key.verify_primary_key(&config, now), KeyStatus::Revoked);
    assert!(key.get_signing_key_packet(&config, None, now).is_none());
}

#[test]
fn test_expiration_boundary() {
    // S6 and property 7
    let config = Config::default();
    let mut rng = ChaCha8Rng::seed_from_u64(15);
    let opts = KeyOptionsBuilder::default()
        .curve(Some("ed25519".into()))
        .user_ids(vec!["Kim <k@x>".into()])
        .key_expiration_time(Some(3600))
        .build()
        .unwrap();
    let mut key = generate(&mut rng, &config, opts).unwrap();
    let created = key.primary_key.created_at();

    assert_eq!(
        key.verify_primary_key(&config, created - Duration::seconds(1)),
        KeyStatus::Invalid,
        "before creation no self certification is live"
    );
    assert_eq!(key.verify_primary_key(&config, created), KeyStatus::Valid);
    assert_eq!(
        key.verify_primary_key(&config, created + Duration::seconds(3599)),
        KeyStatus::Valid
    );
    assert_eq!(
        key.verify_primary_key(&config, created + Duration::seconds(3600)),
        KeyStatus::Expired
    );

    assert_eq!(
        key.get_expiration_time(&config),
        Some(created + Duration::seconds(3600))
    );
    assert_eq!(
        key.subkeys[0].get_expiration_time(),
        Some(created + Duration::seconds(3600))
    );

    // a key without an expiration never lapses
    let mut forever = ed25519_key(16, "Lee <l@x>");
    assert_eq!(forever.get_expiration_time(&config), None);
    assert_eq!(forever.subkeys[0].get_expiration_time(), None);
    assert_eq!(
        forever.verify_primary_key(&config, tpk::util::now() + Duration::days(10000)),
        KeyStatus::Valid
    );
}

#[test]
fn test_operation_selector_disjointness() {
    // property 8
    let config = Config::default();
    let now = tpk::util::now();
    let mut key = ed25519_key(17, "Mallory <m@x>");

    let signing = key
        .get_signing_key_packet(&config, None, now)
        .expect("no signing key")
        .clone();
    assert_eq!(signing.algorithm(), PublicKeyAlgorithm::EdDSA);
    assert!(signing.algorithm().can_sign());

    let encryption = key
        .get_encryption_key_packet(&config, None, now)
        .expect("no encryption key")
        .clone();
    assert_eq!(encryption.algorithm(), PublicKeyAlgorithm::ECDH);
    assert!(encryption.algorithm().can_encrypt());
    assert!(encryption.is_subkey());

    // the hint restricts the search; the wildcard id matches anything
    let subkey_id = key.subkeys[0].key.key_id().clone();
    let hinted = key
        .get_encryption_key_packet(&config, Some(&subkey_id), now)
        .unwrap();
    assert_eq!(hinted.key_id(), &subkey_id);
    assert!(key
        .get_encryption_key_packet(&config, Some(&KeyId::wildcard()), now)
        .is_some());
    assert!(key
        .get_signing_key_packet(&config, Some(&subkey_id), now)
        .is_none());

    assert!(matches!(
        key.signing_key_packet(&config, Some(&subkey_id), now),
        Err(Error::SigningKeyNotFound)
    ));
}

#[test]
fn test_param_table_closure() {
    // property 9
    use tpk::crypto::params::{pub_key_param_shapes, secret_key_param_shapes};

    let key = ed25519_key(18, "Nico <n@x>");
    for packet in [&key.primary_key, &key.subkeys[0].key] {
        let pub_shapes = pub_key_param_shapes(packet.algorithm()).unwrap();
        assert_eq!(packet.public_params().len(), pub_shapes.len());
        for (value, kind) in packet.public_params().iter().zip(pub_shapes) {
            assert!(value.matches_kind(*kind));
        }

        let secret_shapes = secret_key_param_shapes(packet.algorithm()).unwrap();
        let secret = packet.plain_secret_params().unwrap();
        assert_eq!(secret.len(), secret_shapes.len());
        for (value, kind) in secret.iter().zip(secret_shapes) {
            assert!(value.matches_kind(*kind));
        }
    }
}

#[test]
fn test_passphrase_lifecycle() {
    let mut rng = ChaCha8Rng::seed_from_u64(19);
    let mut key = rsa_key();

    assert!(key.is_private());
    assert!(!key.is_decrypted());
    key.decrypt_secrets("pw").expect("failed to unlock");
    assert!(key.is_decrypted());

    let mut public = key.to_public();
    assert!(matches!(
        public.decrypt_secrets("pw"),
        Err(Error::NothingToDecrypt)
    ));
    assert!(matches!(
        public.encrypt_secrets(&mut rng, "pw"),
        Err(Error::NothingToEncrypt)
    ));
}

#[test]
fn test_reformat_rsa() {
    let config = Config::default();
    let mut rng = ChaCha8Rng::seed_from_u64(20);
    let mut key = rsa_key();
    key.decrypt_secrets("pw").unwrap();

    let opts = KeyOptionsBuilder::default()
        .user_ids(vec!["Renamed <r@x>".into()])
        .build()
        .unwrap();
    let reformatted = reformat(&mut rng, &config, &key, opts).expect("reformat failed");

    assert_eq!(reformatted.fingerprint(), key.fingerprint());
    assert_eq!(reformatted.user_ids(), vec!["Renamed <r@x>".to_string()]);
    assert_eq!(reformatted.subkeys.len(), 1);

    let eddsa = ed25519_key(21, "Olive <o@x>");
    let opts = KeyOptionsBuilder::default()
        .user_ids(vec!["nope".into()])
        .build()
        .unwrap();
    assert!(matches!(
        reformat(&mut rng, &config, &eddsa, opts),
        Err(Error::UnsupportedKeyType { .. })
    ));
}

#[test]
fn test_generator_rejects_deprecated_algorithms() {
    let config = Config::default();
    let mut rng = ChaCha8Rng::seed_from_u64(22);

    let opts = KeyOptionsBuilder::default()
        .key_type(Some(PublicKeyAlgorithm::RSAEncrypt))
        .user_ids(vec!["x".into()])
        .build()
        .unwrap();
    assert!(matches!(
        generate(&mut rng, &config, opts),
        Err(Error::UnsupportedKeyType { .. })
    ));

    let opts = KeyOptionsBuilder::default()
        .curve(Some("ed25519".into()))
        .subkey_type(Some(PublicKeyAlgorithm::ECDSA))
        .user_ids(vec!["x".into()])
        .build()
        .unwrap();
    assert!(matches!(
        generate(&mut rng, &config, opts),
        Err(Error::UnsupportedSubkeyType { .. })
    ));

    let opts = KeyOptionsBuilder::default()
        .curve(Some("wiggly25519".into()))
        .user_ids(vec!["x".into()])
        .build()
        .unwrap();
    assert!(matches!(
        generate(&mut rng, &config, opts),
        Err(Error::UnknownCurve { .. })
    ));

    assert!(KeyOptionsBuilder::default()
        .user_ids(Vec::new())
        .build()
        .is_err());
}

#[test]
fn test_read_batches_errors() {
    let good = ed25519_key(23, "Peggy <p@x>");
    let other = ed25519_key(24, "Quinn <q@x>");

    // strip the users out of one key to corrupt it
    let mut corrupt = PacketList::new();
    corrupt.push(other.primary_key.clone());

    let ring = good.to_packet_list().concat(corrupt);
    let result = read(ring);
    assert_eq!(result.keys.len(), 1);
    assert_eq!(result.errors.len(), 1);
    assert!(matches!(result.errors[0], Error::InvalidKey { .. }));
    assert_eq!(result.keys[0].user_ids(), vec!["Peggy <p@x>".to_string()]);

    let empty = read(PacketList::new());
    assert!(empty.keys.is_empty());
    assert_eq!(empty.errors.len(), 1);

    assert!(read_armored(BlockType::PublicKey, good.to_packet_list()).is_ok());
    assert!(matches!(
        read_armored(BlockType::Message, good.to_packet_list()),
        Err(Error::MalformedArmor { .. })
    ));
}

#[test]
fn test_preference_negotiation() {
    let config = Config::default();
    let now = tpk::util::now();

    // the ed25519 curve floor lifts the hash to SHA-512
    let mut key = ed25519_key(25, "Rita <r@x>");
    assert_eq!(
        preferred_hash_algo(&config, &mut key, now),
        HashAlgorithm::Sha512
    );

    let other = ed25519_key(26, "Sam <s@x>");
    let mut keys = vec![key, other];
    assert_eq!(
        preferred_sym_algo(&config, &mut keys, now),
        SymmetricKeyAlgorithm::AES256
    );

    // a key advertising nothing forces the configured fallback
    let mut rng = ChaCha8Rng::seed_from_u64(27);
    let silent_primary = tpk::KeyPacket::generate(
        &mut rng,
        Tag::SecretKey,
        PublicKeyAlgorithm::EdDSA,
        None,
        None,
        now,
    )
    .unwrap();
    let id = UserId::from_str("Terse <t@x>");
    let cert = SignatureConfig::new(SignatureType::CertGeneric, HashAlgorithm::Sha512, now)
        .sign_user_id_certificate(&silent_primary, &silent_primary, &id)
        .unwrap();
    let mut packets = PacketList::new();
    packets.push(silent_primary);
    packets.push(id);
    packets.push(cert);
    let silent = Key::from_packets(packets).unwrap();

    let mut keys = vec![keys[0].clone(), silent];
    assert_eq!(
        preferred_sym_algo(&config, &mut keys, now),
        config.encryption_cipher
    );

    assert_eq!(preferred_sym_algo(&config, &mut [], now), config.encryption_cipher);
}
