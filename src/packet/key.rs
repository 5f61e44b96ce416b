use aes::Aes256;
use byteorder::{BigEndian, WriteBytesExt};
use cfb_mode::{Decryptor, Encryptor};
use chrono::{DateTime, Utc};
use cipher::{AsyncStreamCipher, KeyIvInit};
use digest::Digest;
use rand::{CryptoRng, Rng};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::crypto::params::{
    emit_params, parse_params, pub_key_param_shapes, secret_key_param_shapes,
};
use crate::crypto::{
    ecc_curve_from_oid, ecdh, ecdsa, eddsa, rsa, ECCCurve, HashAlgorithm, PublicKeyAlgorithm,
};
use crate::errors::{Error, Result};
use crate::types::{Fingerprint, KeyId, KeyVersion, ParamValue, Tag};

/// Key material in packet form.
///
/// One struct covers all four variants: primary vs. subkey and public vs.
/// secret are both discriminated by the packet [`Tag`]. A packet with a
/// secret tag always carries [`SecretParams`]; `to_public` strips them and
/// flips the tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPacket {
    tag: Tag,
    version: KeyVersion,
    algorithm: PublicKeyAlgorithm,
    created_at: DateTime<Utc>,
    /// v3 keys carry their expiration on the packet, in days.
    expiration_days: Option<u16>,
    public_params: Vec<ParamValue>,
    secret_params: Option<SecretParams>,
    fingerprint: Fingerprint,
    key_id: KeyId,
}

/// Secret parameter state of a secret key packet.
///
/// `plain` and `locked` can coexist: encrypting under a passphrase keeps
/// the plain copy in memory until `clear_private_params` drops it. The
/// decrypted flag of the packet is simply `plain.is_some()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretParams {
    plain: Option<PlainSecretParams>,
    locked: Option<LockedSecretParams>,
}

#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub struct PlainSecretParams {
    #[debug("..")]
    values: Vec<ParamValue>,
}

/// Passphrase-locked secret parameters: the emitted secret parameter
/// vector plus a SHA-1 checksum, wrapped with AES-256-CFB under an
/// iterated-SHA-256 key. Not an S2K interchange format.
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub struct LockedSecretParams {
    salt: [u8; 16],
    iv: [u8; 16],
    #[debug("{} bytes", ciphertext.len())]
    ciphertext: Vec<u8>,
}

const LOCK_KDF_ROUNDS: usize = 65536;
const CHECKSUM_LEN: usize = 20;

fn derive_lock_key(salt: &[u8; 16], passphrase: &str) -> Zeroizing<[u8; 32]> {
    let mut digest = {
        let mut seed = Zeroizing::new(Vec::with_capacity(16 + passphrase.len()));
        seed.extend_from_slice(salt);
        seed.extend_from_slice(passphrase.as_bytes());
        Sha256::digest(&*seed)
    };
    for _ in 1..LOCK_KDF_ROUNDS {
        digest = Sha256::digest(digest.as_slice());
    }

    let mut key = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(digest.as_slice());
    key
}

impl KeyPacket {
    /// Create a public key packet from its parts, validating the parameter
    /// vector against the algorithm's shape table.
    pub fn new_public(
        tag: Tag,
        version: KeyVersion,
        algorithm: PublicKeyAlgorithm,
        created_at: DateTime<Utc>,
        expiration_days: Option<u16>,
        public_params: Vec<ParamValue>,
    ) -> Result<Self> {
        ensure!(
            tag.is_key_tag() && !tag.is_secret_tag(),
            "not a public key tag: {:?}",
            tag
        );
        Self::from_parts(
            tag,
            version,
            algorithm,
            created_at,
            expiration_days,
            public_params,
            None,
        )
    }

    /// Create a secret key packet with plain (decrypted) secret material.
    pub fn new_secret(
        tag: Tag,
        version: KeyVersion,
        algorithm: PublicKeyAlgorithm,
        created_at: DateTime<Utc>,
        expiration_days: Option<u16>,
        public_params: Vec<ParamValue>,
        secret_values: Vec<ParamValue>,
    ) -> Result<Self> {
        ensure!(tag.is_secret_tag(), "not a secret key tag: {:?}", tag);
        let shapes = secret_key_param_shapes(algorithm)?;
        ensure_eq!(
            shapes.len(),
            secret_values.len(),
            "secret parameter count mismatch"
        );
        Self::from_parts(
            tag,
            version,
            algorithm,
            created_at,
            expiration_days,
            public_params,
            Some(SecretParams {
                plain: Some(PlainSecretParams {
                    values: secret_values,
                }),
                locked: None,
            }),
        )
    }

    fn from_parts(
        tag: Tag,
        version: KeyVersion,
        algorithm: PublicKeyAlgorithm,
        created_at: DateTime<Utc>,
        expiration_days: Option<u16>,
        public_params: Vec<ParamValue>,
        secret_params: Option<SecretParams>,
    ) -> Result<Self> {
        let shapes = pub_key_param_shapes(algorithm)?;
        ensure_eq!(
            shapes.len(),
            public_params.len(),
            "public parameter count mismatch"
        );
        for (kind, value) in shapes.iter().zip(&public_params) {
            ensure!(
                value.matches_kind(*kind),
                "public parameter shape mismatch for {:?}",
                algorithm
            );
        }

        let created_at = created_at.with_timezone(&Utc);
        let fingerprint = compute_fingerprint(
            version,
            algorithm,
            created_at,
            expiration_days,
            &public_params,
        )?;
        let key_id = compute_key_id(version, &fingerprint, &public_params)?;

        Ok(KeyPacket {
            tag,
            version,
            algorithm,
            created_at,
            expiration_days,
            public_params,
            secret_params,
            fingerprint,
            key_id,
        })
    }

    /// Generate fresh secret key material.
    ///
    /// `num_bits` applies to RSA, `curve` to the ECC algorithms. The
    /// resulting packet is a v4 secret (sub)key with plain parameters.
    pub fn generate<R: Rng + CryptoRng>(
        rng: &mut R,
        tag: Tag,
        algorithm: PublicKeyAlgorithm,
        num_bits: Option<u32>,
        curve: Option<&ECCCurve>,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        ensure!(tag.is_secret_tag(), "can only generate secret packets");

        let (public_params, secret_values) = match algorithm {
            PublicKeyAlgorithm::RSA => {
                let bits = num_bits.unwrap_or(2048);
                rsa::generate_key(rng, bits as usize)?
            }
            PublicKeyAlgorithm::EdDSA => eddsa::generate_key(rng)?,
            PublicKeyAlgorithm::ECDSA => {
                let curve = curve.ok_or_else(|| format_err!("ECDSA requires a curve"))?;
                ecdsa::generate_key(rng, curve)?
            }
            PublicKeyAlgorithm::ECDH => {
                let curve = curve.ok_or_else(|| format_err!("ECDH requires a curve"))?;
                ecdh::generate_key(rng, curve)?
            }
            _ => unsupported_err!("key generation for {:?}", algorithm),
        };

        Self::new_secret(
            tag,
            KeyVersion::V4,
            algorithm,
            created_at,
            None,
            public_params,
            secret_values,
        )
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn version(&self) -> KeyVersion {
        self.version
    }

    pub fn algorithm(&self) -> PublicKeyAlgorithm {
        self.algorithm
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expiration_days(&self) -> Option<u16> {
        self.expiration_days
    }

    pub fn public_params(&self) -> &[ParamValue] {
        &self.public_params
    }

    pub fn is_subkey(&self) -> bool {
        self.tag.is_subkey_tag()
    }

    /// Whether this packet carries secret material.
    pub fn is_secret(&self) -> bool {
        self.tag.is_secret_tag()
    }

    /// Whether the secret material is present in usable (plain) form.
    pub fn is_decrypted(&self) -> bool {
        self.secret_params
            .as_ref()
            .is_some_and(|s| s.plain.is_some())
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn key_id(&self) -> &KeyId {
        &self.key_id
    }

    /// The packet with secret material stripped and the tag flipped to the
    /// public variant. Fingerprints are computed over the public body, so
    /// they are unchanged.
    pub fn to_public(&self) -> KeyPacket {
        let tag = match self.tag {
            Tag::SecretKey => Tag::PublicKey,
            Tag::SecretSubkey => Tag::PublicSubkey,
            t => t,
        };

        KeyPacket {
            tag,
            secret_params: None,
            ..self.clone()
        }
    }

    /// Serializes the public portion: version, creation time, v3
    /// expiration, algorithm id and the public parameter vector.
    pub fn write_public_key(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.push(u8::from(self.version));
        out.write_u32::<BigEndian>(self.created_at.timestamp() as u32)?;
        if self.version == KeyVersion::V3 {
            out.write_u16::<BigEndian>(self.expiration_days.unwrap_or(0))?;
        }
        out.push(u8::from(self.algorithm));

        let shapes = pub_key_param_shapes(self.algorithm)?;
        out.extend_from_slice(&emit_params(shapes, &self.public_params)?);
        Ok(out)
    }

    /// The plain secret parameter vector, or `NotDecrypted` when only the
    /// locked form is present.
    pub fn plain_secret_params(&self) -> Result<&[ParamValue]> {
        let secret = self
            .secret_params
            .as_ref()
            .ok_or_else(|| format_err!("no secret material on {:?}", self.tag))?;
        match &secret.plain {
            Some(plain) => Ok(&plain.values),
            None => Err(Error::NotDecrypted),
        }
    }

    /// Lock the secret parameters under the given passphrase. The plain
    /// copy stays in memory until `clear_private_params`.
    pub fn encrypt<R: Rng + CryptoRng>(&mut self, rng: &mut R, passphrase: &str) -> Result<()> {
        let shapes = secret_key_param_shapes(self.algorithm)?;
        let secret = self
            .secret_params
            .as_mut()
            .ok_or_else(|| format_err!("no secret material on {:?}", self.tag))?;
        let plain = secret.plain.as_ref().ok_or(Error::NotDecrypted)?;

        let mut salt = [0u8; 16];
        let mut iv = [0u8; 16];
        rng.fill_bytes(&mut salt);
        rng.fill_bytes(&mut iv);

        let mut data = emit_params(shapes, &plain.values)?;
        let checksum = sha1::Sha1::digest(&data);
        data.extend_from_slice(checksum.as_slice());

        let key = derive_lock_key(&salt, passphrase);
        Encryptor::<Aes256>::new_from_slices(&*key, &iv)?.encrypt(&mut data);

        secret.locked = Some(LockedSecretParams {
            salt,
            iv,
            ciphertext: data,
        });
        Ok(())
    }

    /// Unlock the secret parameters with the given passphrase. A no-op if
    /// the plain copy is still present.
    pub fn decrypt(&mut self, passphrase: &str) -> Result<()> {
        let shapes = secret_key_param_shapes(self.algorithm)?;
        let secret = self
            .secret_params
            .as_mut()
            .ok_or_else(|| format_err!("no secret material on {:?}", self.tag))?;
        if secret.plain.is_some() {
            return Ok(());
        }
        let locked = secret
            .locked
            .as_ref()
            .ok_or_else(|| format_err!("no locked secret parameters"))?;

        let key = derive_lock_key(&locked.salt, passphrase);
        let mut data = locked.ciphertext.clone();
        Decryptor::<Aes256>::new_from_slices(&*key, &locked.iv)?.decrypt(&mut data);

        ensure!(data.len() > CHECKSUM_LEN, "locked blob too short");
        let (body, checksum) = data.split_at(data.len() - CHECKSUM_LEN);
        let expected = sha1::Sha1::digest(body);
        ensure!(
            checksum == expected.as_slice(),
            "checksum mismatch, wrong passphrase"
        );

        let values = parse_params(shapes, body)?;
        secret.plain = Some(PlainSecretParams { values });
        Ok(())
    }

    /// Drop the in-memory plain parameters, leaving only the locked form.
    pub fn clear_private_params(&mut self) -> Result<()> {
        let secret = self
            .secret_params
            .as_mut()
            .ok_or_else(|| format_err!("no secret material on {:?}", self.tag))?;
        ensure!(
            secret.locked.is_some(),
            "clearing plain parameters would render the key unusable"
        );
        secret.plain = None;
        Ok(())
    }

    /// The curve of an ECC key packet.
    pub fn curve(&self) -> Result<ECCCurve> {
        let oid = self.public_params[0]
            .as_oid()
            .ok_or_else(|| format_err!("{:?} key has no curve oid", self.algorithm))?;
        ecc_curve_from_oid(oid).ok_or_else(|| format_err!("malformed curve oid"))
    }

    fn rsa_pub(&self) -> Result<(&[u8], &[u8])> {
        let n = self.public_params[0]
            .as_mpi()
            .ok_or_else(|| format_err!("missing modulus"))?;
        let e = self.public_params[1]
            .as_mpi()
            .ok_or_else(|| format_err!("missing exponent"))?;
        Ok((n.as_bytes(), e.as_bytes()))
    }

    fn ec_point(&self) -> Result<&[u8]> {
        let q = self.public_params[1]
            .as_mpi()
            .ok_or_else(|| format_err!("missing curve point"))?;
        Ok(q.as_bytes())
    }

    /// Verify a raw signature over a digest with this packet's public
    /// material.
    pub(crate) fn verify_digest(
        &self,
        hash: HashAlgorithm,
        digest: &[u8],
        sig: &[u8],
    ) -> Result<()> {
        match self.algorithm {
            PublicKeyAlgorithm::RSA
            | PublicKeyAlgorithm::RSAEncrypt
            | PublicKeyAlgorithm::RSASign => {
                let (n, e) = self.rsa_pub()?;
                rsa::verify(n, e, hash, digest, sig)
            }
            PublicKeyAlgorithm::ECDSA => {
                let curve = self.curve()?;
                ecdsa::verify(&curve, self.ec_point()?, digest, sig)
            }
            PublicKeyAlgorithm::EdDSA => eddsa::verify(self.ec_point()?, hash, digest, sig),
            alg => unsupported_err!("signature verification with {:?}", alg),
        }
    }

    /// Produce a raw signature over a digest with this packet's plain
    /// secret material.
    pub(crate) fn sign_digest(&self, hash: HashAlgorithm, digest: &[u8]) -> Result<Vec<u8>> {
        let secret = self.plain_secret_params()?;
        match self.algorithm {
            PublicKeyAlgorithm::RSA
            | PublicKeyAlgorithm::RSAEncrypt
            | PublicKeyAlgorithm::RSASign => {
                let (n, e) = self.rsa_pub()?;
                let d = secret[0].as_mpi().ok_or_else(|| format_err!("missing d"))?;
                let p = secret[1].as_mpi().ok_or_else(|| format_err!("missing p"))?;
                let q = secret[2].as_mpi().ok_or_else(|| format_err!("missing q"))?;
                rsa::sign(
                    n,
                    e,
                    d.as_bytes(),
                    p.as_bytes(),
                    q.as_bytes(),
                    hash,
                    digest,
                )
            }
            PublicKeyAlgorithm::ECDSA => {
                let curve = self.curve()?;
                let d = secret[0].as_mpi().ok_or_else(|| format_err!("missing d"))?;
                ecdsa::sign(&curve, d.as_bytes(), digest)
            }
            PublicKeyAlgorithm::EdDSA => {
                let d = secret[0].as_mpi().ok_or_else(|| format_err!("missing d"))?;
                eddsa::sign(d.as_bytes(), digest)
            }
            alg => unsupported_err!("signing with {:?}", alg),
        }
    }
}

fn compute_fingerprint(
    version: KeyVersion,
    algorithm: PublicKeyAlgorithm,
    created_at: DateTime<Utc>,
    _expiration_days: Option<u16>,
    public_params: &[ParamValue],
) -> Result<Fingerprint> {
    match version {
        KeyVersion::V3 => {
            // MD5 over the raw modulus and exponent bodies
            let mut hasher = md5::Md5::new();
            for value in public_params {
                if let Some(mpi) = value.as_mpi() {
                    hasher.update(mpi.as_bytes());
                }
            }
            Fingerprint::new(version, hasher.finalize().as_slice())
        }
        KeyVersion::V4 => {
            let mut body = Vec::new();
            body.push(u8::from(version));
            body.write_u32::<BigEndian>(created_at.timestamp() as u32)?;
            body.push(u8::from(algorithm));
            let shapes = pub_key_param_shapes(algorithm)?;
            body.extend_from_slice(&emit_params(shapes, public_params)?);

            let mut hasher = sha1::Sha1::new();
            hasher.update([0x99]);
            hasher.update((body.len() as u16).to_be_bytes());
            hasher.update(&body);
            Fingerprint::new(version, hasher.finalize().as_slice())
        }
        KeyVersion::Other(v) => bail!("unsupported key version {}", v),
    }
}

fn compute_key_id(
    version: KeyVersion,
    fingerprint: &Fingerprint,
    public_params: &[ParamValue],
) -> Result<KeyId> {
    match version {
        KeyVersion::V3 => {
            // low 64 bits of the modulus
            let n = public_params
                .first()
                .and_then(ParamValue::as_mpi)
                .ok_or_else(|| format_err!("v3 key without modulus"))?;
            let bytes = n.as_bytes();
            ensure!(bytes.len() >= 8, "modulus too short");
            KeyId::from_slice(&bytes[bytes.len() - 8..])
        }
        _ => {
            let bytes = fingerprint.as_bytes();
            KeyId::from_slice(&bytes[bytes.len() - 8..])
        }
    }
}
