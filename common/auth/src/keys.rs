//! Loading of the pre-provisioned RSA verification key.

use std::fmt;

use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use rsa::traits::PublicKeyParts;
use rsa::{pkcs1v15, pss, RsaPublicKey};
use sha2::{Sha256, Sha384, Sha512};

use crate::config::SigningAlgorithm;
use crate::error::{AuthError, AuthResult};

const SPKI_LABEL: &str = "-----BEGIN PUBLIC KEY-----";
const PKCS1_LABEL: &str = "-----BEGIN RSA PUBLIC KEY-----";

/// Parse a PEM block into an RSA public key.
///
/// Both SubjectPublicKeyInfo (`PUBLIC KEY`) and PKCS#1 (`RSA PUBLIC KEY`)
/// envelopes are accepted. A SubjectPublicKeyInfo carrying any algorithm
/// other than rsaEncryption is rejected.
pub fn parse_public_key(pem: &[u8]) -> AuthResult<RsaPublicKey> {
    let text = std::str::from_utf8(pem)
        .map_err(|_| AuthError::KeyFormat("PEM input is not valid UTF-8".into()))?
        .trim();

    if text.starts_with(SPKI_LABEL) {
        RsaPublicKey::from_public_key_pem(text)
            .map_err(|err| AuthError::KeyFormat(format!("not an RSA public key: {err}")))
    } else if text.starts_with(PKCS1_LABEL) {
        RsaPublicKey::from_pkcs1_pem(text)
            .map_err(|err| AuthError::KeyFormat(format!("invalid PKCS#1 public key: {err}")))
    } else {
        Err(AuthError::KeyFormat(
            "expected a PUBLIC KEY or RSA PUBLIC KEY PEM block".into(),
        ))
    }
}

enum SignatureVerifier {
    Rs256(pkcs1v15::VerifyingKey<Sha256>),
    Rs384(pkcs1v15::VerifyingKey<Sha384>),
    Rs512(pkcs1v15::VerifyingKey<Sha512>),
    Ps256(pss::VerifyingKey<Sha256>),
    Ps384(pss::VerifyingKey<Sha384>),
    Ps512(pss::VerifyingKey<Sha512>),
}

impl SignatureVerifier {
    fn new(key: RsaPublicKey, algorithm: SigningAlgorithm) -> Self {
        match algorithm {
            SigningAlgorithm::RS256 => Self::Rs256(pkcs1v15::VerifyingKey::new(key)),
            SigningAlgorithm::RS384 => Self::Rs384(pkcs1v15::VerifyingKey::new(key)),
            SigningAlgorithm::RS512 => Self::Rs512(pkcs1v15::VerifyingKey::new(key)),
            SigningAlgorithm::PS256 => Self::Ps256(pss::VerifyingKey::new(key)),
            SigningAlgorithm::PS384 => Self::Ps384(pss::VerifyingKey::new(key)),
            SigningAlgorithm::PS512 => Self::Ps512(pss::VerifyingKey::new(key)),
        }
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        match self {
            Self::Rs256(key) => pkcs1v15_verify(key, message, signature),
            Self::Rs384(key) => pkcs1v15_verify(key, message, signature),
            Self::Rs512(key) => pkcs1v15_verify(key, message, signature),
            Self::Ps256(key) => pss_verify(key, message, signature),
            Self::Ps384(key) => pss_verify(key, message, signature),
            Self::Ps512(key) => pss_verify(key, message, signature),
        }
    }
}

fn pkcs1v15_verify<V>(key: &V, message: &[u8], signature: &[u8]) -> bool
where
    V: Verifier<pkcs1v15::Signature>,
{
    pkcs1v15::Signature::try_from(signature)
        .and_then(|signature| key.verify(message, &signature))
        .is_ok()
}

fn pss_verify<V>(key: &V, message: &[u8], signature: &[u8]) -> bool
where
    V: Verifier<pss::Signature>,
{
    pss::Signature::try_from(signature)
        .and_then(|signature| key.verify(message, &signature))
        .is_ok()
}

/// Verification key bound to exactly one configured algorithm.
pub struct VerificationKey {
    algorithm: SigningAlgorithm,
    bits: usize,
    verifier: SignatureVerifier,
}

impl VerificationKey {
    /// Parse `pem` and prepare a verifier for `algorithm`.
    ///
    /// Key length is measured as the modulus byte length in bits, so a
    /// 1023-bit modulus counts as a 1024-bit key.
    pub fn from_pem(
        pem: &[u8],
        algorithm: SigningAlgorithm,
        min_bits: usize,
    ) -> AuthResult<Self> {
        let key = parse_public_key(pem)?;
        let bits = key.size() * 8;
        if bits < min_bits {
            return Err(AuthError::KeyFormat(format!(
                "RSA key is {bits} bits, minimum is {min_bits}"
            )));
        }

        Ok(Self {
            algorithm,
            bits,
            verifier: SignatureVerifier::new(key, algorithm),
        })
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Check `signature` over `message`; any failure is `InvalidSignature`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> AuthResult<()> {
        if self.verifier.verify(message, signature) {
            Ok(())
        } else {
            Err(AuthError::InvalidSignature)
        }
    }
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationKey")
            .field("algorithm", &self.algorithm)
            .field("bits", &self.bits)
            .finish_non_exhaustive()
    }
}
