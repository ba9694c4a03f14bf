//! Signature verification schemes used by station hardware.
//!
//! All schemes take the same three text inputs: the hex public key, the base64
//! payload and the base64 signature. They differ in how the key is laid out
//! and in which bytes were signed:
//!
//! | Scheme | Key | Signed bytes |
//! |---|---|---|
//! | `ecdsa-p256-text` | P-256 `X ‖ Y`, 128 hex chars | UTF-8 of the payload's base64 text |
//! | `ecdsa-p256-decoded` | P-256 `X ‖ Y`, 128 hex chars | base64url-decoded payload |
//! | `rsa-pkcs1-sha256` | modulus (512 hex chars) ‖ exponent | SHA-256 of the ASCII payload, PKCS#1 v1.5 |

use p256::ecdsa::signature::Verifier as _;
use p256::ecdsa::{Signature, VerifyingKey};
use p256::EncodedPoint;
use rsa::{BigUint, Pkcs1v15Sign, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::encoding::{decode_b64url, decode_hex_exact};
use crate::{IdentityError, IdentityResult};

/// Hex characters encoding one P-256 affine coordinate.
pub const P256_COORDINATE_HEX_LEN: usize = 64;

/// Raw `R ‖ S` signature length for P-256.
pub const P256_RAW_SIGNATURE_LEN: usize = 64;

/// Hex characters encoding the 2048-bit RSA modulus.
pub const RSA_MODULUS_HEX_LEN: usize = 512;

/// Verification scheme for one family of station hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scheme {
    /// ECDSA P-256/SHA-256 over the payload's base64 text
    EcdsaP256Text,
    /// ECDSA P-256/SHA-256 over the decoded payload bytes
    EcdsaP256Decoded,
    /// RSA PKCS#1 v1.5 over a SHA-256 digest of the payload text
    RsaPkcs1Sha256,
}

impl Scheme {
    pub const ALL: [Scheme; 3] = [
        Scheme::EcdsaP256Text,
        Scheme::EcdsaP256Decoded,
        Scheme::RsaPkcs1Sha256,
    ];

    /// Configuration name of the scheme.
    pub fn name(&self) -> &'static str {
        match self {
            Scheme::EcdsaP256Text => "ecdsa-p256-text",
            Scheme::EcdsaP256Decoded => "ecdsa-p256-decoded",
            Scheme::RsaPkcs1Sha256 => "rsa-pkcs1-sha256",
        }
    }

    /// Check a signature, collapsing every failure to `false`.
    pub fn verify(&self, public_key_hex: &str, payload_b64: &str, signature_b64: &str) -> bool {
        self.check(public_key_hex, payload_b64, signature_b64).is_ok()
    }

    /// Check a signature, reporting why it failed.
    pub fn check(
        &self,
        public_key_hex: &str,
        payload_b64: &str,
        signature_b64: &str,
    ) -> IdentityResult<()> {
        match self {
            Scheme::EcdsaP256Text => {
                let key = p256_verifying_key(public_key_hex)?;
                let signature = p256_signature(signature_b64)?;
                key.verify(payload_b64.as_bytes(), &signature)
                    .map_err(|_| IdentityError::SignatureInvalid)
            }
            Scheme::EcdsaP256Decoded => {
                let key = p256_verifying_key(public_key_hex)?;
                let signature = p256_signature(signature_b64)?;
                let message = decode_b64url("payload", payload_b64)?;
                key.verify(&message, &signature)
                    .map_err(|_| IdentityError::SignatureInvalid)
            }
            Scheme::RsaPkcs1Sha256 => {
                let key = rsa_public_key(public_key_hex)?;
                let signature = decode_b64url("signature", signature_b64)?;
                if !payload_b64.is_ascii() {
                    return Err(IdentityError::decode("payload", "payload text is not ASCII"));
                }
                let digest = Sha256::digest(payload_b64.as_bytes());
                key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &signature)
                    .map_err(|_| IdentityError::SignatureInvalid)
            }
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scheme {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scheme::ALL
            .into_iter()
            .find(|scheme| scheme.name() == s)
            .ok_or_else(|| IdentityError::Config(format!("unknown verification scheme {s:?}")))
    }
}

/// Rebuild a P-256 key from its concatenated affine coordinates.
fn p256_verifying_key(public_key_hex: &str) -> IdentityResult<VerifyingKey> {
    if public_key_hex.len() != 2 * P256_COORDINATE_HEX_LEN || !public_key_hex.is_ascii() {
        return Err(IdentityError::decode(
            "public_key",
            format!(
                "expected {} hex chars, got {}",
                2 * P256_COORDINATE_HEX_LEN,
                public_key_hex.len()
            ),
        ));
    }
    let (x_hex, y_hex) = public_key_hex.split_at(P256_COORDINATE_HEX_LEN);
    let x: [u8; 32] = decode_hex_exact("public_key", x_hex)?;
    let y: [u8; 32] = decode_hex_exact("public_key", y_hex)?;

    let point = EncodedPoint::from_affine_coordinates(&x.into(), &y.into(), false);
    VerifyingKey::from_encoded_point(&point)
        .map_err(|_| IdentityError::decode("public_key", "point is not on P-256"))
}

/// Rebuild a P-256 signature from raw big-endian `R ‖ S`.
fn p256_signature(signature_b64: &str) -> IdentityResult<Signature> {
    let raw = decode_b64url("signature", signature_b64)?;
    if raw.len() != P256_RAW_SIGNATURE_LEN {
        return Err(IdentityError::decode(
            "signature",
            format!("expected {} bytes, got {}", P256_RAW_SIGNATURE_LEN, raw.len()),
        ));
    }
    Signature::from_slice(&raw)
        .map_err(|_| IdentityError::decode("signature", "scalar out of range"))
}

/// Rebuild an RSA key from the modulus and exponent hex concatenation.
fn rsa_public_key(public_key_hex: &str) -> IdentityResult<RsaPublicKey> {
    if public_key_hex.len() <= RSA_MODULUS_HEX_LEN || !public_key_hex.is_ascii() {
        return Err(IdentityError::decode(
            "public_key",
            format!("expected more than {} hex chars", RSA_MODULUS_HEX_LEN),
        ));
    }
    let (n_hex, e_hex) = public_key_hex.split_at(RSA_MODULUS_HEX_LEN);
    let n = BigUint::parse_bytes(n_hex.as_bytes(), 16)
        .ok_or_else(|| IdentityError::decode("public_key", "modulus is not hex"))?;
    let e = BigUint::parse_bytes(e_hex.as_bytes(), 16)
        .ok_or_else(|| IdentityError::decode("public_key", "exponent is not hex"))?;
    RsaPublicKey::new(n, e).map_err(|e| IdentityError::decode("public_key", e))
}
