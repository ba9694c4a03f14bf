//! Hardware attestation of weather-station telemetry.
//!
//! Every reading that contributes to a market decision must carry a signature
//! produced by the station's hardware key. This crate reconstructs the public
//! key and signature from their text encodings and checks them with the
//! verification scheme registered for the station's hardware model.
//!
//! # Core Concepts
//!
//! - **Scheme**: one way of checking a signature ([`Scheme`]). Two ECDSA P-256
//!   variants that differ only in the bytes that were signed, and RSA PKCS#1
//!   v1.5 over a SHA-256 digest.
//! - **Scheme Table**: the model-code to scheme mapping ([`SchemeTable`]),
//!   configurable and validated against the known hardware catalog at startup.
//! - **Verifier**: batch filter that drops every record failing attestation
//!   ([`SignatureVerifier`]).
//!
//! # Failure Model
//!
//! Verification failures are local to a record:
//! - Unsupported hardware models are logged distinctly from forged signatures
//! - Malformed hex or base64 input counts as a rejected signature
//! - No per-record failure ever aborts a batch

pub mod error;
pub mod scheme;
pub mod table;
pub mod verifier;

mod encoding;

pub use error::{IdentityError, IdentityResult};
pub use scheme::Scheme;
pub use table::{SchemeTable, REFERENCE_CATALOG};
pub use verifier::{SignatureVerifier, VerificationReport, VerificationTally};
