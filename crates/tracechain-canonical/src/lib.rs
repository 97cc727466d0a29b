//! Canonical serialization and content hashing for batch evidence.
//!
//! A batch payload is a JSON object. Before it is stored or anchored on a
//! ledger it is re-serialized into a deterministic string (the normalized
//! record) and hashed with SHA-256. The resulting [`ContentHash`] is rendered
//! as `0x`-prefixed lowercase hex.
//!
//! Two canonicalization profiles exist:
//! - [`CanonicalProfile::Legacy`] sorts the top-level keys and uses that list
//!   as the property allowlist at every depth. Hashes produced by earlier
//!   deployments were computed this way.
//! - [`CanonicalProfile::Sorted`] sorts keys recursively (RFC 8785 style).
//!   Hashes are not compatible with the legacy profile.
//!
#![deny(missing_docs)]

/// Canonicalization of JSON objects into normalized strings.
pub mod canonicalizer;
/// Content hash primitives.
pub mod digest;
/// Ledger-facing identifiers (addresses).
pub mod identifiers;
/// ECMAScript-compatible number rendering.
pub mod number;
/// Validation helpers used by canonical types.
pub mod validation;

pub use canonicalizer::{CanonicalProfile, CanonicalizationError, Canonicalizer, HashedJson};
pub use digest::ContentHash;
pub use identifiers::{Address, TxHash};
pub use validation::ValidationError;
