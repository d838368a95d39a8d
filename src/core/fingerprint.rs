//! Content fingerprints used for change detection.

use sha2::{Digest, Sha256};
use std::fmt;

/// A SHA-256 digest of a data blob.
///
/// Two blobs with equal fingerprints are treated as identical content, so a
/// refresh that yields the recorded fingerprint is a no-op.
///
/// # Examples
///
/// ```rust
/// use hotswap_reload::core::Fingerprint;
///
/// let a = Fingerprint::of(br#"{"x":1}"#);
/// let b = Fingerprint::of(br#"{"x":1}"#);
/// let c = Fingerprint::of(br#"{"x":2}"#);
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Compute the fingerprint of `data`.
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First 16 hex characters, enough to tell versions apart in logs and file names.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.short())
    }
}

/// Returns true if `new` differs from the recorded fingerprint.
///
/// Nothing recorded yet counts as changed.
pub(crate) fn has_changed(recorded: Option<&Fingerprint>, new: &Fingerprint) -> bool {
    recorded != Some(new)
}
