//! On-wire transform variants

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the capturing hardware serialized a 32-bit word.
///
/// Each mode is an involution: applying it twice restores the original word,
/// so the same mode describes both the encoding and its inverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformMode {
    /// Word appears unchanged.
    Identity,
    /// Bit order reversed within every byte.
    BitsOnly,
    /// Byte order reversed within the word.
    BytesOnly,
    /// Bits reversed within every byte, then byte order reversed.
    BitsThenBytes,
}

impl TransformMode {
    /// All modes, in default search order.
    pub const ALL: [TransformMode; 4] = [
        TransformMode::Identity,
        TransformMode::BitsOnly,
        TransformMode::BytesOnly,
        TransformMode::BitsThenBytes,
    ];

    /// Whether this mode reverses the bits of each byte.
    pub fn reverses_bits(self) -> bool {
        matches!(self, TransformMode::BitsOnly | TransformMode::BitsThenBytes)
    }

    /// Whether this mode reverses byte order.
    pub fn reverses_bytes(self) -> bool {
        matches!(self, TransformMode::BytesOnly | TransformMode::BitsThenBytes)
    }
}

impl fmt::Display for TransformMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransformMode::Identity => "identity",
            TransformMode::BitsOnly => "bits-only",
            TransformMode::BytesOnly => "bytes-only",
            TransformMode::BitsThenBytes => "bits-then-bytes",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_components() {
        assert!(!TransformMode::Identity.reverses_bits());
        assert!(!TransformMode::Identity.reverses_bytes());
        assert!(TransformMode::BitsOnly.reverses_bits());
        assert!(TransformMode::BytesOnly.reverses_bytes());
        assert!(TransformMode::BitsThenBytes.reverses_bits());
        assert!(TransformMode::BitsThenBytes.reverses_bytes());
    }

    #[test]
    fn serde_names_are_snake_case() {
        let yaml = serde_yaml_ng::to_string(&TransformMode::BitsThenBytes).unwrap();
        assert_eq!(yaml.trim(), "bits_then_bytes");
        let mode: TransformMode = serde_yaml_ng::from_str("bytes_only").unwrap();
        assert_eq!(mode, TransformMode::BytesOnly);
    }
}
