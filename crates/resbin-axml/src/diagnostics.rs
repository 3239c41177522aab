//! Reporting of recoverable decoding problems.

use std::fmt;

use resbin_res::ChunkType;

/// A non-fatal problem found while walking the chunk stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Warning {
    /// A chunk of a type the parser does not handle was skipped.
    SkippedChunk { type_id: u16 },
    /// A chunk had bytes left over after its content was decoded.
    TrailingBytes { type_id: u16, bytes: u64 },
}

impl Warning {
    pub fn type_id(&self) -> u16 {
        match self {
            Self::SkippedChunk { type_id } | Self::TrailingBytes { type_id, .. } => *type_id,
        }
    }
}

fn type_name(type_id: u16) -> &'static str {
    ChunkType::from_u16(type_id).map_or("UNKNOWN", |t| t.as_str())
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::SkippedChunk { type_id } => {
                write!(f, "skipping chunk of type {} ({type_id:#06x})", type_name(type_id))
            }
            Self::TrailingBytes { type_id, bytes } => write!(
                f,
                "skipping {bytes} bytes at the end of a {} ({type_id:#06x}) chunk",
                type_name(type_id)
            ),
        }
    }
}

/// Sink for [`Warning`]s, given to the parser at construction.
pub trait Diagnostics {
    fn warn(&mut self, warning: Warning);
}

/// Forwards warnings to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn warn(&mut self, warning: Warning) {
        match warning {
            Warning::SkippedChunk { type_id } => {
                tracing::warn!(chunk_type = type_id, "{warning}");
            }
            Warning::TrailingBytes { type_id, bytes } => {
                tracing::warn!(chunk_type = type_id, bytes, "{warning}");
            }
        }
    }
}

/// Collects warnings, mostly useful in tests.
impl Diagnostics for Vec<Warning> {
    fn warn(&mut self, warning: Warning) {
        self.push(warning);
    }
}

impl<D: Diagnostics + ?Sized> Diagnostics for &mut D {
    fn warn(&mut self, warning: Warning) {
        (**self).warn(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let skipped = Warning::SkippedChunk { type_id: 0x0202 };
        assert_eq!(
            skipped.to_string(),
            "skipping chunk of type RES_TABLE_TYPE_SPEC_TYPE (0x0202)"
        );

        let trailing = Warning::TrailingBytes {
            type_id: 0x7777,
            bytes: 4,
        };
        assert_eq!(
            trailing.to_string(),
            "skipping 4 bytes at the end of a UNKNOWN (0x7777) chunk"
        );
    }

    #[test]
    fn test_collect_through_reference() {
        fn report<D: Diagnostics>(mut sink: D) {
            sink.warn(Warning::SkippedChunk { type_id: 1 });
        }

        let mut warnings = Vec::new();
        report(&mut warnings);
        assert_eq!(warnings, vec![Warning::SkippedChunk { type_id: 1 }]);
    }
}
