//! Error types published by the streaming decoder.

use thiserror::Error;

/// Broad classification of a [`DecodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownSignature,
    DataDescriptorUnsupported,
    TruncatedInput,
    MalformedExtraField,
    Zip64Unsupported,
}

/// Errors that can occur while decoding an archive stream.
///
/// These are never returned from [`feed`](super::ZipStreamDecoder::feed);
/// they reach the caller as [`ArchiveEvent::Error`](super::ArchiveEvent::Error).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A record signature that is not part of the ZIP format.
    #[error("unknown signature {signature:#010x} at offset {offset}")]
    UnknownSignature {
        /// The 4-byte little-endian value that was read.
        signature: u32,
        /// Stream offset of the signature.
        offset: u64,
    },

    /// The entry's sizes are deferred to a trailing data descriptor.
    #[error("entry {file_name:?} at offset {offset} uses a data descriptor, which is not supported")]
    DataDescriptorUnsupported {
        /// Name of the offending entry.
        file_name: String,
        /// Stream offset of the entry's local header.
        offset: u64,
    },

    /// End of input was signalled while a read was still pending.
    #[error("input ended at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        /// Stream offset where the pending read starts.
        offset: u64,
        /// Bytes the pending read required.
        needed: u64,
        /// Bytes that were left in the buffer.
        available: u64,
    },

    /// An extra field region could not be fully split into sub-records.
    #[error("malformed extra field at offset {offset}: {detail}")]
    MalformedExtraField {
        /// Stream offset of the record that carries the extra field.
        offset: u64,
        detail: String,
    },

    /// A record uses 64-bit sizes or offsets.
    #[error("{record} at offset {offset} requires ZIP64, which is not supported")]
    Zip64Unsupported {
        /// Which record carried the ZIP64 marker.
        record: &'static str,
        offset: u64,
    },
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::UnknownSignature { .. } => ErrorKind::UnknownSignature,
            DecodeError::DataDescriptorUnsupported { .. } => ErrorKind::DataDescriptorUnsupported,
            DecodeError::TruncatedInput { .. } => ErrorKind::TruncatedInput,
            DecodeError::MalformedExtraField { .. } => ErrorKind::MalformedExtraField,
            DecodeError::Zip64Unsupported { .. } => ErrorKind::Zip64Unsupported,
        }
    }

    /// Whether decoding continues after this error was published.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::MalformedExtraField)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_malformed_extra_fields_are_recoverable() {
        let malformed = DecodeError::MalformedExtraField {
            offset: 0,
            detail: "3 trailing bytes".to_string(),
        };
        assert!(malformed.is_recoverable());

        let unknown = DecodeError::UnknownSignature {
            signature: 0xdeadbeef,
            offset: 12,
        };
        assert!(!unknown.is_recoverable());
        assert_eq!(unknown.kind(), ErrorKind::UnknownSignature);
    }

    #[test]
    fn display_includes_signature_in_hex() {
        let err = DecodeError::UnknownSignature {
            signature: 0x12345678,
            offset: 40,
        };
        assert_eq!(
            err.to_string(),
            "unknown signature 0x12345678 at offset 40"
        );
    }
}
