use crate::enums::{ContentType, ProtocolVersion};
use crate::error::Error;
use crate::msgs::codec::{Codec, Reader};

/// A TLS frame, named `TLSPlaintext` in the standard.
///
/// This type owns its payload, which may be ciphertext on ingest and is
/// decrypted in place by the record layer.
#[derive(Debug)]
pub(crate) struct OpaqueMessage {
    pub(crate) typ: ContentType,
    pub(crate) version: ProtocolVersion,
    pub(crate) payload: Vec<u8>,
}

impl OpaqueMessage {
    /// Encode the message, producing header plus payload.
    pub(crate) fn encode(self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE + self.payload.len());
        self.typ.encode(&mut buf);
        self.version.encode(&mut buf);
        (self.payload.len() as u16).encode(&mut buf);
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Force conversion into a plaintext message, for the pre-encryption
    /// phase of the connection.
    pub(crate) fn into_plain_message(self) -> PlainMessage {
        PlainMessage {
            typ: self.typ,
            version: self.version,
            payload: self.payload,
        }
    }
}

/// A decrypted TLS frame.
#[derive(Debug)]
pub(crate) struct PlainMessage {
    pub(crate) typ: ContentType,
    pub(crate) version: ProtocolVersion,
    pub(crate) payload: Vec<u8>,
}

/// A TLS frame in plaintext, with a borrowed payload: the shape we
/// encrypt from.
#[derive(Debug)]
pub(crate) struct BorrowedPlainMessage<'a> {
    pub(crate) typ: ContentType,
    pub(crate) version: ProtocolVersion,
    pub(crate) payload: &'a [u8],
}

impl BorrowedPlainMessage<'_> {
    pub(crate) fn to_unencrypted_opaque(&self) -> OpaqueMessage {
        OpaqueMessage {
            typ: self.typ,
            version: self.version,
            payload: self.payload.to_vec(),
        }
    }
}

/// One parsed record header.
#[derive(Debug)]
pub(crate) struct RecordHeader {
    pub(crate) typ: ContentType,
    pub(crate) version: ProtocolVersion,
    pub(crate) len: usize,
}

/// Parse and validate a record header from `r`.
///
/// Returns `Ok(None)` when the reader holds fewer than five bytes: that
/// is "need more input", not an error. Version pinning is the caller's
/// business; `established` is only used to diagnose mismatches.
pub(crate) fn read_record_header(
    r: &mut Reader<'_>,
    established: Option<ProtocolVersion>,
) -> Result<Option<RecordHeader>, Error> {
    let typ = match ContentType::read(r) {
        Some(typ) => typ,
        None => return Ok(None),
    };
    if let ContentType::Unknown(_) = typ {
        return Err(Error::InvalidRecordType);
    }

    let version = match ProtocolVersion::read(r) {
        Some(version) => version,
        None => return Ok(None),
    };
    match established {
        Some(pinned) => {
            if version != pinned {
                return Err(Error::BadRecordVersion);
            }
        }
        None => {
            if !version.is_supported() {
                return Err(Error::InvalidRecordVersion);
            }
        }
    }

    let len = match u16::read(r) {
        Some(len) => usize::from(len),
        None => return Ok(None),
    };

    Ok(Some(RecordHeader { typ, version, len }))
}

/// Content type, version and size.
pub(crate) const HEADER_SIZE: usize = 1 + 2 + 2;

/// The largest single application-data payload we will produce.
pub(crate) const MAX_FRAGMENT_LEN: usize = 16_384;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_header_is_not_an_error() {
        let mut rd = Reader::init(&[0x16, 0x03]);
        assert!(matches!(read_record_header(&mut rd, None), Ok(None)));
    }

    #[test]
    fn invalid_content_type_rejected() {
        let mut rd = Reader::init(&[0x42, 0x03, 0x03, 0x00, 0x01]);
        assert_eq!(
            read_record_header(&mut rd, None).unwrap_err(),
            Error::InvalidRecordType
        );
    }

    #[test]
    fn unknown_version_rejected_before_pinning() {
        let mut rd = Reader::init(&[0x16, 0x02, 0xff, 0x00, 0x01]);
        assert_eq!(
            read_record_header(&mut rd, None).unwrap_err(),
            Error::InvalidRecordVersion
        );
    }

    #[test]
    fn version_mismatch_rejected_after_pinning() {
        let mut rd = Reader::init(&[0x16, 0x03, 0x01, 0x00, 0x01]);
        assert_eq!(
            read_record_header(&mut rd, Some(ProtocolVersion::TLSv1_2)).unwrap_err(),
            Error::BadRecordVersion
        );
    }

    #[test]
    fn encode_roundtrip() {
        let msg = OpaqueMessage {
            typ: ContentType::ApplicationData,
            version: ProtocolVersion::TLSv1_2,
            payload: vec![0xde, 0xad],
        };
        assert_eq!(msg.encode(), vec![0x17, 0x03, 0x03, 0x00, 0x02, 0xde, 0xad]);
    }
}
