use crate::enums::HandshakeType;
use crate::error::Error;
use crate::msgs::codec::{self, Codec};
use crate::msgs::handshake::{
    is_valid_handshake_type, InboundHandshake, HANDSHAKE_HEADER_SIZE, MAX_HANDSHAKE_SIZE,
};

/// This works to reconstruct TLS handshake messages from individual TLS
/// record payloads. It's guaranteed that messages output from this layer
/// contain precisely one handshake payload.
///
/// One record may carry several handshake messages, and one handshake
/// message may span several records: the joiner owns the decrypted
/// plaintext in between, so a record is never decrypted twice and the
/// residue of a half-consumed record survives across `Connection::process`
/// calls.
#[derive(Default)]
pub(crate) struct HandshakeJoiner {
    /// The message payload we're currently accumulating.
    buf: Vec<u8>,
}

impl HandshakeJoiner {
    pub(crate) fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Do we have any buffered, incomplete data?
    pub(crate) fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Take one record's decrypted handshake payload.
    pub(crate) fn push(&mut self, payload: Vec<u8>) {
        // The vast majority of the time `self.buf` will be empty since most
        // handshake messages arrive in a single record. Avoid copying in
        // that common case.
        if self.buf.is_empty() {
            self.buf = payload;
        } else {
            self.buf.extend_from_slice(&payload);
        }
    }

    /// Pop one complete handshake message off the front of the buffer.
    ///
    /// Returns `Ok(None)` if the buffered bytes do not yet form a whole
    /// message.
    pub(crate) fn pop(&mut self) -> Result<Option<InboundHandshake>, Error> {
        if self.buf.len() < HANDSHAKE_HEADER_SIZE {
            return Ok(None);
        }

        let typ = HandshakeType::from(self.buf[0]);
        if !is_valid_handshake_type(typ) {
            return Err(Error::UnknownHandshakeMessageType);
        }

        let len = codec::u24::read_bytes(&self.buf[1..HANDSHAKE_HEADER_SIZE])
            .map(usize::from)
            .ok_or(Error::InternalError)?;
        if len > MAX_HANDSHAKE_SIZE {
            return Err(Error::HandshakeMessageTooLong);
        }

        if self.buf.len() - HANDSHAKE_HEADER_SIZE < len {
            return Ok(None);
        }

        let rest = self.buf.split_off(HANDSHAKE_HEADER_SIZE + len);
        let encoded = core::mem::replace(&mut self.buf, rest);
        Ok(Some(InboundHandshake { typ, encoded }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split() {
        // Check we split two handshake messages within one record.
        let mut hj = HandshakeJoiner::new();
        assert!(hj.is_empty());

        // two HelloRequests
        hj.push(b"\x00\x00\x00\x00\x00\x00\x00\x00".to_vec());

        for _ in 0..2 {
            let msg = hj.pop().unwrap().unwrap();
            assert_eq!(msg.typ, HandshakeType::HelloRequest);
            assert!(msg.payload().is_empty());
        }
        assert!(hj.pop().unwrap().is_none());
        assert!(hj.is_empty());
    }

    #[test]
    fn join() {
        // Check we join one handshake message split over three records.
        let mut hj = HandshakeJoiner::new();

        // Introduce Finished of 16 bytes, providing 4.
        hj.push(b"\x14\x00\x00\x10\x00\x01\x02\x03\x04".to_vec());
        assert!(hj.pop().unwrap().is_none());
        assert!(!hj.is_empty());

        // 10 more bytes.
        hj.push(b"\x05\x06\x07\x08\x09\x0a\x0b\x0c\x0d\x0e".to_vec());
        assert!(hj.pop().unwrap().is_none());

        // Final 1 byte.
        hj.push(b"\x0f".to_vec());
        let msg = hj.pop().unwrap().unwrap();
        assert_eq!(msg.typ, HandshakeType::Finished);
        assert_eq!(msg.payload().len(), 16);
        assert!(hj.is_empty());
    }

    #[test]
    fn residue_survives_message_boundary() {
        // One record: a whole ServerHelloDone plus the first bytes of a
        // Finished. The residue must stay buffered for the next record.
        let mut hj = HandshakeJoiner::new();
        hj.push(b"\x0e\x00\x00\x00\x14\x00\x00\x04\xaa\xbb".to_vec());

        let msg = hj.pop().unwrap().unwrap();
        assert_eq!(msg.typ, HandshakeType::ServerHelloDone);
        assert!(hj.pop().unwrap().is_none());
        assert!(!hj.is_empty());

        hj.push(b"\xcc\xdd".to_vec());
        let msg = hj.pop().unwrap().unwrap();
        assert_eq!(msg.typ, HandshakeType::Finished);
        assert_eq!(msg.payload(), b"\xaa\xbb\xcc\xdd");
    }

    #[test]
    fn unknown_type_rejected() {
        let mut hj = HandshakeJoiner::new();
        hj.push(b"\x2f\x00\x00\x00".to_vec());
        assert_eq!(hj.pop().unwrap_err(), Error::UnknownHandshakeMessageType);
    }

    #[test]
    fn oversize_message_rejected() {
        let mut hj = HandshakeJoiner::new();
        // Certificate claiming 0x010001 bytes.
        hj.push(b"\x0b\x01\x00\x01".to_vec());
        assert_eq!(hj.pop().unwrap_err(), Error::HandshakeMessageTooLong);
    }
}
