use crate::cipher::{MessageDecrypter, MessageEncrypter};
use crate::error::Error;
use crate::msgs::message::{BorrowedPlainMessage, OpaqueMessage, PlainMessage};

#[derive(PartialEq)]
enum DirectionState {
    /// No keying material.
    Invalid,

    /// Keying material present, but not yet in use: the "pending" cipher
    /// spec, installed by the key exchange and waiting for the
    /// ChangeCipherSpec pivot.
    Prepared,

    /// Keying material in use.
    Active,
}

/// Record layer that tracks decryption and encryption keys and the
/// per-direction sequence numbers.
pub(crate) struct RecordLayer {
    message_encrypter: Box<dyn MessageEncrypter>,
    message_decrypter: Box<dyn MessageDecrypter>,
    write_seq: u64,
    read_seq: u64,
    encrypt_state: DirectionState,
    decrypt_state: DirectionState,
}

impl RecordLayer {
    /// Create new record layer with no keys.
    pub(crate) fn new() -> Self {
        Self {
            message_encrypter: <dyn MessageEncrypter>::invalid(),
            message_decrypter: <dyn MessageDecrypter>::invalid(),
            write_seq: 0,
            read_seq: 0,
            encrypt_state: DirectionState::Invalid,
            decrypt_state: DirectionState::Invalid,
        }
    }

    /// Decrypt a TLS message.
    ///
    /// `encr` is a decoded message allegedly received from the peer. If
    /// the read direction is not yet active the payload passes through
    /// untouched. A successful decryption advances `read_seq`.
    pub(crate) fn decrypt_incoming(&mut self, encr: OpaqueMessage) -> Result<PlainMessage, Error> {
        if self.decrypt_state != DirectionState::Active {
            return Ok(encr.into_plain_message());
        }

        let plain = self
            .message_decrypter
            .decrypt(encr, self.read_seq)?;
        self.read_seq += 1;
        Ok(plain)
    }

    /// Encrypt a TLS message.
    ///
    /// Before the write direction is promoted the message passes through
    /// as plaintext; afterwards each message consumes one `write_seq`
    /// value.
    pub(crate) fn encrypt_outgoing(
        &mut self,
        plain: BorrowedPlainMessage<'_>,
    ) -> Result<OpaqueMessage, Error> {
        if self.encrypt_state != DirectionState::Active {
            return Ok(plain.to_unencrypted_opaque());
        }

        let seq = self.write_seq;
        self.write_seq += 1;
        self.message_encrypter.encrypt(plain, seq)
    }

    /// Prepare to use the given `MessageEncrypter` for future message
    /// encryption. It is not used until you call `start_encrypting`.
    pub(crate) fn prepare_message_encrypter(&mut self, cipher: Box<dyn MessageEncrypter>) {
        self.message_encrypter = cipher;
        self.write_seq = 0;
        self.encrypt_state = DirectionState::Prepared;
    }

    /// Prepare to use the given `MessageDecrypter` for future message
    /// decryption. It is not used until you call `start_decrypting`.
    pub(crate) fn prepare_message_decrypter(&mut self, cipher: Box<dyn MessageDecrypter>) {
        self.message_decrypter = cipher;
        self.read_seq = 0;
        self.decrypt_state = DirectionState::Prepared;
    }

    /// Start using the `MessageEncrypter` previously provided to the
    /// previous call to `prepare_message_encrypter`.
    pub(crate) fn start_encrypting(&mut self) {
        debug_assert!(self.encrypt_state == DirectionState::Prepared);
        self.encrypt_state = DirectionState::Active;
    }

    /// Start using the `MessageDecrypter` previously provided to the
    /// previous call to `prepare_message_decrypter`.
    pub(crate) fn start_decrypting(&mut self) {
        debug_assert!(self.decrypt_state == DirectionState::Prepared);
        self.decrypt_state = DirectionState::Active;
    }

    /// True once an inbound ChangeCipherSpec has been promoted.
    #[cfg(test)]
    pub(crate) fn is_decrypting(&self) -> bool {
        self.decrypt_state == DirectionState::Active
    }

    /// True if a pending read cipher is installed but not yet promoted.
    pub(crate) fn is_decrypt_prepared(&self) -> bool {
        self.decrypt_state == DirectionState::Prepared
    }

    pub(crate) fn is_encrypting(&self) -> bool {
        self.encrypt_state == DirectionState::Active
    }

    #[cfg(test)]
    pub(crate) fn read_seq(&self) -> u64 {
        self.read_seq
    }

    #[cfg(test)]
    pub(crate) fn write_seq(&self) -> u64 {
        self.write_seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{ContentType, ProtocolVersion};

    struct PassThroughDecrypter;

    impl MessageDecrypter for PassThroughDecrypter {
        fn decrypt(&mut self, m: OpaqueMessage, _: u64) -> Result<PlainMessage, Error> {
            Ok(m.into_plain_message())
        }
    }

    fn opaque() -> OpaqueMessage {
        OpaqueMessage {
            typ: ContentType::Handshake,
            version: ProtocolVersion::TLSv1_2,
            payload: vec![0xc0, 0xff, 0xee],
        }
    }

    #[test]
    fn decrypter_lifecycle() {
        // A record layer starts out invalid and passes messages through.
        let mut record_layer = RecordLayer::new();
        assert!(!record_layer.is_decrypting());
        record_layer.decrypt_incoming(opaque()).unwrap();
        assert_eq!(record_layer.read_seq(), 0);

        // Preparing the record layer installs the pending spec without
        // using it.
        record_layer.prepare_message_decrypter(Box::new(PassThroughDecrypter));
        assert!(record_layer.is_decrypt_prepared());
        assert!(!record_layer.is_decrypting());
        record_layer.decrypt_incoming(opaque()).unwrap();
        assert_eq!(record_layer.read_seq(), 0);

        // Promotion starts counting sequence numbers from zero.
        record_layer.start_decrypting();
        assert!(record_layer.is_decrypting());
        record_layer.decrypt_incoming(opaque()).unwrap();
        record_layer.decrypt_incoming(opaque()).unwrap();
        assert_eq!(record_layer.read_seq(), 2);

        // Re-preparing resets the sequence number.
        record_layer.prepare_message_decrypter(Box::new(PassThroughDecrypter));
        assert_eq!(record_layer.read_seq(), 0);
    }

    #[test]
    fn encrypter_passthrough_before_promotion() {
        let mut record_layer = RecordLayer::new();
        let plain = BorrowedPlainMessage {
            typ: ContentType::Handshake,
            version: ProtocolVersion::TLSv1_2,
            payload: b"hello",
        };
        let out = record_layer.encrypt_outgoing(plain).unwrap();
        assert_eq!(out.payload, b"hello");
        assert_eq!(record_layer.write_seq(), 0);
    }
}
