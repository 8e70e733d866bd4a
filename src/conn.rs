use std::sync::Arc;

use log::{trace, warn};
use zeroize::Zeroize;

use crate::context::{Certificate, Context};
use crate::enums::{AlertLevel, ContentType, ProtocolVersion};
use crate::error::Error;
use crate::hash_hs::{HandshakeHash, HandshakeHashBuffer};
use crate::hs::{self, HandshakeState};
use crate::msgs::alert::AlertMessagePayload;
use crate::msgs::codec::{Codec, Reader};
use crate::msgs::hsjoiner::HandshakeJoiner;
use crate::msgs::message::{
    read_record_header, BorrowedPlainMessage, OpaqueMessage, MAX_FRAGMENT_LEN,
};
use crate::record_layer::RecordLayer;
use crate::suites::{
    SupportedCipherSuite, SUITE_AES128, SUITE_AES256, SUITE_CBC, SUITE_MD5, SUITE_RC4, SUITE_RSA,
    SUITE_SHA, SUITE_SHA256,
};

/// The running transcript hash, or the stages before and after it
/// exists.
///
/// The outbound ClientHello is buffered until the ServerHello picks a
/// version; the hash is dropped once the server's Finished verifies.
pub(crate) enum Transcript {
    Buffering(HandshakeHashBuffer),
    Hashing(HandshakeHash),
    Complete,
}

impl Transcript {
    /// Hash or buffer one encoded handshake message.
    pub(crate) fn add(&mut self, bytes: &[u8]) {
        match self {
            Self::Buffering(buffer) => buffer.add(bytes),
            Self::Hashing(hash) => hash.add(bytes),
            Self::Complete => {}
        }
    }

    /// The version is now known: replay the buffered ClientHello into
    /// the real hash.
    pub(crate) fn start_hash(&mut self, version: ProtocolVersion) -> Result<(), Error> {
        match core::mem::replace(self, Self::Complete) {
            Self::Buffering(buffer) => {
                *self = Self::Hashing(buffer.start_hash(version));
                Ok(())
            }
            _ => Err(Error::InternalError),
        }
    }

    pub(crate) fn hashing(&self) -> Option<&HandshakeHash> {
        match self {
            Self::Hashing(hash) => Some(hash),
            _ => None,
        }
    }

    pub(crate) fn complete(&mut self) {
        *self = Self::Complete;
    }
}

/// A TLS client connection.
///
/// This object is transport-agnostic: the caller shuttles bytes between
/// it and a socket. Inbound ciphertext goes through [`Connection::process`];
/// outbound handshake flights come from [`Connection::get_output`] whenever
/// [`Connection::need_to_write`] says so, and application data is wrapped
/// by [`Connection::encrypt`] once the handshake completes.
pub struct Connection {
    pub(crate) ctx: Arc<dyn Context>,
    pub(crate) state: HandshakeState,
    /// Established by the first inbound record header; all later records
    /// must agree.
    pub(crate) version: Option<ProtocolVersion>,
    pub(crate) offer_sslv3: bool,
    pub(crate) host_name: Option<String>,
    pub(crate) enabled_flags: u32,
    pub(crate) suite: Option<&'static SupportedCipherSuite>,
    pub(crate) client_random: [u8; 32],
    pub(crate) server_random: [u8; 32],
    pub(crate) master_secret: [u8; 48],
    pub(crate) transcript: Transcript,
    pub(crate) record_layer: RecordLayer,
    pub(crate) joiner: HandshakeJoiner,
    pub(crate) server_certificates: Vec<Vec<u8>>,
    pub(crate) server_cert: Option<Box<dyn Certificate>>,
    pub(crate) application_data_allowed: bool,
    pub(crate) server_supports_renegotiation_info: bool,
    last_error: Option<Error>,
}

impl Connection {
    /// Make a new connection around the caller's `Context`.
    ///
    /// No cipher-suite families are enabled initially; call
    /// [`Connection::enable_default`] (or the individual switches) before
    /// producing the first flight.
    pub fn new(ctx: Arc<dyn Context>) -> Self {
        Self {
            ctx,
            state: HandshakeState::SendClientHello,
            version: None,
            offer_sslv3: false,
            host_name: None,
            enabled_flags: 0,
            suite: None,
            client_random: [0u8; 32],
            server_random: [0u8; 32],
            master_secret: [0u8; 48],
            transcript: Transcript::Buffering(HandshakeHashBuffer::new()),
            record_layer: RecordLayer::new(),
            joiner: HandshakeJoiner::new(),
            server_certificates: Vec::new(),
            server_cert: None,
            application_data_allowed: false,
            server_supports_renegotiation_info: false,
            last_error: None,
        }
    }

    /// Offer SSL 3.0 instead of TLS 1.2 in the ClientHello.
    pub fn set_sslv3(&mut self, sslv3: bool) {
        self.offer_sslv3 = sslv3;
    }

    /// Set the name sent in the `server_name` extension. Ignored for
    /// SSLv3, which has no extensions.
    pub fn set_host_name(&mut self, name: &str) {
        self.host_name = Some(name.to_owned());
    }

    /// False start is not supported; the switch is accepted and ignored.
    pub fn enable_false_start(&mut self, _enable: bool) {}

    /// Enable every cipher-suite family in the catalog.
    pub fn enable_default(&mut self) {
        self.enabled_flags =
            SUITE_RSA | SUITE_RC4 | SUITE_MD5 | SUITE_SHA | SUITE_SHA256 | SUITE_AES128
                | SUITE_AES256 | SUITE_CBC;
    }

    /// Enable or disable RSA key exchange.
    pub fn enable_rsa(&mut self, enable: bool) {
        self.set_enabled(SUITE_RSA, enable);
    }

    /// Enable or disable the RC4 stream cipher.
    pub fn enable_rc4(&mut self, enable: bool) {
        self.set_enabled(SUITE_RC4, enable);
    }

    /// Enable or disable AES, in both key sizes.
    pub fn enable_aes(&mut self, enable: bool) {
        self.set_enabled(SUITE_AES128 | SUITE_AES256 | SUITE_CBC, enable);
    }

    /// Enable or disable MD5-MAC suites.
    pub fn enable_md5(&mut self, enable: bool) {
        self.set_enabled(SUITE_MD5, enable);
    }

    /// Enable or disable SHA-1-MAC suites.
    pub fn enable_sha(&mut self, enable: bool) {
        self.set_enabled(SUITE_SHA, enable);
    }

    /// Enable or disable SHA-256-MAC suites.
    pub fn enable_sha256(&mut self, enable: bool) {
        self.set_enabled(SUITE_SHA256, enable);
    }

    fn set_enabled(&mut self, mask: u32, enable: bool) {
        if enable {
            self.enabled_flags |= mask;
        } else {
            self.enabled_flags &= !mask;
        }
    }

    /// True when a handshake flight is waiting to be fetched with
    /// [`Connection::get_output`].
    pub fn need_to_write(&self) -> bool {
        matches!(
            self.state,
            HandshakeState::SendClientHello | HandshakeState::SendClientKeyExchange
        )
    }

    /// True once the server's Finished has verified.
    pub fn is_ready_to_send_application_data(&self) -> bool {
        self.application_data_allowed
    }

    /// The server's certificate chain, raw DER, leaf first. Empty until
    /// the Certificate message arrives.
    pub fn server_certificates(&self) -> &[Vec<u8>] {
        &self.server_certificates
    }

    /// The RFC name of the negotiated cipher suite, once chosen.
    pub fn cipher_suite_name(&self) -> Option<&'static str> {
        self.suite.map(|suite| suite.name)
    }

    /// True if the ServerHello carried the `renegotiation_info`
    /// extension. Renegotiation itself is unsupported; this only reports
    /// what the server advertised.
    pub fn server_supports_renegotiation_info(&self) -> bool {
        self.server_supports_renegotiation_info
    }

    /// Marshal the next outbound handshake flight.
    pub fn get_output(&mut self) -> Result<Vec<u8>, Error> {
        if let Some(err) = &self.last_error {
            return Err(err.clone());
        }

        let out = match self.state {
            HandshakeState::SendClientHello => hs::emit_client_hello_flight(self),
            HandshakeState::SendClientKeyExchange => hs::emit_second_flight(self),
            _ => return Err(Error::UnneededGet),
        };

        match out {
            Ok(bytes) => Ok(bytes),
            Err(err) => {
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Drive record and handshake ingest.
    ///
    /// Decrypted application data is appended to `plaintext`. The return
    /// value is the number of `input` bytes consumed: always a whole
    /// number of records, so the caller may re-present the unconsumed
    /// suffix (plus more bytes) later and get identical behaviour.
    ///
    /// Alerts surface as errors, `CloseNotify` included, so the caller
    /// can tell clean shutdown from abnormal termination. Any error
    /// poisons the connection.
    pub fn process(&mut self, input: &[u8], plaintext: &mut Vec<u8>) -> Result<usize, Error> {
        if let Some(err) = &self.last_error {
            return Err(err.clone());
        }

        match self.process_inner(input, plaintext) {
            Ok(used) => Ok(used),
            Err(err) => {
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    fn process_inner(&mut self, input: &[u8], plaintext: &mut Vec<u8>) -> Result<usize, Error> {
        let mut consumed = 0;

        loop {
            // While we have a flight to send we'd be in the wrong state
            // to process further records; the caller must drain us first.
            if self.need_to_write() {
                return Ok(consumed);
            }

            let mut rd = Reader::init(&input[consumed..]);
            let header = match read_record_header(&mut rd, self.version)? {
                Some(header) => header,
                None => return Ok(consumed),
            };

            // The version is pinned by the first header seen, even when
            // the rest of the record is still in flight.
            if self.version.is_none() {
                trace!("record layer pinned {:?}", header.version);
                self.version = Some(header.version);
            }

            let payload = match rd.take(header.len) {
                Some(payload) => payload,
                None => return Ok(consumed),
            };

            // Some application data is already queued and the next record
            // is something else: hand the data back first.
            if !plaintext.is_empty() && header.typ != ContentType::ApplicationData {
                return Ok(consumed);
            }

            let msg = OpaqueMessage {
                typ: header.typ,
                version: header.version,
                payload: payload.to_vec(),
            };
            consumed += rd.used();

            let plain = self.record_layer.decrypt_incoming(msg)?;
            trace!("received {:?} record, {} bytes", plain.typ, plain.payload.len());

            match plain.typ {
                ContentType::Handshake => {
                    self.joiner.push(plain.payload);
                    while !self.need_to_write() {
                        match self.joiner.pop()? {
                            Some(msg) => hs::handle_handshake_message(self, msg)?,
                            None => break,
                        }
                    }
                }
                ContentType::ChangeCipherSpec => {
                    if !self.joiner.is_empty() {
                        return Err(Error::TruncatedHandshakeMessage);
                    }
                    hs::handle_change_cipher_spec(self, &plain.payload)?;
                }
                ContentType::Alert => {
                    if !self.joiner.is_empty() {
                        return Err(Error::TruncatedHandshakeMessage);
                    }
                    return Err(self.process_alert(&plain.payload));
                }
                ContentType::ApplicationData => {
                    if !self.joiner.is_empty() {
                        return Err(Error::TruncatedHandshakeMessage);
                    }
                    if !self.application_data_allowed {
                        return Err(Error::UnexpectedApplicationData);
                    }
                    plaintext.extend_from_slice(&plain.payload);
                }
                ContentType::Unknown(_) => return Err(Error::InternalError),
            }
        }
    }

    fn process_alert(&self, payload: &[u8]) -> Error {
        if payload.len() != 2 {
            return Error::IncorrectAlertLength;
        }

        let alert = match AlertMessagePayload::read_bytes(payload) {
            Some(alert) => alert,
            None => return Error::IncorrectAlertLength,
        };
        if let AlertLevel::Unknown(_) = alert.level {
            return Error::InvalidAlertLevel;
        }

        warn!(
            "received {:?} alert: {:?}",
            alert.level, alert.description
        );
        Error::from_alert(alert.description)
    }

    /// Wrap one record's worth of application data for transmission.
    ///
    /// Only valid once the handshake has completed; returns the complete
    /// record, header included.
    pub fn encrypt(&mut self, data: &[u8]) -> Result<Vec<u8>, Error> {
        if let Some(err) = &self.last_error {
            return Err(err.clone());
        }
        if !self.application_data_allowed {
            return Err(Error::NotReadyForApplicationData);
        }
        if data.len() > MAX_FRAGMENT_LEN {
            return Err(Error::RecordTooLong);
        }

        let version = self.version.ok_or(Error::InternalError)?;
        debug_assert!(self.record_layer.is_encrypting());
        let msg = self.record_layer.encrypt_outgoing(BorrowedPlainMessage {
            typ: ContentType::ApplicationData,
            version,
            payload: data,
        });

        match msg {
            Ok(record) => Ok(record.encode()),
            Err(err) => {
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.master_secret.zeroize();
    }
}
