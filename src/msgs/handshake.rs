use core::fmt;

use crate::enums::{CipherSuite, Compression, ExtensionType, HandshakeType, ProtocolVersion};
use crate::msgs::base::{hex, Payload, PayloadU16, PayloadU24, PayloadU8};
use crate::msgs::codec::{Codec, LengthPrefixedBuffer, ListLength, Reader, TlsListElement};

#[derive(Clone, Copy, Eq, PartialEq)]
pub(crate) struct Random(pub(crate) [u8; 32]);

impl Codec for Random {
    fn encode(&self, bytes: &mut Vec<u8>) {
        bytes.extend_from_slice(&self.0);
    }

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let bytes = r.take(32)?;
        let mut opaque = [0u8; 32];
        opaque.copy_from_slice(bytes);
        Some(Self(opaque))
    }
}

impl fmt::Debug for Random {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        hex(f, &self.0)
    }
}

impl TlsListElement for CipherSuite {
    const SIZE_LEN: ListLength = ListLength::U16;
}

impl TlsListElement for Compression {
    const SIZE_LEN: ListLength = ListLength::U8;
}

/// The name the client asks for via the `server_name` extension.
///
/// Only the `host_name` name type is produced or understood.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct ServerNamePayload(pub(crate) PayloadU16);

const SNI_NAME_TYPE_HOST_NAME: u8 = 0;

impl Codec for ServerNamePayload {
    fn encode(&self, bytes: &mut Vec<u8>) {
        let list = LengthPrefixedBuffer::new(ListLength::U16, bytes);
        SNI_NAME_TYPE_HOST_NAME.encode(list.buf);
        self.0.encode(list.buf);
    }

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let len = usize::from(u16::read(r)?);
        let mut sub = r.sub(len)?;
        let typ = u8::read(&mut sub)?;
        if typ != SNI_NAME_TYPE_HOST_NAME {
            return None;
        }
        let name = PayloadU16::read(&mut sub)?;
        if sub.any_left() {
            return None;
        }
        Some(Self(name))
    }
}

/// An extension offered in our ClientHello.
#[derive(Clone, Debug)]
pub(crate) enum ClientExtension {
    RenegotiationInfo(PayloadU8),
    ServerName(ServerNamePayload),
}

impl ClientExtension {
    pub(crate) fn ext_type(&self) -> ExtensionType {
        match self {
            Self::RenegotiationInfo(_) => ExtensionType::RenegotiationInfo,
            Self::ServerName(_) => ExtensionType::ServerName,
        }
    }

    pub(crate) fn make_sni(host_name: &str) -> Self {
        Self::ServerName(ServerNamePayload(PayloadU16::new(
            host_name.as_bytes().to_vec(),
        )))
    }
}

impl Codec for ClientExtension {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.ext_type().encode(bytes);
        let nested = LengthPrefixedBuffer::new(ListLength::U16, bytes);
        match self {
            Self::RenegotiationInfo(r) => r.encode(nested.buf),
            Self::ServerName(r) => r.encode(nested.buf),
        }
    }

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let typ = ExtensionType::read(r)?;
        let len = usize::from(u16::read(r)?);
        let mut sub = r.sub(len)?;

        let ext = match typ {
            ExtensionType::RenegotiationInfo => {
                Self::RenegotiationInfo(PayloadU8::read(&mut sub)?)
            }
            ExtensionType::ServerName => Self::ServerName(ServerNamePayload::read(&mut sub)?),
            ExtensionType::Unknown(_) => return None,
        };

        match sub.any_left() {
            false => Some(ext),
            true => None,
        }
    }
}

impl TlsListElement for ClientExtension {
    const SIZE_LEN: ListLength = ListLength::U16;
}

/// An extension echoed in the ServerHello.
///
/// Unknown extension types are preserved so the handshake layer can
/// reject them: we never offer anything the server could legitimately
/// answer with beyond this set.
#[derive(Clone, Debug)]
pub(crate) enum ServerExtension {
    RenegotiationInfo(PayloadU8),
    ServerNameAck,
    Unknown(ExtensionType),
}

impl Codec for ServerExtension {
    fn encode(&self, bytes: &mut Vec<u8>) {
        match self {
            Self::RenegotiationInfo(r) => {
                ExtensionType::RenegotiationInfo.encode(bytes);
                let nested = LengthPrefixedBuffer::new(ListLength::U16, bytes);
                r.encode(nested.buf);
            }
            Self::ServerNameAck => {
                ExtensionType::ServerName.encode(bytes);
                0u16.encode(bytes);
            }
            Self::Unknown(_) => {}
        }
    }

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let typ = ExtensionType::read(r)?;
        let len = usize::from(u16::read(r)?);
        let mut sub = r.sub(len)?;

        Some(match typ {
            ExtensionType::RenegotiationInfo => {
                let info = PayloadU8::read(&mut sub)?;
                if sub.any_left() {
                    return None;
                }
                Self::RenegotiationInfo(info)
            }
            // The server is free to echo an empty extension back to us.
            ExtensionType::ServerName => Self::ServerNameAck,
            unknown => Self::Unknown(unknown),
        })
    }
}

impl TlsListElement for ServerExtension {
    const SIZE_LEN: ListLength = ListLength::U16;
}

#[derive(Debug)]
pub(crate) struct ClientHelloPayload {
    pub(crate) client_version: ProtocolVersion,
    pub(crate) random: Random,
    pub(crate) session_id: PayloadU8,
    pub(crate) cipher_suites: Vec<CipherSuite>,
    pub(crate) compression_methods: Vec<Compression>,
    pub(crate) extensions: Vec<ClientExtension>,
}

impl Codec for ClientHelloPayload {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.client_version.encode(bytes);
        self.random.encode(bytes);
        self.session_id.encode(bytes);
        self.cipher_suites.encode(bytes);
        self.compression_methods.encode(bytes);

        // SSLv3 ClientHellos carry no extension block at all.
        if !self.extensions.is_empty() {
            self.extensions.encode(bytes);
        }
    }

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let mut ret = Self {
            client_version: ProtocolVersion::read(r)?,
            random: Random::read(r)?,
            session_id: PayloadU8::read(r)?,
            cipher_suites: Vec::read(r)?,
            compression_methods: Vec::read(r)?,
            extensions: Vec::new(),
        };

        if r.any_left() {
            ret.extensions = Vec::read(r)?;
        }

        Some(ret)
    }
}

#[derive(Debug)]
pub(crate) struct ServerHelloPayload {
    pub(crate) server_version: ProtocolVersion,
    pub(crate) random: Random,
    pub(crate) session_id: PayloadU8,
    pub(crate) cipher_suite: CipherSuite,
    pub(crate) compression_method: Compression,
    pub(crate) extensions: Vec<ServerExtension>,
}

impl Codec for ServerHelloPayload {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.server_version.encode(bytes);
        self.random.encode(bytes);
        self.session_id.encode(bytes);
        self.cipher_suite.encode(bytes);
        self.compression_method.encode(bytes);

        if !self.extensions.is_empty() {
            self.extensions.encode(bytes);
        }
    }

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let mut ret = Self {
            server_version: ProtocolVersion::read(r)?,
            random: Random::read(r)?,
            session_id: PayloadU8::read(r)?,
            cipher_suite: CipherSuite::read(r)?,
            compression_method: Compression::read(r)?,
            extensions: Vec::new(),
        };

        if r.any_left() {
            ret.extensions = Vec::read(r)?;
        }

        Some(ret)
    }
}

/// The certificate chain: a u24-prefixed list of u24-prefixed DER blobs.
pub(crate) type CertificatePayload = Vec<PayloadU24>;

impl TlsListElement for PayloadU24 {
    const SIZE_LEN: ListLength = ListLength::U24;
}

/// The handshake messages this side ever marshals. Inbound messages are
/// parsed straight from their payload bytes by the state machine's
/// handlers, which keeps the distinct error kinds for trailing data and
/// malformed bodies.
#[derive(Debug)]
pub(crate) enum HandshakePayload {
    ClientHello(ClientHelloPayload),
    ClientKeyExchange(Payload),
    Finished(Payload),
}

impl HandshakePayload {
    fn encode(&self, bytes: &mut Vec<u8>) {
        match self {
            Self::ClientHello(x) => x.encode(bytes),
            Self::ClientKeyExchange(x) => x.encode(bytes),
            Self::Finished(x) => x.encode(bytes),
        }
    }
}

/// A handshake message: one type byte, a u24 length, then the payload.
#[derive(Debug)]
pub(crate) struct HandshakeMessagePayload {
    pub(crate) typ: HandshakeType,
    pub(crate) payload: HandshakePayload,
}

impl HandshakeMessagePayload {
    pub(crate) fn encode(&self, bytes: &mut Vec<u8>) {
        self.typ.encode(bytes);
        let nested = LengthPrefixedBuffer::new(ListLength::U24, bytes);
        self.payload.encode(nested.buf);
    }

    pub(crate) fn get_encoding(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.encode(&mut bytes);
        bytes
    }
}

/// Handshake messages of this size or larger are rejected outright.
///
/// TLS allows up to 16MB; nothing in a plain RSA handshake comes close,
/// so we cap reassembly buffers well below that.
pub(crate) const MAX_HANDSHAKE_SIZE: usize = 0x1_0000;

/// Is this a handshake type we are willing to parse at all?
///
/// Types listed in the registry but absent here were never valid in the
/// protocol versions we speak.
pub(crate) fn is_valid_handshake_type(typ: HandshakeType) -> bool {
    !matches!(typ, HandshakeType::Unknown(_))
}

/// A reassembled inbound handshake message, not yet parsed.
#[derive(Debug)]
pub(crate) struct InboundHandshake {
    pub(crate) typ: HandshakeType,
    /// The full encoding: four header bytes then the payload.
    pub(crate) encoded: Vec<u8>,
}

impl InboundHandshake {
    pub(crate) fn payload(&self) -> &[u8] {
        &self.encoded[HANDSHAKE_HEADER_SIZE..]
    }
}

pub(crate) const HANDSHAKE_HEADER_SIZE: usize = 1 + 3;
