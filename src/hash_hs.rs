use md5::{Digest, Md5};
use sha1::Sha1;
use sha2::Sha256;

use crate::cipher::{SSL3_PAD1, SSL3_PAD2};
use crate::enums::ProtocolVersion;
use crate::prf;

const SSL3_CLIENT_SENDER: &[u8; 4] = b"CLNT";
const SSL3_SERVER_SENDER: &[u8; 4] = b"SRVR";

/// Early-stage buffering of handshake payloads.
///
/// The hash algorithm for the transcript depends on the negotiated
/// version, which isn't known until the ServerHello arrives. Until then
/// the raw ClientHello bytes are buffered here and replayed into the
/// real hash once the version is chosen.
#[derive(Default)]
pub(crate) struct HandshakeHashBuffer {
    buffer: Vec<u8>,
}

impl HandshakeHashBuffer {
    pub(crate) fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Buffer an encoded handshake message.
    pub(crate) fn add(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// We now know which transcript hash the verify data will use.
    pub(crate) fn start_hash(self, version: ProtocolVersion) -> HandshakeHash {
        let mut hash = HandshakeHash::new(version);
        hash.add(&self.buffer);
        hash
    }
}

/// This deals with keeping a running hash of the handshake payloads.
///
/// TLS 1.2 hashes with the PRF hash (SHA-256 for every catalogued
/// suite); earlier versions keep parallel MD5 and SHA-1 states.
pub(crate) struct HandshakeHash {
    version: ProtocolVersion,
    mode: Mode,
}

enum Mode {
    Md5Sha1 { md5: Md5, sha1: Sha1 },
    Sha256(Sha256),
}

impl HandshakeHash {
    pub(crate) fn new(version: ProtocolVersion) -> Self {
        let mode = match version {
            ProtocolVersion::TLSv1_2 => Mode::Sha256(Sha256::new()),
            _ => Mode::Md5Sha1 {
                md5: Md5::new(),
                sha1: Sha1::new(),
            },
        };

        Self { version, mode }
    }

    /// Hash an encoded handshake message, header included.
    pub(crate) fn add(&mut self, bytes: &[u8]) {
        match &mut self.mode {
            Mode::Md5Sha1 { md5, sha1 } => {
                md5.update(bytes);
                sha1.update(bytes);
            }
            Mode::Sha256(ctx) => ctx.update(bytes),
        }
    }

    /// The `Finished` verify data our side must send.
    pub(crate) fn client_verify_data(&self, master_secret: &[u8; 48]) -> Vec<u8> {
        self.verify_data(master_secret, b"client finished", SSL3_CLIENT_SENDER)
    }

    /// The `Finished` verify data we expect from the server.
    pub(crate) fn server_verify_data(&self, master_secret: &[u8; 48]) -> Vec<u8> {
        self.verify_data(master_secret, b"server finished", SSL3_SERVER_SENDER)
    }

    fn verify_data(&self, master_secret: &[u8; 48], label: &[u8], sender: &[u8; 4]) -> Vec<u8> {
        match self.version {
            ProtocolVersion::SSLv3 => self.ssl3_verify_data(master_secret, sender),
            _ => {
                let transcript = self.current_hash();
                let mut out = vec![0u8; 12];
                prf::prf(self.version, &mut out, master_secret, label, &transcript);
                out
            }
        }
    }

    /// The current transcript digest: MD5 || SHA1 before TLS 1.2, SHA256
    /// from then on.
    fn current_hash(&self) -> Vec<u8> {
        match &self.mode {
            Mode::Md5Sha1 { md5, sha1 } => {
                let mut out = Vec::with_capacity(36);
                out.extend_from_slice(&md5.clone().finalize());
                out.extend_from_slice(&sha1.clone().finalize());
                out
            }
            Mode::Sha256(ctx) => ctx.clone().finalize().to_vec(),
        }
    }

    /// The SSL 3.0 Finished construction: for each of MD5 and SHA-1,
    /// `H(master || pad2 || H(transcript || sender || master || pad1))`.
    fn ssl3_verify_data(&self, master_secret: &[u8; 48], sender: &[u8; 4]) -> Vec<u8> {
        let (md5, sha1) = match &self.mode {
            Mode::Md5Sha1 { md5, sha1 } => (md5.clone(), sha1.clone()),
            Mode::Sha256(_) => unreachable!(),
        };

        let mut out = Vec::with_capacity(36);

        let mut inner = md5.clone();
        inner.update(sender);
        inner.update(master_secret);
        inner.update(&SSL3_PAD1[..48]);
        let inner = inner.finalize();
        let mut outer = Md5::new();
        outer.update(master_secret);
        outer.update(&SSL3_PAD2[..48]);
        outer.update(inner);
        out.extend_from_slice(&outer.finalize());

        let mut inner = sha1.clone();
        inner.update(sender);
        inner.update(master_secret);
        inner.update(&SSL3_PAD1[..40]);
        let inner = inner.finalize();
        let mut outer = Sha1::new();
        outer.update(master_secret);
        outer.update(&SSL3_PAD2[..40]);
        outer.update(inner);
        out.extend_from_slice(&outer.finalize());

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffered_prefix_matches_direct_hashing() {
        let mut hhb = HandshakeHashBuffer::new();
        hhb.add(b"hello");
        let mut via_buffer = hhb.start_hash(ProtocolVersion::TLSv1_2);
        via_buffer.add(b"world");

        let mut direct = HandshakeHash::new(ProtocolVersion::TLSv1_2);
        direct.add(b"helloworld");

        assert_eq!(via_buffer.current_hash(), direct.current_hash());
    }

    #[test]
    fn tls12_transcript_is_sha256() {
        let mut hh = HandshakeHash::new(ProtocolVersion::TLSv1_2);
        hh.add(b"hello");
        hh.add(b"world");
        let h = hh.current_hash();
        assert_eq!(h.len(), 32);
        // SHA256("helloworld")
        assert_eq!(h[0], 0x93);
        assert_eq!(h[1], 0x6a);
        assert_eq!(h[2], 0x18);
        assert_eq!(h[3], 0x5c);
    }

    #[test]
    fn pre_tls12_transcript_is_md5_sha1() {
        let mut hh = HandshakeHash::new(ProtocolVersion::TLSv1_0);
        hh.add(b"abc");
        let h = hh.current_hash();
        assert_eq!(h.len(), 36);
        // MD5("abc") then SHA1("abc")
        assert_eq!(&h[..4], &[0x90, 0x01, 0x50, 0x98]);
        assert_eq!(&h[16..20], &[0xa9, 0x99, 0x3e, 0x36]);
    }

    #[test]
    fn verify_data_lengths() {
        let master = [0x0bu8; 48];

        let hh = HandshakeHash::new(ProtocolVersion::TLSv1_2);
        assert_eq!(hh.client_verify_data(&master).len(), 12);

        let hh = HandshakeHash::new(ProtocolVersion::SSLv3);
        assert_eq!(hh.client_verify_data(&master).len(), 36);
        assert_ne!(hh.client_verify_data(&master), hh.server_verify_data(&master));
    }
}
