use std::sync::Arc;

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use rc4::consts::U16;
use rc4::{Rc4, StreamCipher};
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::context::Context;
use crate::enums::{ContentType, ProtocolVersion};
use crate::error::Error;
use crate::msgs::codec::put_u64;
use crate::msgs::message::{BorrowedPlainMessage, OpaqueMessage, PlainMessage};

/// Objects with this trait can encrypt one TLS record.
///
/// Stateful: stream-cipher keystreams and CBC chaining persist between
/// records within a direction.
pub(crate) trait MessageEncrypter: Send + Sync {
    fn encrypt(&mut self, msg: BorrowedPlainMessage<'_>, seq: u64) -> Result<OpaqueMessage, Error>;
}

/// Objects with this trait can decrypt and verify one TLS record.
pub(crate) trait MessageDecrypter: Send + Sync {
    fn decrypt(&mut self, msg: OpaqueMessage, seq: u64) -> Result<PlainMessage, Error>;
}

impl dyn MessageEncrypter {
    pub(crate) fn invalid() -> Box<dyn MessageEncrypter> {
        Box::new(InvalidCipher)
    }
}

impl dyn MessageDecrypter {
    pub(crate) fn invalid() -> Box<dyn MessageDecrypter> {
        Box::new(InvalidCipher)
    }
}

/// A `MessageEncrypter`/`MessageDecrypter` for when no keying material
/// has been installed.
struct InvalidCipher;

impl MessageEncrypter for InvalidCipher {
    fn encrypt(&mut self, _: BorrowedPlainMessage<'_>, _: u64) -> Result<OpaqueMessage, Error> {
        Err(Error::InternalError)
    }
}

impl MessageDecrypter for InvalidCipher {
    fn decrypt(&mut self, _: OpaqueMessage, _: u64) -> Result<PlainMessage, Error> {
        Err(Error::InternalError)
    }
}

/// The digest underlying a suite's record MAC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MacHash {
    Md5,
    Sha1,
    Sha256,
}

impl MacHash {
    pub(crate) fn output_len(&self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha256 => 32,
        }
    }
}

pub(crate) const SSL3_PAD1: [u8; 48] = [0x36; 48];
pub(crate) const SSL3_PAD2: [u8; 48] = [0x5c; 48];

/// One direction's record MAC state.
///
/// TLS versions use HMAC over `seq || type || version || length || data`
/// (RFC 2246 section 6.2.3.1); SSL 3.0 uses its pad1/pad2 construction
/// and omits the version field.
pub(crate) struct MacKey {
    hash: MacHash,
    ssl3: bool,
    key: Vec<u8>,
}

impl MacKey {
    pub(crate) fn new(hash: MacHash, ssl3: bool, key: &[u8]) -> Self {
        Self {
            hash,
            ssl3,
            key: key.to_vec(),
        }
    }

    pub(crate) fn mac_len(&self) -> usize {
        self.hash.output_len()
    }

    fn compute(
        &self,
        seq: u64,
        typ: ContentType,
        version: ProtocolVersion,
        payload: &[u8],
    ) -> Vec<u8> {
        let mut seq_buf = [0u8; 8];
        put_u64(seq, &mut seq_buf);
        let typ_buf = typ.to_array();
        let version_buf = version.to_array();
        let len_buf = (payload.len() as u16).to_be_bytes();

        if self.ssl3 {
            // SSLv3 omits the record version from the MAC input.
            let parts: [&[u8]; 4] = [&seq_buf, &typ_buf, &len_buf, payload];
            match self.hash {
                MacHash::Md5 => ssl3_tag::<Md5>(&self.key, 48, &parts),
                MacHash::Sha1 => ssl3_tag::<Sha1>(&self.key, 40, &parts),
                // SHA-256 suites are rejected below TLS 1.2.
                MacHash::Sha256 => unreachable!(),
            }
        } else {
            let parts: [&[u8]; 5] = [&seq_buf, &typ_buf, &version_buf, &len_buf, payload];
            match self.hash {
                MacHash::Md5 => hmac_tag(
                    <Hmac<Md5> as Mac>::new_from_slice(&self.key).unwrap(),
                    &parts,
                ),
                MacHash::Sha1 => hmac_tag(
                    <Hmac<Sha1> as Mac>::new_from_slice(&self.key).unwrap(),
                    &parts,
                ),
                MacHash::Sha256 => hmac_tag(
                    <Hmac<Sha256> as Mac>::new_from_slice(&self.key).unwrap(),
                    &parts,
                ),
            }
        }
    }
}

impl Drop for MacKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

fn hmac_tag<M: Mac>(mut ctx: M, parts: &[&[u8]]) -> Vec<u8> {
    for part in parts {
        ctx.update(part);
    }
    ctx.finalize().into_bytes().to_vec()
}

fn ssl3_tag<D: Digest>(key: &[u8], pad_len: usize, parts: &[&[u8]]) -> Vec<u8> {
    let mut inner = D::new();
    inner.update(key);
    inner.update(&SSL3_PAD1[..pad_len]);
    for part in parts {
        inner.update(part);
    }
    let inner = inner.finalize();

    let mut outer = D::new();
    outer.update(key);
    outer.update(&SSL3_PAD2[..pad_len]);
    outer.update(inner);
    outer.finalize().to_vec()
}

/// A `MessageEncrypter` for the RC4 suites.
pub(crate) struct StreamMessageEncrypter {
    cipher: Rc4<U16>,
    mac: MacKey,
}

impl StreamMessageEncrypter {
    pub(crate) fn new(key: &[u8], mac: MacKey) -> Result<Self, Error> {
        Ok(Self {
            cipher: Rc4::new_from_slice(key).map_err(|_| Error::InternalError)?,
            mac,
        })
    }
}

impl MessageEncrypter for StreamMessageEncrypter {
    fn encrypt(&mut self, msg: BorrowedPlainMessage<'_>, seq: u64) -> Result<OpaqueMessage, Error> {
        let tag = self.mac.compute(seq, msg.typ, msg.version, msg.payload);

        let mut payload = Vec::with_capacity(msg.payload.len() + tag.len());
        payload.extend_from_slice(msg.payload);
        payload.extend_from_slice(&tag);
        self.cipher.apply_keystream(&mut payload);

        Ok(OpaqueMessage {
            typ: msg.typ,
            version: msg.version,
            payload,
        })
    }
}

/// A `MessageDecrypter` for the RC4 suites.
pub(crate) struct StreamMessageDecrypter {
    cipher: Rc4<U16>,
    mac: MacKey,
}

impl StreamMessageDecrypter {
    pub(crate) fn new(key: &[u8], mac: MacKey) -> Result<Self, Error> {
        Ok(Self {
            cipher: Rc4::new_from_slice(key).map_err(|_| Error::InternalError)?,
            mac,
        })
    }
}

impl MessageDecrypter for StreamMessageDecrypter {
    fn decrypt(&mut self, mut msg: OpaqueMessage, seq: u64) -> Result<PlainMessage, Error> {
        let mac_len = self.mac.mac_len();
        self.cipher.apply_keystream(&mut msg.payload);

        if msg.payload.len() < mac_len {
            return Err(Error::BadMac);
        }

        let plain_len = msg.payload.len() - mac_len;
        let expected = self
            .mac
            .compute(seq, msg.typ, msg.version, &msg.payload[..plain_len]);
        let received = &msg.payload[plain_len..];
        if !bool::from(expected.ct_eq(received)) {
            return Err(Error::BadMac);
        }

        msg.payload.truncate(plain_len);
        Ok(PlainMessage {
            typ: msg.typ,
            version: msg.version,
            payload: msg.payload,
        })
    }
}

const BLOCK_LEN: usize = 16;

fn xor_block(block: &mut [u8], mask: &[u8; BLOCK_LEN]) {
    for (b, m) in block.iter_mut().zip(mask.iter()) {
        *b ^= m;
    }
}

fn iv_or_zero(iv: &[u8]) -> [u8; BLOCK_LEN] {
    let mut out = [0u8; BLOCK_LEN];
    if !iv.is_empty() {
        out.copy_from_slice(iv);
    }
    out
}

/// A `MessageEncrypter` for the AES-CBC suites.
///
/// SSL3/TLS1.0 chain the IV across records, seeded from the key block.
/// TLS1.1/1.2 prepend one random block per record instead; the receiver
/// treats the first ciphertext block as the IV and discards its
/// decryption, so the same chaining loop serves both schemes.
pub(crate) struct CbcMessageEncrypter<C> {
    cipher: C,
    iv: [u8; BLOCK_LEN],
    mac: MacKey,
    explicit_iv: bool,
    ctx: Arc<dyn Context>,
}

impl<C: BlockEncrypt + KeyInit> CbcMessageEncrypter<C> {
    pub(crate) fn new(
        key: &[u8],
        iv: &[u8],
        mac: MacKey,
        explicit_iv: bool,
        ctx: Arc<dyn Context>,
    ) -> Result<Self, Error> {
        Ok(Self {
            cipher: C::new_from_slice(key).map_err(|_| Error::InternalError)?,
            iv: iv_or_zero(iv),
            mac,
            explicit_iv,
            ctx,
        })
    }
}

impl<C: BlockEncrypt + Send + Sync> MessageEncrypter for CbcMessageEncrypter<C> {
    fn encrypt(&mut self, msg: BorrowedPlainMessage<'_>, seq: u64) -> Result<OpaqueMessage, Error> {
        let tag = self.mac.compute(seq, msg.typ, msg.version, msg.payload);

        let mut buf = Vec::with_capacity(msg.payload.len() + tag.len() + 2 * BLOCK_LEN);
        if self.explicit_iv {
            let mut fresh = [0u8; BLOCK_LEN];
            if !self.ctx.random_bytes(&mut fresh) {
                return Err(Error::RandomBytesFailed);
            }
            buf.extend_from_slice(&fresh);
        }
        buf.extend_from_slice(msg.payload);
        buf.extend_from_slice(&tag);

        let pad_len = BLOCK_LEN - (buf.len() % BLOCK_LEN);
        buf.resize(buf.len() + pad_len, (pad_len - 1) as u8);

        for block in buf.chunks_exact_mut(BLOCK_LEN) {
            xor_block(block, &self.iv);
            self.cipher
                .encrypt_block(GenericArray::from_mut_slice(block));
            self.iv.copy_from_slice(block);
        }

        Ok(OpaqueMessage {
            typ: msg.typ,
            version: msg.version,
            payload: buf,
        })
    }
}

/// A `MessageDecrypter` for the AES-CBC suites.
pub(crate) struct CbcMessageDecrypter<C> {
    cipher: C,
    iv: [u8; BLOCK_LEN],
    mac: MacKey,
    explicit_iv: bool,
    /// TLS requires every padding byte to equal the padding length;
    /// SSL3 leaves padding contents undefined.
    check_padding: bool,
}

impl<C: BlockDecrypt + KeyInit> CbcMessageDecrypter<C> {
    pub(crate) fn new(
        key: &[u8],
        iv: &[u8],
        mac: MacKey,
        version: ProtocolVersion,
    ) -> Result<Self, Error> {
        Ok(Self {
            cipher: C::new_from_slice(key).map_err(|_| Error::InternalError)?,
            iv: iv_or_zero(iv),
            mac,
            explicit_iv: version.has_explicit_iv(),
            check_padding: version != ProtocolVersion::SSLv3,
        })
    }
}

impl<C: BlockDecrypt + Send + Sync> MessageDecrypter for CbcMessageDecrypter<C> {
    fn decrypt(&mut self, mut msg: OpaqueMessage, seq: u64) -> Result<PlainMessage, Error> {
        let mac_len = self.mac.mac_len();
        let prefix = if self.explicit_iv { BLOCK_LEN } else { 0 };
        let len = msg.payload.len();

        if len == 0 || len % BLOCK_LEN != 0 || len < prefix + mac_len + 1 {
            return Err(Error::BadMac);
        }

        let mut prev = self.iv;
        for block in msg.payload.chunks_exact_mut(BLOCK_LEN) {
            let saved: [u8; BLOCK_LEN] = (&*block).try_into().unwrap();
            self.cipher
                .decrypt_block(GenericArray::from_mut_slice(block));
            xor_block(block, &prev);
            prev = saved;
        }
        self.iv = prev;

        let pad = usize::from(msg.payload[len - 1]);
        let mut trailing = mac_len + pad + 1;
        let mut pad_len_ok = true;
        if prefix + trailing > len {
            pad_len_ok = false;
            trailing = len - prefix;
        }

        let plain_end = len - trailing;
        let expected = self
            .mac
            .compute(seq, msg.typ, msg.version, &msg.payload[prefix..plain_end]);
        let received = &msg.payload[plain_end..plain_end + mac_len];
        let mac_ok = bool::from(expected.ct_eq(received));

        // Check the padding bytes after the MAC, so a padding failure is
        // not distinguishable from a MAC failure by timing. See
        // http://www.openssl.org/~bodo/tls-cbc.txt
        let mut pad_failed = 0u8;
        if self.check_padding && pad_len_ok {
            for &b in &msg.payload[len - 1 - pad..len - 1] {
                pad_failed |= b ^ pad as u8;
            }
        }

        if !mac_ok || !pad_len_ok || pad_failed != 0 {
            return Err(Error::BadMac);
        }

        msg.payload.truncate(plain_end);
        if prefix > 0 {
            msg.payload.drain(..prefix);
        }

        Ok(PlainMessage {
            typ: msg.typ,
            version: msg.version,
            payload: msg.payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FixedContext;
    use aes::Aes128;

    fn mac_pair(hash: MacHash, ssl3: bool) -> (MacKey, MacKey) {
        let key = vec![0x0b; hash.output_len()];
        (MacKey::new(hash, ssl3, &key), MacKey::new(hash, ssl3, &key))
    }

    fn plain<'a>(version: ProtocolVersion, payload: &'a [u8]) -> BorrowedPlainMessage<'a> {
        BorrowedPlainMessage {
            typ: ContentType::ApplicationData,
            version,
            payload,
        }
    }

    #[test]
    fn stream_roundtrip() {
        let (enc_mac, dec_mac) = mac_pair(MacHash::Sha1, false);
        let key = [0x42u8; 16];
        let mut enc = StreamMessageEncrypter::new(&key, enc_mac).unwrap();
        let mut dec = StreamMessageDecrypter::new(&key, dec_mac).unwrap();

        for seq in 0..3u64 {
            let data = format!("record number {}", seq).into_bytes();
            let sealed = enc
                .encrypt(plain(ProtocolVersion::TLSv1_0, &data), seq)
                .unwrap();
            assert_ne!(sealed.payload, data);
            let opened = dec.decrypt(sealed, seq).unwrap();
            assert_eq!(opened.payload, data);
        }
    }

    #[test]
    fn stream_rejects_wrong_seq() {
        let (enc_mac, dec_mac) = mac_pair(MacHash::Md5, false);
        let key = [0x42u8; 16];
        let mut enc = StreamMessageEncrypter::new(&key, enc_mac).unwrap();
        let mut dec = StreamMessageDecrypter::new(&key, dec_mac).unwrap();

        let sealed = enc
            .encrypt(plain(ProtocolVersion::TLSv1_0, b"hello"), 0)
            .unwrap();
        assert_eq!(dec.decrypt(sealed, 1).unwrap_err(), Error::BadMac);
    }

    fn cbc_pair(
        version: ProtocolVersion,
    ) -> (
        CbcMessageEncrypter<Aes128>,
        CbcMessageDecrypter<Aes128>,
    ) {
        let key = [0x1fu8; 16];
        let iv = [0x2eu8; 16];
        let (enc_mac, dec_mac) = mac_pair(
            MacHash::Sha1,
            version == ProtocolVersion::SSLv3,
        );
        let iv_slice: &[u8] = if version.has_explicit_iv() { &[] } else { &iv };
        let enc = CbcMessageEncrypter::new(
            &key,
            iv_slice,
            enc_mac,
            version.has_explicit_iv(),
            Arc::new(FixedContext::new()),
        )
        .unwrap();
        let dec = CbcMessageDecrypter::new(&key, iv_slice, dec_mac, version).unwrap();
        (enc, dec)
    }

    #[test]
    fn cbc_roundtrip_all_versions() {
        for version in [
            ProtocolVersion::SSLv3,
            ProtocolVersion::TLSv1_0,
            ProtocolVersion::TLSv1_1,
            ProtocolVersion::TLSv1_2,
        ] {
            let (mut enc, mut dec) = cbc_pair(version);
            for seq in 0..3u64 {
                let data = vec![seq as u8; 40 + seq as usize];
                let sealed = enc.encrypt(plain(version, &data), seq).unwrap();
                assert_eq!(sealed.payload.len() % BLOCK_LEN, 0);
                let opened = dec.decrypt(sealed, seq).unwrap();
                assert_eq!(opened.payload, data);
            }
        }
    }

    #[test]
    fn cbc_rejects_tampered_ciphertext() {
        let (mut enc, mut dec) = cbc_pair(ProtocolVersion::TLSv1_2);
        let mut sealed = enc
            .encrypt(plain(ProtocolVersion::TLSv1_2, b"some bytes"), 0)
            .unwrap();
        let last = sealed.payload.len() - 1;
        sealed.payload[last] ^= 0x01;
        assert_eq!(dec.decrypt(sealed, 0).unwrap_err(), Error::BadMac);
    }

    #[test]
    fn cbc_rejects_non_block_multiple() {
        let (mut enc, mut dec) = cbc_pair(ProtocolVersion::TLSv1_2);
        let mut sealed = enc
            .encrypt(plain(ProtocolVersion::TLSv1_2, b"some bytes"), 0)
            .unwrap();
        sealed.payload.pop();
        assert_eq!(dec.decrypt(sealed, 0).unwrap_err(), Error::BadMac);
    }

    #[test]
    fn ssl3_and_tls_macs_differ() {
        let key = [0x0b; 20];
        let ssl3 = MacKey::new(MacHash::Sha1, true, &key);
        let tls = MacKey::new(MacHash::Sha1, false, &key);
        let a = ssl3.compute(1, ContentType::Handshake, ProtocolVersion::SSLv3, b"x");
        let b = tls.compute(1, ContentType::Handshake, ProtocolVersion::TLSv1_0, b"x");
        assert_eq!(a.len(), 20);
        assert_eq!(b.len(), 20);
        assert_ne!(a, b);
    }
}
