use std::sync::Arc;

use aes::{Aes128, Aes256};

use crate::cipher::{
    CbcMessageDecrypter, CbcMessageEncrypter, MacHash, MacKey, MessageDecrypter, MessageEncrypter,
    StreamMessageDecrypter, StreamMessageEncrypter,
};
use crate::context::Context;
use crate::enums::{CipherSuite, ProtocolVersion};
use crate::error::Error;
use crate::prf::KeyBlock;

/// RSA key exchange.
pub const SUITE_RSA: u32 = 1 << 0;
/// RC4 stream cipher.
pub const SUITE_RC4: u32 = 1 << 1;
/// MD5 record MAC.
pub const SUITE_MD5: u32 = 1 << 2;
/// SHA-1 record MAC.
pub const SUITE_SHA: u32 = 1 << 3;
/// SHA-256 record MAC.
pub const SUITE_SHA256: u32 = 1 << 4;
/// AES with 128-bit keys.
pub const SUITE_AES128: u32 = 1 << 5;
/// AES with 256-bit keys.
pub const SUITE_AES256: u32 = 1 << 6;
/// Cipher-block chaining mode.
pub const SUITE_CBC: u32 = 1 << 7;

/// Bulk symmetric encryption scheme used by a cipher suite.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum BulkAlgorithm {
    /// RC4 with 128-bit keys.
    Rc4_128,

    /// AES with 128-bit keys in cipher-block-chaining mode.
    Aes128Cbc,

    /// AES with 256-bit keys in cipher-block-chaining mode.
    Aes256Cbc,
}

/// A cipher suite supported by this crate.
///
/// All possible instances of this type are provided by the library in
/// the [`ALL_CIPHER_SUITES`] array.
#[derive(Debug)]
pub struct SupportedCipherSuite {
    /// The TLS enumeration naming this cipher suite.
    pub suite: CipherSuite,

    /// The name as given in the RFCs.
    pub name: &'static str,

    /// A bitmask of `SUITE_` flags. A suite is offered, and acceptable
    /// from a ServerHello, only when its flags are a subset of the
    /// connection's enabled flags.
    pub flags: u32,

    /// How to do bulk encryption.
    pub bulk: BulkAlgorithm,

    pub(crate) mac: MacHash,

    /// The sizes of the pieces of key material needed.
    pub key_len: usize,
    /// MAC key length.
    pub mac_len: usize,
    /// IV length, where the key block carries one.
    pub iv_len: usize,
}

/// A list of all the cipher suites supported by this crate.
pub static ALL_CIPHER_SUITES: &[SupportedCipherSuite] = &[
    SupportedCipherSuite {
        suite: CipherSuite::TLS_RSA_WITH_RC4_128_SHA,
        name: "TLS_RSA_WITH_RC4_128_SHA",
        flags: SUITE_RSA | SUITE_RC4 | SUITE_SHA,
        bulk: BulkAlgorithm::Rc4_128,
        mac: MacHash::Sha1,
        key_len: 16,
        mac_len: 20,
        iv_len: 0,
    },
    SupportedCipherSuite {
        suite: CipherSuite::TLS_RSA_WITH_RC4_128_MD5,
        name: "TLS_RSA_WITH_RC4_128_MD5",
        flags: SUITE_RSA | SUITE_RC4 | SUITE_MD5,
        bulk: BulkAlgorithm::Rc4_128,
        mac: MacHash::Md5,
        key_len: 16,
        mac_len: 16,
        iv_len: 0,
    },
    SupportedCipherSuite {
        suite: CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
        name: "TLS_RSA_WITH_AES_128_CBC_SHA",
        flags: SUITE_RSA | SUITE_AES128 | SUITE_SHA | SUITE_CBC,
        bulk: BulkAlgorithm::Aes128Cbc,
        mac: MacHash::Sha1,
        key_len: 16,
        mac_len: 20,
        iv_len: 16,
    },
    SupportedCipherSuite {
        suite: CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA,
        name: "TLS_RSA_WITH_AES_256_CBC_SHA",
        flags: SUITE_RSA | SUITE_AES256 | SUITE_SHA | SUITE_CBC,
        bulk: BulkAlgorithm::Aes256Cbc,
        mac: MacHash::Sha1,
        key_len: 32,
        mac_len: 20,
        iv_len: 16,
    },
    SupportedCipherSuite {
        suite: CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA256,
        name: "TLS_RSA_WITH_AES_128_CBC_SHA256",
        flags: SUITE_RSA | SUITE_AES128 | SUITE_SHA256 | SUITE_CBC,
        bulk: BulkAlgorithm::Aes128Cbc,
        mac: MacHash::Sha256,
        key_len: 16,
        mac_len: 32,
        iv_len: 16,
    },
    SupportedCipherSuite {
        suite: CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA256,
        name: "TLS_RSA_WITH_AES_256_CBC_SHA256",
        flags: SUITE_RSA | SUITE_AES256 | SUITE_SHA256 | SUITE_CBC,
        bulk: BulkAlgorithm::Aes256Cbc,
        mac: MacHash::Sha256,
        key_len: 32,
        mac_len: 32,
        iv_len: 16,
    },
];

impl SupportedCipherSuite {
    /// True if every algorithm family this suite uses is enabled.
    pub(crate) fn usable_with_flags(&self, enabled: u32) -> bool {
        self.flags & enabled == self.flags
    }

    /// SHA-256 suites were introduced with TLS 1.2; older versions have
    /// no MAC construction defined for them.
    pub(crate) fn usable_with_version(&self, version: ProtocolVersion) -> bool {
        self.mac != MacHash::Sha256 || version == ProtocolVersion::TLSv1_2
    }

    /// The key-block IV allocation for this suite under `version`: from
    /// TLS 1.1 the CBC IV is explicit per record and no longer drawn
    /// from the key block.
    pub(crate) fn effective_iv_len(&self, version: ProtocolVersion) -> usize {
        match version.has_explicit_iv() {
            true => 0,
            false => self.iv_len,
        }
    }

    /// Build the read/write cipher state for this suite from a key block.
    ///
    /// Both halves are installed as pending specs and promoted by their
    /// direction's ChangeCipherSpec.
    pub(crate) fn new_cipher_pair(
        &self,
        version: ProtocolVersion,
        kb: &KeyBlock,
        ctx: &Arc<dyn Context>,
    ) -> Result<(Box<dyn MessageDecrypter>, Box<dyn MessageEncrypter>), Error> {
        let ssl3 = version == ProtocolVersion::SSLv3;
        let read_mac = MacKey::new(self.mac, ssl3, &kb.server_mac);
        let write_mac = MacKey::new(self.mac, ssl3, &kb.client_mac);

        Ok(match self.bulk {
            BulkAlgorithm::Rc4_128 => (
                Box::new(StreamMessageDecrypter::new(&kb.server_key, read_mac)?),
                Box::new(StreamMessageEncrypter::new(&kb.client_key, write_mac)?),
            ),
            BulkAlgorithm::Aes128Cbc => (
                Box::new(CbcMessageDecrypter::<Aes128>::new(
                    &kb.server_key,
                    &kb.server_iv,
                    read_mac,
                    version,
                )?),
                Box::new(CbcMessageEncrypter::<Aes128>::new(
                    &kb.client_key,
                    &kb.client_iv,
                    write_mac,
                    version.has_explicit_iv(),
                    Arc::clone(ctx),
                )?),
            ),
            BulkAlgorithm::Aes256Cbc => (
                Box::new(CbcMessageDecrypter::<Aes256>::new(
                    &kb.server_key,
                    &kb.server_iv,
                    read_mac,
                    version,
                )?),
                Box::new(CbcMessageEncrypter::<Aes256>::new(
                    &kb.client_key,
                    &kb.client_iv,
                    write_mac,
                    version.has_explicit_iv(),
                    Arc::clone(ctx),
                )?),
            ),
        })
    }
}

/// Look up a catalogued suite from its wire value.
pub(crate) fn find_suite(wire: CipherSuite) -> Option<&'static SupportedCipherSuite> {
    ALL_CIPHER_SUITES
        .iter()
        .find(|suite| suite.suite == wire)
}
