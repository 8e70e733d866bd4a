//! Test doubles for the caller-supplied collaborators.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::context::{Certificate, Context};

/// A deterministic `Context`: pseudo-random bytes from a counter, a fixed
/// clock, and a stub certificate whose "encryption" is the identity.
///
/// Deterministic randomness keeps handshake tests reproducible; nothing
/// here has any security value.
pub(crate) struct FixedContext {
    counter: AtomicU64,
    pub(crate) fail_time: bool,
    pub(crate) fail_rand: bool,
}

impl FixedContext {
    pub(crate) fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
            fail_time: false,
            fail_rand: false,
        }
    }
}

impl Context for FixedContext {
    fn random_bytes(&self, out: &mut [u8]) -> bool {
        if self.fail_rand {
            return false;
        }

        let n = self.counter.fetch_add(1, Ordering::Relaxed) as u8;
        for (i, b) in out.iter_mut().enumerate() {
            *b = n.wrapping_add(i as u8).wrapping_mul(0x9d) ^ 0x55;
        }
        true
    }

    fn epoch_seconds(&self) -> Option<u64> {
        match self.fail_time {
            true => None,
            false => Some(0x4d5a_1234),
        }
    }

    fn parse_certificate(&self, der: &[u8]) -> Option<Box<dyn Certificate>> {
        match der.is_empty() {
            true => None,
            false => Some(Box::new(StubCertificate)),
        }
    }
}

/// A `Certificate` whose PKCS#1 "encryption" copies the plaintext, so
/// tests playing the server can read the premaster straight off the wire.
pub(crate) struct StubCertificate;

impl Certificate for StubCertificate {
    fn size_encrypt_pkcs1(&self) -> usize {
        48
    }

    fn encrypt_pkcs1(&self, output: &mut [u8], input: &[u8]) -> bool {
        if output.len() != input.len() {
            return false;
        }
        output.copy_from_slice(input);
        true
    }
}
