//! Black-box checks of the wire bytes produced through the public API.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tlsclient::{Certificate, Connection, Context, Error};

struct TestContext {
    counter: AtomicU64,
}

impl TestContext {
    fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }
}

impl Context for TestContext {
    fn random_bytes(&self, out: &mut [u8]) -> bool {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) as u8;
        for (i, b) in out.iter_mut().enumerate() {
            *b = n.wrapping_add(i as u8);
        }
        true
    }

    fn epoch_seconds(&self) -> Option<u64> {
        Some(1_271_987_716)
    }

    fn parse_certificate(&self, _der: &[u8]) -> Option<Box<dyn Certificate>> {
        None
    }
}

fn client() -> Connection {
    let mut conn = Connection::new(Arc::new(TestContext::new()));
    conn.enable_default();
    conn
}

/// Walk one length-prefixed field: returns (body, rest-after-field).
fn u16_field(bytes: &[u8]) -> (&[u8], &[u8]) {
    let len = usize::from(u16::from_be_bytes([bytes[0], bytes[1]]));
    (&bytes[2..2 + len], &bytes[2 + len..])
}

#[test]
fn client_hello_wire_shape() {
    let mut conn = client();
    conn.set_host_name("example.com");

    assert!(conn.need_to_write());
    let flight = conn.get_output().unwrap();
    assert!(!conn.need_to_write());

    // Record header: handshake, TLS 1.2, correct length.
    assert_eq!(flight[0], 0x16);
    assert_eq!(&flight[1..3], &[0x03, 0x03]);
    let record_len = usize::from(u16::from_be_bytes([flight[3], flight[4]]));
    assert_eq!(record_len, flight.len() - 5);

    // Handshake header: ClientHello, matching length.
    let msg = &flight[5..];
    assert_eq!(msg[0], 0x01);
    let hs_len = u32::from_be_bytes([0, msg[1], msg[2], msg[3]]) as usize;
    assert_eq!(hs_len, msg.len() - 4);

    // Offered version and the epoch seconds leading the client random.
    let body = &msg[4..];
    assert_eq!(&body[..2], &[0x03, 0x03]);
    assert_eq!(&body[2..6], &1_271_987_716u32.to_be_bytes());

    // Empty session id.
    assert_eq!(body[34], 0x00);

    // Cipher suites: all six catalog entries, and no SCSV for TLS.
    let (suites, rest) = u16_field(&body[35..]);
    let suites: Vec<u16> = suites
        .chunks(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    assert_eq!(suites, vec![0x0005, 0x0004, 0x002f, 0x0035, 0x003c, 0x003d]);

    // One compression method: null.
    assert_eq!(&rest[..2], &[0x01, 0x00]);

    // Extensions: renegotiation_info then server_name carrying the host.
    let (mut exts, trailing) = u16_field(&rest[2..]);
    assert!(trailing.is_empty());

    let mut seen = Vec::new();
    while !exts.is_empty() {
        let typ = u16::from_be_bytes([exts[0], exts[1]]);
        let (body, rest) = u16_field(&exts[2..]);
        seen.push((typ, body.to_vec()));
        exts = rest;
    }
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, 0xff01);
    assert_eq!(seen[0].1, vec![0x00]);
    assert_eq!(seen[1].0, 0x0000);
    let sni = &seen[1].1;
    // server_name_list > host_name entry > "example.com"
    assert_eq!(&sni[sni.len() - 11..], b"example.com");
    assert_eq!(sni[2], 0x00);
}

#[test]
fn sslv3_client_hello_has_scsv_and_no_extensions() {
    let mut conn = client();
    conn.set_sslv3(true);
    conn.set_host_name("example.com");

    let flight = conn.get_output().unwrap();

    // SSLv3 record and body versions.
    assert_eq!(&flight[1..3], &[0x03, 0x00]);
    let body = &flight[9..];
    assert_eq!(&body[..2], &[0x03, 0x00]);

    // The SCSV leads the suite list.
    let (suites, rest) = u16_field(&body[35..]);
    assert_eq!(&suites[..2], &[0xff, 0x00]);
    assert_eq!(suites.len(), 2 * 7);

    // Compression, then nothing: no extension block at all.
    assert_eq!(rest, &[0x01, 0x00]);
}

#[test]
fn disabling_families_prunes_the_offer() {
    let mut conn = client();
    conn.enable_rc4(false);
    conn.enable_sha256(false);

    let flight = conn.get_output().unwrap();
    let body = &flight[9..];
    let (suites, _) = u16_field(&body[35..]);
    let suites: Vec<u16> = suites
        .chunks(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    assert_eq!(suites, vec![0x002f, 0x0035]);
}

#[test]
fn encrypt_before_handshake_is_refused() {
    let mut conn = client();
    assert_eq!(
        conn.encrypt(b"hello").unwrap_err(),
        Error::NotReadyForApplicationData
    );
}

#[test]
fn suite_catalog_is_exposed() {
    assert_eq!(tlsclient::ALL_CIPHER_SUITES.len(), 6);
    for suite in tlsclient::ALL_CIPHER_SUITES {
        assert!(suite.flags & tlsclient::SUITE_RSA != 0);
        assert!(!suite.name.is_empty());
    }
}
