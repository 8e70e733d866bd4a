use log::{debug, trace};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::conn::Connection;
use crate::enums::{CipherSuite, Compression, ContentType, HandshakeType, ProtocolVersion};
use crate::error::Error;
use crate::msgs::base::{Payload, PayloadU8};
use crate::msgs::ccs::ChangeCipherSpecPayload;
use crate::msgs::codec::{Codec, Reader};
use crate::msgs::handshake::{
    CertificatePayload, ClientExtension, ClientHelloPayload, HandshakeMessagePayload,
    HandshakePayload, InboundHandshake, Random, ServerExtension, ServerHelloPayload,
};
use crate::msgs::message::BorrowedPlainMessage;
use crate::prf;
use crate::suites::{find_suite, ALL_CIPHER_SUITES};

/// The handshake phase.
///
/// `Send` states produce an outbound flight via `Connection::get_output`;
/// `Expect` states admit exactly one inbound message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HandshakeState {
    /// Terminal steady state: the handshake is done and application data
    /// flows. The only admissible handshake message is HelloRequest,
    /// which we ignore.
    AwaitHelloRequest,
    SendClientHello,
    ExpectServerHello,
    ExpectCertificate,
    ExpectServerHelloDone,
    SendClientKeyExchange,
    ExpectChangeCipherSpec,
    ExpectFinished,
}

/// The admitted-message table: which inbound handshake messages each
/// state accepts.
fn permitted_in(state: HandshakeState) -> &'static [HandshakeType] {
    match state {
        HandshakeState::AwaitHelloRequest => &[HandshakeType::HelloRequest],
        HandshakeState::SendClientHello => &[],
        HandshakeState::ExpectServerHello => &[HandshakeType::ServerHello],
        HandshakeState::ExpectCertificate => &[HandshakeType::Certificate],
        HandshakeState::ExpectServerHelloDone => &[HandshakeType::ServerHelloDone],
        HandshakeState::SendClientKeyExchange => &[],
        HandshakeState::ExpectChangeCipherSpec => &[],
        HandshakeState::ExpectFinished => &[HandshakeType::Finished],
    }
}

pub(crate) fn offered_version(conn: &Connection) -> ProtocolVersion {
    match conn.offer_sslv3 {
        true => ProtocolVersion::SSLv3,
        false => ProtocolVersion::TLSv1_2,
    }
}

/// Marshal the ClientHello flight.
///
/// The encoded hello is retained in the transcript buffer: the transcript
/// hash function isn't known until the ServerHello picks a version.
pub(crate) fn emit_client_hello_flight(conn: &mut Connection) -> Result<Vec<u8>, Error> {
    let now = conn
        .ctx
        .epoch_seconds()
        .ok_or(Error::EpochSecondsFailed)?;
    conn.client_random[..4].copy_from_slice(&(now as u32).to_be_bytes());
    if !conn.ctx.random_bytes(&mut conn.client_random[4..]) {
        return Err(Error::RandomBytesFailed);
    }

    let mut cipher_suites = Vec::new();
    // For SSLv3 we advertise secure renegotiation with the SCSV rather
    // than an extension. See RFC 5746.
    if conn.offer_sslv3 {
        cipher_suites.push(CipherSuite::TLS_EMPTY_RENEGOTIATION_INFO_SCSV);
    }

    let mut offered = 0;
    for suite in ALL_CIPHER_SUITES {
        if suite.usable_with_flags(conn.enabled_flags) {
            cipher_suites.push(suite.suite);
            offered += 1;
        }
    }
    if offered == 0 {
        return Err(Error::NoPossibleCipherSuites);
    }

    let mut extensions = Vec::new();
    if !conn.offer_sslv3 {
        extensions.push(ClientExtension::RenegotiationInfo(PayloadU8::empty()));
        if let Some(host_name) = &conn.host_name {
            if !host_name.is_empty() {
                extensions.push(ClientExtension::make_sni(host_name));
            }
        }
    }

    let version = offered_version(conn);
    let hello = HandshakeMessagePayload {
        typ: HandshakeType::ClientHello,
        payload: HandshakePayload::ClientHello(ClientHelloPayload {
            client_version: version,
            random: Random(conn.client_random),
            session_id: PayloadU8::empty(),
            cipher_suites,
            compression_methods: vec![Compression::Null],
            extensions,
        }),
    };

    let encoded = hello.get_encoding();
    conn.transcript.add(&encoded);

    debug!("sending ClientHello, offering {:?}", version);
    let record = conn
        .record_layer
        .encrypt_outgoing(BorrowedPlainMessage {
            typ: ContentType::Handshake,
            version,
            payload: &encoded,
        })?
        .encode();

    conn.state = HandshakeState::ExpectServerHello;
    Ok(record)
}

/// Marshal the second flight: ClientKeyExchange, ChangeCipherSpec, then
/// Finished under the just-promoted write cipher.
pub(crate) fn emit_second_flight(conn: &mut Connection) -> Result<Vec<u8>, Error> {
    let suite = conn.suite.ok_or(Error::InternalError)?;
    let version = conn.version.ok_or(Error::InternalError)?;

    // The premaster's first two bytes repeat the version we originally
    // offered, which defends against rollback.
    let mut premaster = [0u8; 48];
    premaster[..2].copy_from_slice(&offered_version(conn).to_array());
    if !conn.ctx.random_bytes(&mut premaster[2..]) {
        return Err(Error::RandomBytesFailed);
    }

    let server_cert = conn.server_cert.as_ref().ok_or(Error::InternalError)?;
    let encrypted_len = server_cert.size_encrypt_pkcs1();
    if encrypted_len == 0 {
        return Err(Error::SizeEncryptPkcs1Failed);
    }

    let mut encrypted = vec![0u8; encrypted_len];
    if !server_cert.encrypt_pkcs1(&mut encrypted, &premaster) {
        return Err(Error::EncryptPkcs1Failed);
    }

    // SSLv3 doesn't prefix the encrypted premaster secret with length
    // bytes.
    let mut body = Vec::with_capacity(encrypted.len() + 2);
    if version != ProtocolVersion::SSLv3 {
        (encrypted_len as u16).encode(&mut body);
    }
    body.extend_from_slice(&encrypted);

    let cke = HandshakeMessagePayload {
        typ: HandshakeType::ClientKeyExchange,
        payload: HandshakePayload::ClientKeyExchange(Payload::new(body)),
    };
    let cke_encoded = cke.get_encoding();
    conn.transcript.add(&cke_encoded);

    let kb = prf::keys_from_premaster_secret(
        version,
        &premaster,
        &conn.client_random,
        &conn.server_random,
        suite.key_len,
        suite.mac_len,
        suite.effective_iv_len(version),
    );
    premaster.zeroize();
    conn.master_secret = kb.master_secret;

    let (decrypter, encrypter) = suite.new_cipher_pair(version, &kb, &conn.ctx)?;
    conn.record_layer
        .prepare_message_decrypter(decrypter);
    conn.record_layer
        .prepare_message_encrypter(encrypter);

    let mut out = conn
        .record_layer
        .encrypt_outgoing(BorrowedPlainMessage {
            typ: ContentType::Handshake,
            version,
            payload: &cke_encoded,
        })?
        .encode();

    out.extend(
        conn.record_layer
            .encrypt_outgoing(BorrowedPlainMessage {
                typ: ContentType::ChangeCipherSpec,
                version,
                payload: &ChangeCipherSpecPayload.get_encoding(),
            })?
            .encode(),
    );

    // The pivot: everything after the ChangeCipherSpec goes out under
    // the pending write spec, starting from sequence number zero.
    conn.record_layer.start_encrypting();

    let verify_data = conn
        .transcript
        .hashing()
        .ok_or(Error::InternalError)?
        .client_verify_data(&conn.master_secret);
    let finished = HandshakeMessagePayload {
        typ: HandshakeType::Finished,
        payload: HandshakePayload::Finished(Payload::new(verify_data)),
    };
    let finished_encoded = finished.get_encoding();
    conn.transcript.add(&finished_encoded);

    out.extend(
        conn.record_layer
            .encrypt_outgoing(BorrowedPlainMessage {
                typ: ContentType::Handshake,
                version,
                payload: &finished_encoded,
            })?
            .encode(),
    );

    debug!("sent ClientKeyExchange, ChangeCipherSpec and Finished");
    conn.state = HandshakeState::ExpectChangeCipherSpec;
    Ok(out)
}

/// Dispatch one reassembled inbound handshake message.
pub(crate) fn handle_handshake_message(
    conn: &mut Connection,
    msg: InboundHandshake,
) -> Result<(), Error> {
    if !permitted_in(conn.state).contains(&msg.typ) {
        return Err(Error::UnexpectedHandshakeMessage);
    }

    // ServerHello is hashed separately once the transcript hash exists;
    // the server's Finished is never hashed.
    if !matches!(msg.typ, HandshakeType::ServerHello | HandshakeType::Finished) {
        conn.transcript.add(&msg.encoded);
    }

    match msg.typ {
        HandshakeType::ServerHello => handle_server_hello(conn, &msg),
        HandshakeType::Certificate => handle_certificate(conn, &msg),
        HandshakeType::ServerHelloDone => handle_server_hello_done(conn, &msg),
        HandshakeType::Finished => handle_finished(conn, &msg),
        HandshakeType::HelloRequest => {
            // Renegotiation is not supported.
            debug!("ignoring HelloRequest");
            Ok(())
        }
        _ => Err(Error::InternalError),
    }
}

fn handle_server_hello(conn: &mut Connection, msg: &InboundHandshake) -> Result<(), Error> {
    let mut rd = Reader::init(msg.payload());
    let hello = ServerHelloPayload::read(&mut rd).ok_or(Error::InvalidHandshakeMessage)?;
    if rd.any_left() {
        return Err(Error::HandshakeTrailingData);
    }

    if !hello.server_version.is_supported() {
        return Err(Error::UnsupportedServerVersion);
    }
    // The record layer pinned the version from this record's header; the
    // body must agree.
    let version = hello.server_version;
    if conn.version != Some(version) {
        return Err(Error::InvalidHandshakeMessage);
    }

    conn.server_random = hello.random.0;
    // No session resumption: the session id is ignored.

    let suite = find_suite(hello.cipher_suite)
        .filter(|suite| suite.usable_with_flags(conn.enabled_flags))
        .filter(|suite| suite.usable_with_version(version))
        .ok_or(Error::UnsupportedCipherSuite)?;

    if hello.compression_method != Compression::Null {
        return Err(Error::UnsupportedCompressionMethod);
    }

    // We didn't know, until now, which transcript hash to use. The
    // ClientHello is still sitting in the buffer, so replay it followed
    // by this message.
    conn.transcript.start_hash(version)?;
    conn.transcript.add(&msg.encoded);

    for ext in &hello.extensions {
        match ext {
            ServerExtension::RenegotiationInfo(_) => {
                conn.server_supports_renegotiation_info = true;
            }
            ServerExtension::ServerNameAck => {}
            ServerExtension::Unknown(_) => return Err(Error::UnknownExtension),
        }
    }

    conn.suite = Some(suite);
    debug!("negotiated {:?} with {}", version, suite.name);
    conn.state = HandshakeState::ExpectCertificate;
    Ok(())
}

fn handle_certificate(conn: &mut Connection, msg: &InboundHandshake) -> Result<(), Error> {
    let mut rd = Reader::init(msg.payload());
    let certs = CertificatePayload::read(&mut rd).ok_or(Error::InvalidHandshakeMessage)?;
    if rd.any_left() {
        return Err(Error::HandshakeTrailingData);
    }
    if certs.is_empty() || certs.iter().any(|cert| cert.0.is_empty()) {
        return Err(Error::InvalidHandshakeMessage);
    }

    conn.server_certificates = certs.into_iter().map(|cert| cert.0).collect();
    conn.server_cert = Some(
        conn.ctx
            .parse_certificate(&conn.server_certificates[0])
            .ok_or(Error::CannotParseCertificate)?,
    );

    trace!(
        "received {} certificate(s)",
        conn.server_certificates.len()
    );
    conn.state = HandshakeState::ExpectServerHelloDone;
    Ok(())
}

fn handle_server_hello_done(conn: &mut Connection, msg: &InboundHandshake) -> Result<(), Error> {
    if !msg.payload().is_empty() {
        return Err(Error::HandshakeTrailingData);
    }

    conn.state = HandshakeState::SendClientKeyExchange;
    Ok(())
}

fn handle_finished(conn: &mut Connection, msg: &InboundHandshake) -> Result<(), Error> {
    let expected = conn
        .transcript
        .hashing()
        .ok_or(Error::InternalError)?
        .server_verify_data(&conn.master_secret);

    if !bool::from(msg.payload().ct_eq(&expected)) {
        return Err(Error::BadVerify);
    }

    conn.transcript.complete();
    conn.application_data_allowed = true;
    conn.state = HandshakeState::AwaitHelloRequest;
    debug!("handshake complete, application data allowed");
    Ok(())
}

/// Handle the ChangeCipherSpec pseudo-message: not a real handshake
/// message, but sequenced by the same table.
pub(crate) fn handle_change_cipher_spec(
    conn: &mut Connection,
    payload: &[u8],
) -> Result<(), Error> {
    if conn.state != HandshakeState::ExpectChangeCipherSpec {
        return Err(Error::UnexpectedHandshakeMessage);
    }

    ChangeCipherSpecPayload::read_bytes(payload).ok_or(Error::InvalidHandshakeMessage)?;

    if !conn.record_layer.is_decrypt_prepared() {
        return Err(Error::InternalError);
    }
    conn.record_layer.start_decrypting();
    trace!("promoted pending read cipher");

    conn.state = HandshakeState::ExpectFinished;
    Ok(())
}
