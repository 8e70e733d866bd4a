//! # tlsclient — the client half of a TLS 1.x / SSL 3.0 handshake
//!
//! This crate implements the client side of the TLS 1.0–1.2 and SSL 3.0
//! handshake and record layers for RSA-key-exchange cipher suites. It is
//! transport-agnostic: it never touches a socket. The caller feeds it the
//! bytes a server sent and carries away the bytes that must be sent back.
//!
//! ```text
//!        ciphertext                                plaintext
//!        ==========                                =========
//!      process()       +---------------------+
//!            +--------->      Connection     +---------> decrypted data
//!                       |                    |
//!            <---------+                     <---------+ encrypt()
//!      get_output()     +---------------------+
//! ```
//!
//! The caller supplies a [`Context`]: randomness, a clock, and a
//! certificate parser capable of PKCS#1 encryption. Certificate *chain
//! validation* is deliberately outside this crate; inspect
//! [`Connection::server_certificates`] and decide before sending data.
//!
//! A handshake looks like:
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use tlsclient::{Connection, Context};
//! # fn example(ctx: Arc<dyn Context>, socket_bytes: &[u8]) -> Result<(), tlsclient::Error> {
//! let mut conn = Connection::new(ctx);
//! conn.enable_default();
//! conn.set_host_name("example.com");
//!
//! let mut plaintext = Vec::new();
//! loop {
//!     while conn.need_to_write() {
//!         let flight = conn.get_output()?;
//!         // write `flight` to the socket
//!     }
//!     // read from the socket into `socket_bytes`...
//!     let used = conn.process(socket_bytes, &mut plaintext)?;
//!     // retain socket_bytes[used..] for the next call
//!     if conn.is_ready_to_send_application_data() {
//!         break;
//!     }
//! }
//! # Ok(()) }
//! ```
//!
//! Non-goals: session resumption, session tickets, renegotiation,
//! compression, client certificates and false start. Inbound requests
//! for these are rejected or ignored.

#![forbid(unsafe_code)]
#![warn(missing_docs, unreachable_pub, clippy::use_self)]

#[macro_use]
mod msgs;

mod cipher;
mod conn;
mod context;
mod enums;
mod error;
mod hash_hs;
mod hs;
mod prf;
mod record_layer;
mod suites;

#[cfg(test)]
mod testutil;

pub use crate::conn::Connection;
pub use crate::context::{Certificate, Context};
pub use crate::enums::{
    AlertDescription, AlertLevel, CipherSuite, ContentType, HandshakeType, ProtocolVersion,
};
pub use crate::error::Error;
pub use crate::suites::{
    BulkAlgorithm, SupportedCipherSuite, ALL_CIPHER_SUITES, SUITE_AES128, SUITE_AES256, SUITE_CBC,
    SUITE_MD5, SUITE_RC4, SUITE_RSA, SUITE_SHA, SUITE_SHA256,
};
