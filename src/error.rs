use std::error::Error as StdError;
use std::fmt;

use crate::enums::AlertDescription;

/// This crate reports protocol errors using this type.
///
/// The first error returned by any operation poisons the `Connection`:
/// every later call returns the same error.
#[derive(Debug, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum Error {
    /// A record carried a content type outside the TLS registry subset
    /// we accept.
    InvalidRecordType,

    /// The first record seen carried a protocol version we don't speak.
    InvalidRecordVersion,

    /// A record's version disagreed with the version pinned by the first
    /// record.
    BadRecordVersion,

    /// A handshake message carried a type outside the TLS registry.
    UnknownHandshakeMessageType,

    /// A handshake message advertised a length beyond our limit.
    HandshakeMessageTooLong,

    /// A non-handshake record arrived while a handshake message was
    /// still being reassembled.
    TruncatedHandshakeMessage,

    /// A handshake message had bytes left over after its payload.
    HandshakeTrailingData,

    /// A handshake message payload could not be parsed.
    InvalidHandshakeMessage,

    /// The server selected a protocol version we don't speak.
    UnsupportedServerVersion,

    /// The server selected a cipher suite we didn't offer.
    UnsupportedCipherSuite,

    /// The server selected a compression method other than null.
    UnsupportedCompressionMethod,

    /// No enabled cipher suite was available to offer.
    NoPossibleCipherSuites,

    /// A handshake message arrived that the current state does not admit.
    UnexpectedHandshakeMessage,

    /// An application-data record arrived before the handshake finished.
    UnexpectedApplicationData,

    /// Record decryption or MAC verification failed.
    BadMac,

    /// The server's Finished verify data did not match the transcript.
    BadVerify,

    /// The `Certificate` collaborator failed to encrypt the premaster
    /// secret.
    EncryptPkcs1Failed,

    /// The `Certificate` collaborator reported a zero ciphertext size.
    SizeEncryptPkcs1Failed,

    /// The `Context` collaborator could not parse the server certificate.
    CannotParseCertificate,

    /// The `Context` collaborator failed to produce the current time.
    EpochSecondsFailed,

    /// The `Context` collaborator failed to produce random bytes.
    RandomBytesFailed,

    /// An alert record's payload was not exactly two bytes.
    IncorrectAlertLength,

    /// An alert record carried a level other than warning or fatal.
    InvalidAlertLevel,

    /// We received an alert. `CloseNotify` is a clean shutdown; anything
    /// else means the peer is unhappy.
    AlertReceived(AlertDescription),

    /// We received an alert with a code we don't recognise.
    UnknownFatalAlert,

    /// The ServerHello carried an extension we never offered.
    UnknownExtension,

    /// `encrypt` was called before the handshake completed.
    NotReadyForApplicationData,

    /// `encrypt` was called with more than one record's worth of data.
    RecordTooLong,

    /// `get_output` was called with no flight pending.
    UnneededGet,

    /// A catch-all error for unlikely internal errors.
    InternalError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRecordType => write!(f, "received a record of invalid type"),
            Self::InvalidRecordVersion => {
                write!(f, "received a record with an unsupported version")
            }
            Self::BadRecordVersion => {
                write!(f, "received a record that disagrees with the pinned version")
            }
            Self::UnknownHandshakeMessageType => {
                write!(f, "received a handshake message of unknown type")
            }
            Self::HandshakeMessageTooLong => write!(f, "handshake message is over-length"),
            Self::TruncatedHandshakeMessage => {
                write!(f, "handshake message was truncated by another record")
            }
            Self::HandshakeTrailingData => {
                write!(f, "handshake message had trailing data")
            }
            Self::InvalidHandshakeMessage => write!(f, "cannot parse handshake message"),
            Self::UnsupportedServerVersion => {
                write!(f, "server chose an unsupported protocol version")
            }
            Self::UnsupportedCipherSuite => write!(f, "server chose an unoffered cipher suite"),
            Self::UnsupportedCompressionMethod => {
                write!(f, "server chose an unsupported compression method")
            }
            Self::NoPossibleCipherSuites => write!(f, "no cipher suites are enabled"),
            Self::UnexpectedHandshakeMessage => {
                write!(f, "received a handshake message out of sequence")
            }
            Self::UnexpectedApplicationData => {
                write!(f, "received application data during the handshake")
            }
            Self::BadMac => write!(f, "cannot decrypt peer's message"),
            Self::BadVerify => write!(f, "server's Finished verify data is wrong"),
            Self::EncryptPkcs1Failed => write!(f, "PKCS#1 encryption failed"),
            Self::SizeEncryptPkcs1Failed => write!(f, "PKCS#1 ciphertext size unavailable"),
            Self::CannotParseCertificate => write!(f, "cannot parse server certificate"),
            Self::EpochSecondsFailed => write!(f, "failed to get current time"),
            Self::RandomBytesFailed => write!(f, "failed to get random bytes"),
            Self::IncorrectAlertLength => write!(f, "alert record has wrong length"),
            Self::InvalidAlertLevel => write!(f, "alert record has invalid level"),
            Self::AlertReceived(desc) => write!(f, "received alert: {:?}", desc),
            Self::UnknownFatalAlert => write!(f, "received an unrecognised fatal alert"),
            Self::UnknownExtension => write!(f, "server sent an unsolicited extension"),
            Self::NotReadyForApplicationData => {
                write!(f, "not ready to send application data")
            }
            Self::RecordTooLong => write!(f, "application data exceeds one record"),
            Self::UnneededGet => write!(f, "no outbound flight is pending"),
            Self::InternalError => write!(f, "unexpected internal error"),
        }
    }
}

impl StdError for Error {}

impl Error {
    /// Map a wire alert description to the error surfaced to the caller.
    pub(crate) fn from_alert(desc: AlertDescription) -> Self {
        match desc {
            AlertDescription::Unknown(_) => Self::UnknownFatalAlert,
            known => Self::AlertReceived(known),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoke() {
        let all = vec![
            Error::InvalidRecordType,
            Error::BadRecordVersion,
            Error::TruncatedHandshakeMessage,
            Error::AlertReceived(AlertDescription::CloseNotify),
            Error::UnknownFatalAlert,
            Error::InternalError,
        ];

        for err in all {
            assert!(!format!("{}", err).is_empty());
            assert!(!format!("{:?}", err).is_empty());
        }
    }

    #[test]
    fn alert_mapping() {
        assert_eq!(
            Error::from_alert(AlertDescription::HandshakeFailure),
            Error::AlertReceived(AlertDescription::HandshakeFailure)
        );
        assert_eq!(
            Error::from_alert(AlertDescription::Unknown(0x7f)),
            Error::UnknownFatalAlert
        );
    }
}
