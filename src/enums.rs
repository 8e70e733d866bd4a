#![allow(non_camel_case_types)]
#![allow(missing_docs)]

enum_builder! {
    /// The `ContentType` TLS protocol enum, limited to the record types
    /// this engine will process.
    #[repr(u8)]
    pub enum ContentType {
        ChangeCipherSpec => 0x14,
        Alert => 0x15,
        Handshake => 0x16,
        ApplicationData => 0x17,
    }
}

enum_builder! {
    /// The `ProtocolVersion` TLS protocol enum.
    #[repr(u16)]
    pub enum ProtocolVersion {
        SSLv3 => 0x0300,
        TLSv1_0 => 0x0301,
        TLSv1_1 => 0x0302,
        TLSv1_2 => 0x0303,
    }
}

impl ProtocolVersion {
    /// Whether this is one of the four versions the engine speaks.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// TLS 1.1 introduced a per-record explicit IV for CBC suites.
    pub(crate) fn has_explicit_iv(&self) -> bool {
        matches!(self, Self::TLSv1_1 | Self::TLSv1_2)
    }
}

enum_builder! {
    /// The `HandshakeType` TLS protocol enum.
    ///
    /// Types absent here are not valid on the wire at all; types present
    /// but unsupported are rejected by the state machine instead.
    #[repr(u8)]
    pub enum HandshakeType {
        HelloRequest => 0x00,
        ClientHello => 0x01,
        ServerHello => 0x02,
        Certificate => 0x0b,
        ServerKeyExchange => 0x0c,
        CertificateRequest => 0x0d,
        ServerHelloDone => 0x0e,
        CertificateVerify => 0x0f,
        ClientKeyExchange => 0x10,
        Finished => 0x14,
    }
}

enum_builder! {
    /// The `AlertLevel` TLS protocol enum.
    #[repr(u8)]
    pub enum AlertLevel {
        Warning => 0x01,
        Fatal => 0x02,
    }
}

enum_builder! {
    /// The `AlertDescription` TLS protocol enum. Values in this enum are
    /// taken from the various RFCs covering TLS, and are listed by IANA.
    /// The `Unknown` item is used when processing unrecognized ordinals.
    #[repr(u8)]
    pub enum AlertDescription {
        CloseNotify => 0x00,
        UnexpectedMessage => 0x0a,
        BadRecordMac => 0x14,
        DecryptionFailed => 0x15,
        RecordOverflow => 0x16,
        DecompressionFailure => 0x1e,
        HandshakeFailure => 0x28,
        NoCertificate => 0x29,
        BadCertificate => 0x2a,
        UnsupportedCertificate => 0x2b,
        CertificateRevoked => 0x2c,
        CertificateExpired => 0x2d,
        CertificateUnknown => 0x2e,
        IllegalParameter => 0x2f,
        UnknownCa => 0x30,
        AccessDenied => 0x31,
        DecodeError => 0x32,
        DecryptError => 0x33,
        ExportRestriction => 0x3c,
        ProtocolVersion => 0x46,
        InsufficientSecurity => 0x47,
        InternalError => 0x50,
        UserCanceled => 0x5a,
        NoRenegotiation => 0x64,
        UnsupportedExtension => 0x6e,
    }
}

enum_builder! {
    /// The `CipherSuite` TLS protocol enum: wire values for the suites in
    /// the catalog, plus the RFC 5746 signaling value.
    #[repr(u16)]
    pub enum CipherSuite {
        TLS_RSA_WITH_RC4_128_MD5 => 0x0004,
        TLS_RSA_WITH_RC4_128_SHA => 0x0005,
        TLS_RSA_WITH_AES_128_CBC_SHA => 0x002f,
        TLS_RSA_WITH_AES_256_CBC_SHA => 0x0035,
        TLS_RSA_WITH_AES_128_CBC_SHA256 => 0x003c,
        TLS_RSA_WITH_AES_256_CBC_SHA256 => 0x003d,
        TLS_EMPTY_RENEGOTIATION_INFO_SCSV => 0xff00,
    }
}

enum_builder! {
    /// The `Compression` TLS protocol enum. Only null compression is
    /// ever offered or accepted.
    #[repr(u8)]
    pub(crate) enum Compression {
        Null => 0x00,
    }
}

enum_builder! {
    /// The `ExtensionType` TLS protocol enum, limited to the extensions
    /// this engine emits or understands in a ServerHello.
    #[repr(u16)]
    pub(crate) enum ExtensionType {
        ServerName => 0x0000,
        RenegotiationInfo => 0xff01,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msgs::codec::Codec;

    #[test]
    fn version_ordinals() {
        assert_eq!(u16::from(ProtocolVersion::SSLv3), 0x0300);
        assert_eq!(u16::from(ProtocolVersion::TLSv1_2), 0x0303);
        assert!(ProtocolVersion::from(0x0301).is_supported());
        assert!(!ProtocolVersion::from(0x0304).is_supported());
    }

    #[test]
    fn explicit_iv_versions() {
        assert!(!ProtocolVersion::SSLv3.has_explicit_iv());
        assert!(!ProtocolVersion::TLSv1_0.has_explicit_iv());
        assert!(ProtocolVersion::TLSv1_1.has_explicit_iv());
        assert!(ProtocolVersion::TLSv1_2.has_explicit_iv());
    }

    #[test]
    fn unknown_values_survive_roundtrip() {
        let suite = CipherSuite::from(0x1234);
        assert_eq!(suite, CipherSuite::Unknown(0x1234));
        assert_eq!(suite.get_encoding(), vec![0x12, 0x34]);
    }
}
