/// A parsed server certificate, as produced by [`Context::parse_certificate`].
///
/// The engine only ever asks a certificate to RSA-encrypt the premaster
/// secret; chain validation is the caller's business and happens outside
/// this crate.
pub trait Certificate: Send + Sync {
    /// The size of the ciphertext produced by [`Certificate::encrypt_pkcs1`],
    /// or zero if it cannot be determined.
    fn size_encrypt_pkcs1(&self) -> usize;

    /// RSA-encrypt `input` with PKCS#1 v1.5 padding into `output`, which is
    /// exactly [`Certificate::size_encrypt_pkcs1`] bytes long.
    ///
    /// Returns true on success.
    fn encrypt_pkcs1(&self, output: &mut [u8], input: &[u8]) -> bool;
}

/// Caller-supplied capabilities: randomness, wall-clock time and
/// certificate parsing.
///
/// The engine is deliberately free of any direct dependency on the
/// operating system; everything environmental arrives through this trait.
pub trait Context: Send + Sync {
    /// Fill `out` with cryptographically strong random data.
    ///
    /// Returns true on success.
    fn random_bytes(&self, out: &mut [u8]) -> bool;

    /// The number of seconds since the UNIX epoch, or `None` on failure.
    fn epoch_seconds(&self) -> Option<u64>;

    /// Parse a DER certificate taken raw from the wire, or `None` if it
    /// cannot be parsed.
    fn parse_certificate(&self, der: &[u8]) -> Option<Box<dyn Certificate>>;
}
