use core::fmt;

use crate::msgs::codec::{self, Codec, Reader};

/// An arbitrary, unknown-content, u24-length-prefixed payload.
#[derive(Clone, Eq, PartialEq)]
pub(crate) struct Payload(pub(crate) Vec<u8>);

impl Codec for Payload {
    fn encode(&self, bytes: &mut Vec<u8>) {
        bytes.extend_from_slice(&self.0);
    }

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        Some(Self::read_slice(r.rest()))
    }
}

impl Payload {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub(crate) fn read_slice(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        hex(f, &self.0)
    }
}

/// An arbitrary, unknown-content, u8-length-prefixed payload.
#[derive(Clone, Eq, PartialEq)]
pub(crate) struct PayloadU8(pub(crate) Vec<u8>);

impl PayloadU8 {
    pub(crate) fn empty() -> Self {
        Self(Vec::new())
    }
}

impl Codec for PayloadU8 {
    fn encode(&self, bytes: &mut Vec<u8>) {
        debug_assert!(self.0.len() <= 0xff);
        (self.0.len() as u8).encode(bytes);
        bytes.extend_from_slice(&self.0);
    }

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let len = usize::from(u8::read(r)?);
        let body = r.take(len)?;
        Some(Self(body.to_vec()))
    }
}

impl fmt::Debug for PayloadU8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        hex(f, &self.0)
    }
}

/// An arbitrary, unknown-content, u16-length-prefixed payload.
#[derive(Clone, Eq, PartialEq)]
pub(crate) struct PayloadU16(pub(crate) Vec<u8>);

impl PayloadU16 {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Codec for PayloadU16 {
    fn encode(&self, bytes: &mut Vec<u8>) {
        debug_assert!(self.0.len() <= 0xffff);
        (self.0.len() as u16).encode(bytes);
        bytes.extend_from_slice(&self.0);
    }

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let len = usize::from(u16::read(r)?);
        let body = r.take(len)?;
        Some(Self(body.to_vec()))
    }
}

impl fmt::Debug for PayloadU16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        hex(f, &self.0)
    }
}

/// An arbitrary, unknown-content, u24-length-prefixed payload.
#[derive(Clone, Eq, PartialEq)]
pub(crate) struct PayloadU24(pub(crate) Vec<u8>);

impl Codec for PayloadU24 {
    fn encode(&self, bytes: &mut Vec<u8>) {
        debug_assert!(self.0.len() <= 0xff_ffff);
        codec::u24(self.0.len() as u32).encode(bytes);
        bytes.extend_from_slice(&self.0);
    }

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let len = usize::from(codec::u24::read(r)?);
        let body = r.take(len)?;
        Some(Self(body.to_vec()))
    }
}

impl fmt::Debug for PayloadU24 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        hex(f, &self.0)
    }
}

// Format an iterator of u8 into a hex string
pub(crate) fn hex<'a>(
    f: &mut fmt::Formatter<'_>,
    payload: impl IntoIterator<Item = &'a u8>,
) -> fmt::Result {
    for b in payload {
        write!(f, "{:02x}", b)?;
    }
    Ok(())
}
