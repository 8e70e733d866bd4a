use core::fmt::Debug;

/// Wrapper over a slice of bytes that allows reading chunks from
/// with the current position state held using a cursor.
///
/// A new reader for a sub section of the buffer can be created
/// using the `sub` function or a section of a certain length can
/// be obtained using the `take` function.
pub(crate) struct Reader<'a> {
    /// The underlying buffer storing the reader's content
    buffer: &'a [u8],
    /// Stores the current reading position for the buffer
    cursor: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn init(bytes: &'a [u8]) -> Self {
        Reader {
            buffer: bytes,
            cursor: 0,
        }
    }

    /// Attempts to create a new Reader on a sub section of this
    /// reader's bytes by taking a slice of the provided `length`;
    /// returns None if there are not enough bytes.
    pub(crate) fn sub(&mut self, length: usize) -> Option<Reader<'a>> {
        self.take(length).map(Reader::init)
    }

    /// Borrows a slice of all the remaining bytes that appear
    /// after the cursor position.
    ///
    /// Moves the cursor to the end of the buffer length.
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let rest = &self.buffer[self.cursor..];
        self.cursor = self.buffer.len();
        rest
    }

    /// Attempts to borrow a slice of bytes from the current
    /// cursor position of `length`; if there are not enough
    /// bytes remaining after the cursor then None is returned.
    pub(crate) fn take(&mut self, length: usize) -> Option<&'a [u8]> {
        if self.left() < length {
            return None;
        }
        let current = self.cursor;
        self.cursor += length;
        Some(&self.buffer[current..current + length])
    }

    /// Used to check whether the reader has any content left
    /// after the cursor (cursor has not reached end of buffer).
    pub(crate) fn any_left(&self) -> bool {
        self.cursor < self.buffer.len()
    }

    /// Returns the cursor position, which is also the number
    /// of bytes that have been read from the buffer.
    pub(crate) fn used(&self) -> usize {
        self.cursor
    }

    /// Returns the number of bytes that are still able to be read.
    pub(crate) fn left(&self) -> usize {
        self.buffer.len() - self.cursor
    }
}

/// Trait for implementing encoding and decoding functionality
/// on something.
pub(crate) trait Codec: Debug + Sized {
    /// Function for encoding itself by appending itself to
    /// the provided vec of bytes.
    fn encode(&self, bytes: &mut Vec<u8>);

    /// Function for decoding itself from the provided reader;
    /// returns Some if the decoding was successful or None if
    /// the reader ran out of bytes or the content was invalid.
    ///
    /// Running out of bytes is not an error at this layer: the
    /// caller decides whether it means "need more input" or
    /// "malformed".
    fn read(r: &mut Reader<'_>) -> Option<Self>;

    /// Convenience function for encoding the implementation
    /// into a vec and returning it.
    fn get_encoding(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.encode(&mut bytes);
        bytes
    }

    /// Function for wrapping a call to the read function in
    /// a Reader for the slice of bytes provided.
    fn read_bytes(bytes: &[u8]) -> Option<Self> {
        Self::read(&mut Reader::init(bytes))
    }
}

impl Codec for u8 {
    fn encode(&self, bytes: &mut Vec<u8>) {
        bytes.push(*self);
    }

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        match r.take(1) {
            Some(&[byte]) => Some(byte),
            _ => None,
        }
    }
}

pub(crate) fn put_u16(v: u16, out: &mut [u8]) {
    let out: &mut [u8; 2] = (&mut out[..2]).try_into().unwrap();
    *out = u16::to_be_bytes(v);
}

impl Codec for u16 {
    fn encode(&self, bytes: &mut Vec<u8>) {
        bytes.extend_from_slice(&u16::to_be_bytes(*self));
    }

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        match r.take(2) {
            Some(&[b1, b2]) => Some(Self::from_be_bytes([b1, b2])),
            _ => None,
        }
    }
}

// Make a distinct type for u24, even though it's a u32 underneath.
#[allow(non_camel_case_types)]
#[derive(Debug, Copy, Clone)]
pub(crate) struct u24(pub(crate) u32);

impl From<u24> for usize {
    #[inline]
    fn from(v: u24) -> Self {
        v.0 as Self
    }
}

impl Codec for u24 {
    fn encode(&self, bytes: &mut Vec<u8>) {
        let be_bytes = u32::to_be_bytes(self.0);
        bytes.extend_from_slice(&be_bytes[1..]);
    }

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        match r.take(3) {
            Some(&[a, b, c]) => Some(Self(u32::from_be_bytes([0, a, b, c]))),
            _ => None,
        }
    }
}

impl Codec for u32 {
    fn encode(&self, bytes: &mut Vec<u8>) {
        bytes.extend_from_slice(&Self::to_be_bytes(*self));
    }

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        match r.take(4) {
            Some(&[a, b, c, d]) => Some(Self::from_be_bytes([a, b, c, d])),
            _ => None,
        }
    }
}

pub(crate) fn put_u64(v: u64, bytes: &mut [u8]) {
    let bytes: &mut [u8; 8] = (&mut bytes[..8]).try_into().unwrap();
    *bytes = u64::to_be_bytes(v);
}

/// Implement `Codec` for lists of elements that implement `TlsListElement`.
///
/// `TlsListElement` provides the size of the length prefix for the list.
impl<T: Codec + TlsListElement + Debug> Codec for Vec<T> {
    fn encode(&self, bytes: &mut Vec<u8>) {
        let nest = LengthPrefixedBuffer::new(T::SIZE_LEN, bytes);

        for i in self {
            i.encode(nest.buf);
        }
    }

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let len = match T::SIZE_LEN {
            ListLength::U8 => usize::from(u8::read(r)?),
            ListLength::U16 => usize::from(u16::read(r)?),
            ListLength::U24 => usize::from(u24::read(r)?),
        };

        let mut sub = r.sub(len)?;
        let mut ret = Self::new();
        while sub.any_left() {
            ret.push(T::read(&mut sub)?);
        }

        Some(ret)
    }
}

/// A trait for types that can be encoded and decoded in a list.
///
/// This trait is used to implement `Codec` for `Vec<T>`. Lists in the TLS
/// wire format are prefixed with a length, the size of which depends on the
/// type of the list elements.
pub(crate) trait TlsListElement {
    const SIZE_LEN: ListLength;
}

/// The length of the length prefix for a list.
pub(crate) enum ListLength {
    U8,
    U16,
    U24,
}

/// Tracks encoding a length-delimited structure in a single pass.
pub(crate) struct LengthPrefixedBuffer<'a> {
    pub(crate) buf: &'a mut Vec<u8>,
    len_offset: usize,
    size_len: ListLength,
}

impl<'a> LengthPrefixedBuffer<'a> {
    /// Inserts a dummy length into `buf`, and remembers where it went.
    ///
    /// After this, the body of the length-delimited structure should be
    /// appended to `LengthPrefixedBuffer::buf`. The length header is
    /// corrected in `LengthPrefixedBuffer::drop`.
    pub(crate) fn new(size_len: ListLength, buf: &'a mut Vec<u8>) -> Self {
        let len_offset = buf.len();
        buf.extend(match size_len {
            ListLength::U8 => &[0xff][..],
            ListLength::U16 => &[0xff, 0xff],
            ListLength::U24 => &[0xff, 0xff, 0xff],
        });

        Self {
            buf,
            len_offset,
            size_len,
        }
    }
}

impl Drop for LengthPrefixedBuffer<'_> {
    /// Goes back and corrects the length previously inserted at the start
    /// of the structure.
    fn drop(&mut self) {
        match self.size_len {
            ListLength::U8 => {
                let len = self.buf.len() - self.len_offset - 1;
                debug_assert!(len <= 0xff);
                self.buf[self.len_offset] = len as u8;
            }
            ListLength::U16 => {
                let len = self.buf.len() - self.len_offset - 2;
                debug_assert!(len <= 0xffff);
                put_u16(len as u16, &mut self.buf[self.len_offset..]);
            }
            ListLength::U24 => {
                let len = self.buf.len() - self.len_offset - 3;
                debug_assert!(len <= 0xff_ffff);
                let len_bytes = u32::to_be_bytes(len as u32);
                self.buf[self.len_offset..self.len_offset + 3].copy_from_slice(&len_bytes[1..]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_bounds() {
        let mut rd = Reader::init(&[0x01, 0x02, 0x03]);
        assert_eq!(rd.take(2), Some(&[0x01, 0x02][..]));
        assert_eq!(rd.left(), 1);
        assert_eq!(rd.take(2), None);
        assert_eq!(rd.used(), 2);
        assert_eq!(rd.take(1), Some(&[0x03][..]));
        assert!(!rd.any_left());
    }

    #[test]
    fn u24_roundtrip() {
        let mut buf = Vec::new();
        u24(0x01_0203).encode(&mut buf);
        assert_eq!(buf, vec![0x01, 0x02, 0x03]);
        let got = u24::read_bytes(&buf).unwrap();
        assert_eq!(got.0, 0x01_0203);
    }

    #[test]
    fn fixed_width_reads_are_big_endian() {
        let bytes = [0x01, 0x02, 0x03, 0x04];
        assert_eq!(u16::read_bytes(&bytes), Some(0x0102));
        assert_eq!(u32::read_bytes(&bytes), Some(0x0102_0304));
    }

    #[test]
    fn nested_length_prefixes_are_backpatched() {
        let mut buf = Vec::new();
        {
            let outer = LengthPrefixedBuffer::new(ListLength::U16, &mut buf);
            outer.buf.push(0xaa);
            {
                let inner = LengthPrefixedBuffer::new(ListLength::U8, outer.buf);
                inner.buf.push(0xbb);
                inner.buf.push(0xcc);
            }
        }
        assert_eq!(buf, vec![0x00, 0x04, 0xaa, 0x02, 0xbb, 0xcc]);
    }

    #[test]
    fn interrupted_length_prefixed_buffer_leaves_maximum_length() {
        let mut buf = Vec::new();
        let nested = LengthPrefixedBuffer::new(ListLength::U16, &mut buf);
        nested.buf.push(0xaa);
        assert_eq!(nested.buf, &vec![0xff, 0xff, 0xaa]);
        drop(nested);
        assert_eq!(buf, vec![0x00, 0x01, 0xaa]);
    }
}
