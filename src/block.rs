//! Typed readers and writers over a single named block.
//!
//! A block is a named, length-delimited byte range within a document. The two
//! directions are separate types: [InputBlock] is a forward-only cursor over a
//! borrowed (refcounted) byte range, [OutputBlock] is an append-only
//! accumulator. Mixing directions is therefore a compile error rather than a
//! runtime check.

use crate::{
    varint::{self, ZigZag},
    Error,
};
use bytes::{BufMut, Bytes, BytesMut};

/// A cursor-based reader over one block of a parsed message.
///
/// The reader holds a zero-copy slice of the document's backing buffer; the
/// cursor only ever advances and never passes the block's declared length.
/// Every read past the end fails with [Error::TruncatedInput].
pub struct InputBlock {
    name: String,
    data: Bytes,
    cursor: usize,
}

impl InputBlock {
    /// Wraps raw bytes as a readable block.
    ///
    /// Useful for decoding block-formatted data that arrives outside a
    /// document envelope; [crate::Document::parse] also reads its own header
    /// through one of these.
    pub fn new(name: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            data,
            cursor: 0,
        }
    }

    /// The block identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total length of the block in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Current cursor offset from the start of the block.
    pub fn reading_position(&self) -> usize {
        self.cursor
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    /// The entire block body, regardless of cursor position.
    pub fn as_bytes(&self) -> Bytes {
        self.data.clone()
    }

    /// Reads the next octet.
    pub fn read_byte(&mut self) -> Result<u8, Error> {
        if self.cursor >= self.data.len() {
            return Err(Error::TruncatedInput);
        }
        let octet = self.data[self.cursor];
        self.cursor += 1;
        Ok(octet)
    }

    /// Reads exactly `len` bytes as a zero-copy slice.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes, Error> {
        if self.remaining() < len {
            return Err(Error::TruncatedInput);
        }
        let out = self.data.slice(self.cursor..self.cursor + len);
        self.cursor += len;
        Ok(out)
    }

    /// Reads a boolean: any non-zero octet is true.
    pub fn read_bool(&mut self) -> Result<bool, Error> {
        Ok(self.read_byte()? != 0)
    }

    fn read_varint(&mut self, max_octets: usize) -> Result<u64, Error> {
        let mut rest = &self.data[self.cursor..];
        let before = rest.len();
        let val = varint::read(&mut rest, max_octets)?;
        self.cursor += before - rest.len();
        Ok(val)
    }

    /// Reads an unsigned 32-bit integer (varint, at most 5 octets).
    pub fn read_uint(&mut self) -> Result<u32, Error> {
        let val = self.read_varint(varint::MAX_UINT_OCTETS)?;
        u32::try_from(val).map_err(|_| Error::MalformedVarint)
    }

    /// Reads a signed 32-bit integer (ZigZag over [InputBlock::read_uint]).
    pub fn read_int(&mut self) -> Result<i32, Error> {
        Ok(i32::unzigzag(self.read_uint()?))
    }

    /// Reads an unsigned 64-bit integer (varint, at most 10 octets).
    pub fn read_ulong(&mut self) -> Result<u64, Error> {
        self.read_varint(varint::MAX_ULONG_OCTETS)
    }

    /// Reads a signed 64-bit integer (ZigZag over [InputBlock::read_ulong]).
    pub fn read_long(&mut self) -> Result<i64, Error> {
        Ok(i64::unzigzag(self.read_ulong()?))
    }

    /// Reads a big-endian IEEE-754 binary64 value.
    pub fn read_double(&mut self) -> Result<f64, Error> {
        if self.remaining() < 8 {
            return Err(Error::TruncatedInput);
        }
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&self.data[self.cursor..self.cursor + 8]);
        self.cursor += 8;
        Ok(f64::from_be_bytes(raw))
    }

    /// Reads a length-prefixed byte string.
    ///
    /// If `max_len` is given and the prefix exceeds it, fails with
    /// [Error::LengthExceeded] before consuming the payload.
    pub fn read_bytestr(&mut self, max_len: Option<usize>) -> Result<Bytes, Error> {
        let length = self.read_uint()? as usize;
        if let Some(max) = max_len {
            if length > max {
                return Err(Error::LengthExceeded(length, max));
            }
        }
        self.read_bytes(length)
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self, max_len: Option<usize>) -> Result<String, Error> {
        let raw = self.read_bytestr(max_len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| Error::BadCharEncoding)
    }
}

/// An append-only accumulator for one outgoing block.
///
/// Writes are bounded only by memory. Attach the finished block to a
/// [crate::Document] with [crate::Document::add].
pub struct OutputBlock {
    name: String,
    data: BytesMut,
}

impl OutputBlock {
    /// Creates an empty block with the given identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: BytesMut::new(),
        }
    }

    /// The block identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accumulated byte length.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// The accumulated body.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Appends a single octet.
    pub fn write_byte(&mut self, value: u8) {
        self.data.put_u8(value);
    }

    /// Appends raw bytes.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.data.put_slice(value);
    }

    /// Appends a boolean as one octet (1 or 0).
    pub fn write_bool(&mut self, value: bool) {
        self.data.put_u8(value as u8);
    }

    /// Appends an unsigned 32-bit integer as a varint.
    ///
    /// Fails with [Error::OutOfRange] if `value` exceeds the 32-bit unsigned
    /// domain.
    pub fn write_uint(&mut self, value: u64) -> Result<(), Error> {
        if value > u32::MAX as u64 {
            return Err(Error::OutOfRange(32));
        }
        varint::write(value, &mut self.data);
        Ok(())
    }

    /// Appends a signed 32-bit integer, ZigZag'ed then varint-encoded.
    pub fn write_int(&mut self, value: i32) {
        varint::write(value.zigzag() as u64, &mut self.data);
    }

    /// Appends an unsigned 64-bit integer as a varint.
    pub fn write_ulong(&mut self, value: u64) {
        varint::write(value, &mut self.data);
    }

    /// Appends a signed 64-bit integer, ZigZag'ed then varint-encoded.
    pub fn write_long(&mut self, value: i64) {
        varint::write(value.zigzag(), &mut self.data);
    }

    /// Appends a big-endian IEEE-754 binary64 value.
    pub fn write_double(&mut self, value: f64) {
        self.data.put_f64(value);
    }

    /// Appends a length-prefixed byte string.
    ///
    /// An absent value writes a zero length and nothing else, matching the
    /// wire shape of an empty byte string.
    pub fn write_bytestr(&mut self, value: Option<&[u8]>) -> Result<(), Error> {
        let Some(value) = value else {
            return self.write_uint(0);
        };
        self.write_uint(value.len() as u64)?;
        self.write_bytes(value);
        Ok(())
    }

    /// Appends a string as a length-prefixed UTF-8 byte string.
    pub fn write_string(&mut self, value: &str) -> Result<(), Error> {
        self.write_bytestr(Some(value.as_bytes()))
    }
}
