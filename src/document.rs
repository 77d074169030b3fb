//! Parsing, lookup, and serialization of PCOS documents.
//!
//! A document is the top-level message container: a fixed header, a directory
//! of `(name, length)` pairs, and the concatenated block bodies. Bodies trail
//! the full directory on the wire, so both parsing and serialization are
//! two-pass: all metadata is read (or written) before any body offset exists.

use crate::{
    block::{InputBlock, OutputBlock},
    varint, Error,
};
use bytes::{BufMut, Bytes, BytesMut};

/// Protocol identifier leading every message.
pub const PROTOCOL_MAGIC: [u8; 4] = *b"PCOS";

/// Flags byte written to every outgoing message.
pub const PROTOCOL_FLAGS: u8 = 0x00;

/// Smallest buffer that could hold a PCOS message.
pub const MIN_MESSAGE_LENGTH: usize = 8;

/// Safety limit on the message-id field, in bytes.
pub const MAX_MESSAGE_ID_LENGTH: usize = 128;

/// Safety limit on a block name, in bytes.
pub const MAX_BLOCK_ID_LENGTH: usize = 64;

/// Safety limit on the number of blocks in one message.
pub const MAX_BLOCK_COUNT: usize = 8;

/// Safety limit on a single block body, in bytes.
pub const MAX_BLOCK_LENGTH: usize = 10240;

/// A directory entry: either a byte range resolved against the parsed backing
/// buffer, or a block staged for serialization.
enum Slot {
    Parsed { start: usize, length: usize },
    Staged(OutputBlock),
}

impl Slot {
    fn len(&self) -> usize {
        match self {
            Slot::Parsed { length, .. } => *length,
            Slot::Staged(block) => block.size(),
        }
    }
}

/// The top-level PCOS message container.
///
/// Obtain one either by [Document::parse]-ing a received buffer or by building
/// an outgoing message with [Document::new] and [Document::add]. A parsed
/// document keeps the buffer it was parsed from; block lookups are zero-copy
/// views into it, and re-[Document::encode]-ing a canonically encoded message
/// reproduces its bytes.
pub struct Document {
    message_id: String,
    flags: u8,
    data: Bytes,
    blocks: Vec<(String, Slot)>,
}

// Header bounds surface as `ArgOutOfRange` rather than the block-level
// `LengthExceeded`.
fn capped(what: &'static str) -> impl Fn(Error) -> Error {
    move |err| match err {
        Error::LengthExceeded(found, max) => {
            Error::ArgOutOfRange(format!("{what} exceeds max of {max} ({found})"))
        }
        other => other,
    }
}

impl Document {
    /// Creates an empty outgoing document.
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            flags: PROTOCOL_FLAGS,
            data: Bytes::new(),
            blocks: Vec::new(),
        }
    }

    /// Parses a received buffer into a document.
    ///
    /// The buffer is validated before any offset is trusted: magic, header
    /// bounds, every directory entry, and finally that the declared bodies fit
    /// inside the buffer. On any failure no partial document is returned.
    pub fn parse(data: Bytes) -> Result<Self, Error> {
        if data.len() < MIN_MESSAGE_LENGTH {
            return Err(Error::MalformedMessage("payload too small for PCOS message"));
        }

        // The header is read through an input block spanning the whole
        // payload, so header fields and the directory share one cursor.
        let mut header = InputBlock::new("Hd", data.clone());

        let magic = header.read_bytes(PROTOCOL_MAGIC.len())?;
        if magic.as_ref() != &PROTOCOL_MAGIC[..] {
            return Err(Error::BadMagic);
        }
        let flags = header.read_byte()?;
        let message_id = header
            .read_string(Some(MAX_MESSAGE_ID_LENGTH))
            .map_err(capped("message id"))?;

        let block_count = header.read_uint()? as usize;
        if block_count > MAX_BLOCK_COUNT {
            return Err(Error::ArgOutOfRange(format!(
                "block count exceeds max of {MAX_BLOCK_COUNT} ({block_count})"
            )));
        }

        // Pass one: collect names and lengths. Offsets are unknowable until
        // the whole directory has been read.
        let mut staged = Vec::with_capacity(block_count);
        for _ in 0..block_count {
            let name = header
                .read_string(Some(MAX_BLOCK_ID_LENGTH))
                .map_err(capped("block name"))?;
            let length = header.read_uint()? as usize;
            if length > MAX_BLOCK_LENGTH {
                return Err(Error::ArgOutOfRange(format!(
                    "block size exceeds max of {MAX_BLOCK_LENGTH} ({length})"
                )));
            }
            staged.push((name, length));
        }

        // The data segment starts where the directory ends.
        let mut block_offset = header.reading_position();

        // Pass two: assign start offsets in directory order. A duplicate name
        // replaces the earlier entry, keeping its position.
        let mut doc = Self {
            message_id,
            flags,
            data,
            blocks: Vec::with_capacity(block_count),
        };
        for (name, length) in staged {
            doc.insert(name, Slot::Parsed { start: block_offset, length });
            block_offset += length;
        }

        if block_offset > doc.data.len() {
            return Err(Error::MalformedMessage("blocks cannot fit in payload"));
        }

        Ok(doc)
    }

    /// The message identifier.
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// The header flags byte.
    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Number of blocks in the directory.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Block names in directory order.
    pub fn block_names(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(|(name, _)| name.as_str())
    }

    /// Returns a reader over the named block.
    ///
    /// Fails with [Error::BlockNotFound] if the block is absent. Each call
    /// yields a fresh cursor over the same zero-copy range.
    pub fn block(&self, name: &str) -> Result<InputBlock, Error> {
        self.optional_block(name)
            .ok_or_else(|| Error::BlockNotFound(name.to_string()))
    }

    /// As [Document::block], but absence is not an error.
    ///
    /// # Panics
    ///
    /// Panics if the named block was staged with [Document::add]: staged
    /// blocks are write-only until serialized.
    pub fn optional_block(&self, name: &str) -> Option<InputBlock> {
        let (_, slot) = self.blocks.iter().find(|(existing, _)| existing == name)?;
        match slot {
            Slot::Parsed { start, length } => Some(InputBlock::new(
                name,
                self.data.slice(*start..*start + *length),
            )),
            Slot::Staged(_) => panic!("block '{name}' is in output mode and cannot be read"),
        }
    }

    /// Adds an outgoing block to the directory, replacing any block of the
    /// same name.
    pub fn add(&mut self, block: OutputBlock) {
        self.insert(block.name().to_string(), Slot::Staged(block));
    }

    fn insert(&mut self, name: String, slot: Slot) {
        match self.blocks.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => *existing = slot,
            None => self.blocks.push((name, slot)),
        }
    }

    /// Exact size of the serialized document in bytes.
    pub fn encode_size(&self) -> usize {
        let mut size = PROTOCOL_MAGIC.len() + 1;
        size += varint::size(self.message_id.len() as u64) + self.message_id.len();
        size += varint::size(self.blocks.len() as u64);
        for (name, slot) in &self.blocks {
            let body = slot.len();
            size += varint::size(name.len() as u64) + name.len();
            size += varint::size(body as u64) + body;
        }
        size
    }

    /// Serializes the document: header, directory, then the concatenated block
    /// bodies in directory order.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encode_size());
        buf.put_slice(&PROTOCOL_MAGIC);
        buf.put_u8(self.flags);
        varint::write(self.message_id.len() as u64, &mut buf);
        buf.put_slice(self.message_id.as_bytes());
        varint::write(self.blocks.len() as u64, &mut buf);
        for (name, slot) in &self.blocks {
            varint::write(name.len() as u64, &mut buf);
            buf.put_slice(name.as_bytes());
            varint::write(slot.len() as u64, &mut buf);
        }
        // Bodies trail the full directory, in the same order.
        for (_, slot) in &self.blocks {
            match slot {
                Slot::Parsed { start, length } => buf.put_slice(&self.data[*start..*start + *length]),
                Slot::Staged(block) => buf.put_slice(block.as_bytes()),
            }
        }
        debug_assert_eq!(buf.len(), self.encode_size());
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pong() -> Bytes {
        let mut tm = OutputBlock::new("Tm");
        tm.write_ulong(1335795040);
        let mut msg = Document::new("Po");
        msg.add(tm);
        msg.encode()
    }

    #[test]
    fn test_parse_header_fields() {
        let doc = Document::parse(pong()).unwrap();
        assert_eq!(doc.message_id(), "Po");
        assert_eq!(doc.flags(), PROTOCOL_FLAGS);
        assert_eq!(doc.block_count(), 1);
        assert_eq!(doc.block_names().collect::<Vec<_>>(), vec!["Tm"]);
    }

    #[test]
    fn test_payload_too_small() {
        let buf = Bytes::from_static(b"PCOS\x00\x00");
        assert!(matches!(
            Document::parse(buf),
            Err(Error::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_bad_magic() {
        let mut buf = pong().to_vec();
        buf[0] = b'Q';
        assert!(matches!(
            Document::parse(Bytes::from(buf)),
            Err(Error::BadMagic)
        ));
    }

    #[test]
    fn test_block_count_capped() {
        // magic, flags, id "Po", block count 9
        let buf = Bytes::from_static(b"PCOS\x00\x02Po\x09");
        assert!(matches!(
            Document::parse(buf),
            Err(Error::ArgOutOfRange(_))
        ));
    }

    #[test]
    fn test_block_length_capped() {
        // One directory entry "Tm" declaring 10241 bytes (varint d0 01).
        let buf = Bytes::from_static(b"PCOS\x00\x02Po\x01\x02Tm\xd0\x01");
        assert!(matches!(
            Document::parse(buf),
            Err(Error::ArgOutOfRange(_))
        ));
    }

    #[test]
    fn test_block_name_capped() {
        // Block name declares 65 bytes, one over the limit.
        let mut buf = b"PCOS\x00\x02Po\x01\x41".to_vec();
        buf.extend_from_slice(&[b'x'; 65]);
        buf.push(0x00); // block length
        assert!(matches!(
            Document::parse(Bytes::from(buf)),
            Err(Error::ArgOutOfRange(_))
        ));
    }

    #[test]
    fn test_message_id_capped() {
        let mut buf = b"PCOS\x00\x81\x01".to_vec(); // id length 129
        buf.extend_from_slice(&[b'x'; 129]);
        buf.push(0x00); // block count
        assert!(matches!(
            Document::parse(Bytes::from(buf)),
            Err(Error::ArgOutOfRange(_))
        ));
    }

    #[test]
    fn test_blocks_must_fit() {
        let mut buf = pong().to_vec();
        buf.pop();
        assert!(matches!(
            Document::parse(Bytes::from(buf)),
            Err(Error::MalformedMessage("blocks cannot fit in payload"))
        ));
    }

    #[test]
    fn test_missing_block_lookup() {
        let doc = Document::parse(pong()).unwrap();
        assert!(doc.optional_block("Xx").is_none());
        assert!(matches!(
            doc.block("Xx"),
            Err(Error::BlockNotFound(name)) if name == "Xx"
        ));
    }

    #[test]
    fn test_duplicate_wire_names_last_wins() {
        // Two directory entries both named "Aa", bodies 0x01 and 0x02.
        let buf = Bytes::from_static(b"PCOS\x00\x02Xx\x02\x02Aa\x01\x02Aa\x01\x01\x02");
        let doc = Document::parse(buf).unwrap();
        assert_eq!(doc.block_count(), 1);
        let mut aa = doc.block("Aa").unwrap();
        assert_eq!(aa.read_byte().unwrap(), 0x02);
    }

    #[test]
    fn test_add_overwrites_same_name() {
        let mut first = OutputBlock::new("Bo");
        first.write_byte(1);
        let mut second = OutputBlock::new("Bo");
        second.write_byte(2);

        let mut msg = Document::new("Tw");
        msg.add(first);
        msg.add(second);
        assert_eq!(msg.block_count(), 1);

        let doc = Document::parse(msg.encode()).unwrap();
        assert_eq!(doc.block("Bo").unwrap().read_byte().unwrap(), 2);
    }

    #[test]
    fn test_directory_order_is_insertion_order() {
        let mut msg = Document::new("Or");
        for name in ["Cc", "Aa", "Bb"] {
            let mut block = OutputBlock::new(name);
            block.write_byte(name.as_bytes()[0]);
            msg.add(block);
        }

        let doc = Document::parse(msg.encode()).unwrap();
        assert_eq!(
            doc.block_names().collect::<Vec<_>>(),
            vec!["Cc", "Aa", "Bb"]
        );
        for name in ["Cc", "Aa", "Bb"] {
            let mut block = doc.block(name).unwrap();
            assert_eq!(block.read_byte().unwrap(), name.as_bytes()[0]);
        }
    }

    #[test]
    fn test_independent_readers() {
        let doc = Document::parse(pong()).unwrap();
        let mut first = doc.block("Tm").unwrap();
        let mut second = doc.block("Tm").unwrap();
        assert_eq!(first.read_ulong().unwrap(), 1335795040);
        assert_eq!(second.read_ulong().unwrap(), 1335795040);
    }

    #[test]
    #[should_panic(expected = "output mode")]
    fn test_reading_staged_block_panics() {
        let mut msg = Document::new("Wr");
        msg.add(OutputBlock::new("Bo"));
        let _ = msg.optional_block("Bo");
    }

    #[test]
    fn test_empty_document_roundtrip() {
        let msg = Document::new("Em");
        let encoded = msg.encode();
        assert_eq!(encoded.len(), msg.encode_size());
        let doc = Document::parse(encoded).unwrap();
        assert_eq!(doc.message_id(), "Em");
        assert_eq!(doc.block_count(), 0);
    }
}
