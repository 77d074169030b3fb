//! Serialize and parse PCOS wire messages.
//!
//! # Overview
//!
//! PCOS is a compact, self-describing binary message format: a [Document]
//! holds zero or more named, length-delimited blocks, and each block carries
//! primitive values (integers, longs, doubles, booleans, strings, raw bytes)
//! encoded with a variable-length integer scheme and ZigZag signed mapping.
//!
//! The format is the wire contract between two untrusted endpoints, so every
//! decode path validates structure before trusting any offset or length:
//! magic, header bounds, the block directory, and finally that all declared
//! bodies fit inside the received buffer. Malformed input fails with a typed
//! [Error]; no partial document is ever returned.
//!
//! # Wire Format
//!
//! ```text
//! magic            4 bytes, ASCII "PCOS"
//! flags            1 byte
//! message_id_len   varint
//! message_id       UTF-8 bytes
//! block_count      varint
//! block_count x:   name_len varint, name bytes, body_len varint
//! block_count x:   body bytes (data segment, directory order)
//! ```
//!
//! Varints carry 7 data bits per octet with a continuation bit, most
//! significant group first (network byte order); see [varint]. All fixed-width
//! fields are big-endian.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use pcos_codec::{Document, OutputBlock};
//!
//! // Build a `Pong` message carrying one timestamp block.
//! let mut tm = OutputBlock::new("Tm");
//! tm.write_ulong(1335795040);
//! let mut msg = Document::new("Po");
//! msg.add(tm);
//! let wire: Bytes = msg.encode();
//!
//! // Parse it back and read the timestamp.
//! let msg = Document::parse(wire).unwrap();
//! let mut tm = msg.block("Tm").unwrap();
//! assert_eq!(tm.read_ulong().unwrap(), 1335795040);
//! ```

pub mod base16;
pub mod block;
pub mod document;
pub mod error;
pub mod varint;

// Re-export main types and constants
pub use block::{InputBlock, OutputBlock};
pub use document::{
    Document, MAX_BLOCK_COUNT, MAX_BLOCK_ID_LENGTH, MAX_BLOCK_LENGTH, MAX_MESSAGE_ID_LENGTH,
    MIN_MESSAGE_LENGTH, PROTOCOL_FLAGS, PROTOCOL_MAGIC,
};
pub use error::Error;
