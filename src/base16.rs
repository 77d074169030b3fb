//! Human-readable identifier rendering over the PCOS-16 alphabet.
//!
//! Renders byte strings as short tokens over a fixed 16-symbol alphabet
//! chosen to avoid visually ambiguous glyphs, two symbols per byte with the
//! high nibble first. Decoding is case-insensitive.
//!
//! This is a presentation-layer helper for turning random bytes into
//! identifiers humans can transcribe; the document codec never touches it.

use thiserror::Error;

/// The PCOS-16 alphabet, indexed by nibble value.
const ALPHABET: [u8; 16] = *b"ACEFHKLNPRTXY457";

/// Error type for PCOS-16 decoding.
#[derive(Error, Debug)]
pub enum Base16Error {
    #[error("input length {0} is odd: not a PCOS-16 string")]
    OddLength(usize),
    #[error("symbol '{0}' is not in the PCOS-16 alphabet")]
    InvalidSymbol(char),
}

/// Renders bytes as a PCOS-16 string, high nibble first.
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(ALPHABET[(byte >> 4) as usize] as char);
        out.push(ALPHABET[(byte & 0x0F) as usize] as char);
    }
    out
}

fn symbol_value(symbol: char) -> Option<u8> {
    let upper = symbol.to_ascii_uppercase();
    ALPHABET
        .iter()
        .position(|&s| s as char == upper)
        .map(|v| v as u8)
}

/// Decodes a PCOS-16 string back to bytes.
pub fn decode(pretty: &str) -> Result<Vec<u8>, Base16Error> {
    let symbols: Vec<char> = pretty.chars().collect();
    if symbols.len() % 2 != 0 {
        return Err(Base16Error::OddLength(symbols.len()));
    }
    let mut out = Vec::with_capacity(symbols.len() / 2);
    for pair in symbols.chunks(2) {
        let hi = symbol_value(pair[0]).ok_or(Base16Error::InvalidSymbol(pair[0]))?;
        let lo = symbol_value(pair[1]).ok_or(Base16Error::InvalidSymbol(pair[1]))?;
        out.push((hi << 4) | lo);
    }
    Ok(out)
}
