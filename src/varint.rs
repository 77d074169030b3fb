//! PCOS variable-length integer encoding and decoding
//!
//! Each octet carries 7 bits of value data plus a continuation bit in the most
//! significant position. Unlike Protocol Buffers, groups are emitted most
//! significant first, so the stream reads in network byte order and a decoder
//! shifts its accumulator left by 7 for every continuation octet.
//!
//! Decoding is bounded by a maximum octet count so a malicious peer cannot
//! force an unbounded read: 5 octets for the 32-bit domain, 10 for the 64-bit
//! domain. These are protocol constants, not tunables.

use crate::Error;
use bytes::{Buf, BufMut};

const DATA_BITS_PER_OCTET: usize = 7;
const DATA_BITS_MASK: u8 = 0x7F;
const CONTINUATION_BIT_MASK: u8 = 0x80;

/// Wire limit for varints carrying 32-bit values.
pub const MAX_UINT_OCTETS: usize = 5;

/// Wire limit for varints carrying 64-bit values.
pub const MAX_ULONG_OCTETS: usize = 10;

/// Encodes an unsigned integer as a PCOS varint.
pub fn write(value: u64, buf: &mut impl BufMut) {
    if value <= DATA_BITS_MASK as u64 {
        // Fast path for small values (common case for lengths).
        buf.put_u8(value as u8);
        return;
    }

    // Split into 7-bit groups, low group first, then emit in reverse so the
    // most significant group leads on the wire.
    let mut staged = [0u8; MAX_ULONG_OCTETS];
    let mut len = 0;
    let mut val = value;
    while val > 0 {
        staged[len] = (val as u8) & DATA_BITS_MASK;
        len += 1;
        val >>= DATA_BITS_PER_OCTET;
    }
    for i in (0..len).rev() {
        let mut octet = staged[i];
        if i != 0 {
            octet |= CONTINUATION_BIT_MASK;
        }
        buf.put_u8(octet);
    }
}

/// Decodes a PCOS varint, consuming at most `max_octets` octets.
///
/// Fails with [Error::MalformedVarint] if no terminal octet appears within
/// `max_octets` or the accumulated value overflows `u64`, and with
/// [Error::TruncatedInput] if the buffer runs dry first.
pub fn read(buf: &mut impl Buf, max_octets: usize) -> Result<u64, Error> {
    // 10 octets hold up to 70 data bits, so accumulate wide and narrow last.
    let mut val: u128 = 0;
    for _ in 0..max_octets {
        if !buf.has_remaining() {
            return Err(Error::TruncatedInput);
        }
        let octet = buf.get_u8();
        val = (val << DATA_BITS_PER_OCTET) | (octet & DATA_BITS_MASK) as u128;
        if octet & CONTINUATION_BIT_MASK == 0 {
            return u64::try_from(val).map_err(|_| Error::MalformedVarint);
        }
    }
    Err(Error::MalformedVarint)
}

/// Calculates the number of octets `value` occupies as a varint.
pub fn size(value: u64) -> usize {
    let data_bits = u64::BITS as usize - value.leading_zeros() as usize;
    usize::max(1, data_bits.div_ceil(DATA_BITS_PER_OCTET))
}

/// Signed integers that map to an unsigned wire representation via ZigZag
/// encoding.
///
/// ZigZag moves the sign bit to the least significant position so that
/// small-magnitude values, negative included, stay small after unsigned varint
/// encoding.
pub trait ZigZag: Copy {
    /// The unsigned integer of equivalent width.
    type Unsigned;

    /// Converts the signed integer to its ZigZag unsigned form.
    fn zigzag(self) -> Self::Unsigned;

    /// Converts a ZigZag'ed unsigned integer back to the signed integer.
    fn unzigzag(value: Self::Unsigned) -> Self;
}

// Implements `ZigZag` for the signed widths PCOS puts on the wire.
macro_rules! impl_zigzag {
    ($type:ty, $utype:ty) => {
        impl ZigZag for $type {
            type Unsigned = $utype;

            #[inline]
            fn zigzag(self) -> $utype {
                let shr = <$type>::BITS as usize - 1;
                ((self << 1) ^ (self >> shr)) as $utype
            }

            #[inline]
            fn unzigzag(value: $utype) -> Self {
                ((value >> 1) as $type) ^ (-((value & 1) as $type))
            }
        }
    };
}
impl_zigzag!(i32, u32);
impl_zigzag!(i64, u64);
