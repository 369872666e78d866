//! Bit-packed serialization.
//!
//! Fields are written most-significant bit first with no alignment between
//! them, so a 1-bit flag followed by an 8-bit tag occupies exactly nine bits.
//! The final byte of a buffer is zero padded.

use thiserror::Error;

/// Largest length (terminator included) that fits the short string prefix.
const SHORT_STRING_MAX: usize = 127;
/// Width of the short string length prefix.
const SHORT_STRING_BITS: u32 = 7;
/// Width of the extended string length prefix.
const LONG_STRING_BITS: u32 = 15;

/// An error raised while reading from a [`BitReader`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BitError {
    /// The buffer ended before the requested bits could be read.
    #[error("buffer exhausted: needed {needed} bits, {remaining} remaining")]
    Exhausted {
        /// Bits the read required.
        needed: usize,
        /// Bits that were left in the buffer.
        remaining: usize,
    },
    /// A string declared more bytes than the field allows.
    #[error("string of {len} bytes exceeds the {max} byte limit")]
    StringTooLong {
        /// Declared length, terminator excluded.
        len: usize,
        /// Field capacity, terminator excluded.
        max: usize,
    },
    /// A string was missing its terminator or had one in the middle.
    #[error("malformed string field")]
    MalformedString,
}

/// Growable MSB-first bit buffer.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl BitWriter {
    /// Creates an empty writer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes: Vec::new(),
            bit_len: 0,
        }
    }

    /// Creates an empty writer with room for `bytes` bytes.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            bit_len: 0,
        }
    }

    /// Number of bits written so far.
    #[must_use]
    pub const fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Appends a single bit.
    pub fn write_bit(&mut self, bit: bool) {
        let byte_index = self.bit_len / 8;
        if byte_index == self.bytes.len() {
            self.bytes.push(0);
        }
        if bit {
            self.bytes[byte_index] |= 0x80 >> (self.bit_len % 8);
        }
        self.bit_len += 1;
    }

    /// Appends the low `bits` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u64, bits: u32) {
        debug_assert!(bits <= u64::BITS, "cannot write more than 64 bits at once");
        for shift in (0..bits).rev() {
            self.write_bit((value >> shift) & 1 == 1);
        }
    }

    /// Appends whole bytes at the current (possibly unaligned) position.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.write_bits(u64::from(*byte), 8);
        }
    }

    /// Appends a NUL-terminated string with its length prefix.
    ///
    /// The prefix counts the terminator: a 1-bit flag selects a 7-bit or a
    /// 15-bit length. Capacity checks belong to the caller.
    pub fn write_string(&mut self, value: &[u8]) {
        let len = value.len() + 1;
        let extended = len > SHORT_STRING_MAX;
        self.write_bit(extended);
        self.write_bits(
            len as u64,
            if extended {
                LONG_STRING_BITS
            } else {
                SHORT_STRING_BITS
            },
        );
        self.write_bytes(value);
        self.write_bits(0, 8);
    }

    /// Consumes the writer and returns the padded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Cursor over an MSB-first bit buffer.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a reader positioned at the first bit of `bytes`.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Bits left before the end of the buffer (padding included).
    #[must_use]
    pub const fn remaining_bits(&self) -> usize {
        self.bytes.len() * 8 - self.position
    }

    fn ensure(&self, needed: usize) -> Result<(), BitError> {
        let remaining = self.remaining_bits();
        if needed > remaining {
            return Err(BitError::Exhausted { needed, remaining });
        }
        Ok(())
    }

    /// Reads a single bit.
    pub fn read_bit(&mut self) -> Result<bool, BitError> {
        self.ensure(1)?;
        let byte = self.bytes[self.position / 8];
        let bit = byte & (0x80 >> (self.position % 8)) != 0;
        self.position += 1;
        Ok(bit)
    }

    /// Reads `bits` bits, most significant first.
    pub fn read_bits(&mut self, bits: u32) -> Result<u64, BitError> {
        debug_assert!(bits <= u64::BITS, "cannot read more than 64 bits at once");
        self.ensure(bits as usize)?;
        let mut value = 0u64;
        for _ in 0..bits {
            value = (value << 1) | u64::from(self.read_bit()?);
        }
        Ok(value)
    }

    /// Reads `len` whole bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, BitError> {
        self.ensure(len * 8)?;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(self.read_bits(8)? as u8);
        }
        Ok(out)
    }

    /// Reads a string written by [`BitWriter::write_string`], terminator stripped.
    ///
    /// `max` bounds the content length, terminator excluded.
    pub fn read_string(&mut self, max: usize) -> Result<Vec<u8>, BitError> {
        let extended = self.read_bit()?;
        let len = self.read_bits(if extended {
            LONG_STRING_BITS
        } else {
            SHORT_STRING_BITS
        })? as usize;

        let Some(content_len) = len.checked_sub(1) else {
            return Err(BitError::MalformedString);
        };
        if content_len > max {
            return Err(BitError::StringTooLong {
                len: content_len,
                max,
            });
        }

        let mut bytes = self.read_bytes(len)?;
        if bytes.pop() != Some(0) || bytes.contains(&0) {
            return Err(BitError::MalformedString);
        }
        Ok(bytes)
    }
}

/// A value with a fixed bit-level encoding.
pub trait WriteTo {
    /// Appends `self` to the writer.
    fn write(&self, writer: &mut BitWriter);
}

/// A value decodable from a bit-level encoding.
pub trait ReadFrom: Sized {
    /// Reads a value from the reader.
    fn read(reader: &mut BitReader<'_>) -> Result<Self, BitError>;
}

impl WriteTo for bool {
    fn write(&self, writer: &mut BitWriter) {
        writer.write_bit(*self);
    }
}

impl ReadFrom for bool {
    fn read(reader: &mut BitReader<'_>) -> Result<Self, BitError> {
        reader.read_bit()
    }
}

macro_rules! impl_unsigned {
    ($($ty:ty),*) => {
        $(
            impl WriteTo for $ty {
                fn write(&self, writer: &mut BitWriter) {
                    writer.write_bits(u64::from(*self), <$ty>::BITS);
                }
            }

            impl ReadFrom for $ty {
                fn read(reader: &mut BitReader<'_>) -> Result<Self, BitError> {
                    Ok(reader.read_bits(<$ty>::BITS)? as $ty)
                }
            }
        )*
    };
}

impl_unsigned!(u8, u16, u32, u64);

impl WriteTo for i64 {
    fn write(&self, writer: &mut BitWriter) {
        writer.write_bits(*self as u64, i64::BITS);
    }
}

impl ReadFrom for i64 {
    fn read(reader: &mut BitReader<'_>) -> Result<Self, BitError> {
        Ok(reader.read_bits(i64::BITS)? as i64)
    }
}
