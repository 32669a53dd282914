//! Bit cursors over byte buffers.
//!
//! Bits are addressed in MSB-first order: bit 0 is the high bit of the first
//! byte. Every primitive advances the cursor by exactly its width and may
//! span byte boundaries.

use crate::{
    errors::{ReadError, WriteError},
    float::{FloatEncoding, Real},
    text::Charset,
};

/// Reading cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Current offset in bits from the start of the buffer.
    pub fn position(&self) -> usize {
        self.bit_pos
    }

    /// Bits left before the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len() * 8 - self.bit_pos
    }

    fn ensure(&self, n: usize) -> Result<(), ReadError> {
        let available = self.remaining();
        if n > available {
            return Err(ReadError::BufferUnderrun {
                needed: n,
                available,
            });
        }

        Ok(())
    }

    /// Reads `n` bits (max 64) as an unsigned value.
    pub fn read_uint(&mut self, n: usize) -> Result<u64, ReadError> {
        if n > 64 {
            return Err(ReadError::TooManyBits(n));
        }
        self.ensure(n)?;

        let mut value = 0u64;
        let mut left = n;

        while left > 0 {
            let byte = self.data[self.bit_pos / 8];
            let free = 8 - self.bit_pos % 8;
            let take = free.min(left);
            let chunk = (byte >> (free - take)) & (0xFF >> (8 - take));

            value = (value << take) | chunk as u64;
            left -= take;
            self.bit_pos += take;
        }

        Ok(value)
    }

    /// Reads `n` bits (max 64) as two's complement, sign-extended from the top bit.
    pub fn read_int(&mut self, n: usize) -> Result<i64, ReadError> {
        Ok(sign_extend(self.read_uint(n)?, n))
    }

    pub fn read_bit(&mut self) -> Result<bool, ReadError> {
        Ok(self.read_uint(1)? != 0)
    }

    pub fn read_float(&mut self, encoding: FloatEncoding) -> Result<Real, ReadError> {
        let raw = self.read_uint(encoding.bits())?;
        Ok(encoding.decode(raw))
    }

    /// Reads `n / 8` bytes of text. Trailing NUL padding is dropped.
    pub fn read_text(&mut self, n: usize, charset: Charset) -> Result<String, ReadError> {
        self.ensure(n)?;

        let mut bytes = Vec::with_capacity(n / 8);
        for _ in 0..n / 8 {
            bytes.push(self.read_uint(8)? as u8);
        }

        let len = bytes.iter().rposition(|b| *b != 0).map_or(0, |pos| pos + 1);
        bytes.truncate(len);

        Ok(charset.decode(&bytes).into_owned())
    }

    /// Consumes `n` bits without looking at them.
    pub fn skip(&mut self, n: usize) -> Result<(), ReadError> {
        self.ensure(n)?;
        self.bit_pos += n;
        Ok(())
    }
}

/// Writing cursor that appends to a caller-owned buffer.
///
/// Bytes already in the buffer are left untouched; a trailing partial byte
/// is zero-filled.
#[derive(Debug)]
pub struct BitWriter<'a> {
    buf: &'a mut Vec<u8>,
    start: usize,
    bit_pos: usize,
}

impl<'a> BitWriter<'a> {
    pub fn new(buf: &'a mut Vec<u8>) -> Self {
        let start = buf.len();
        Self {
            buf,
            start,
            bit_pos: 0,
        }
    }

    /// Bits written so far.
    pub fn position(&self) -> usize {
        self.bit_pos
    }

    fn put(&mut self, value: u64, n: usize) {
        let mut left = n;

        while left > 0 {
            let index = self.start + self.bit_pos / 8;
            if index == self.buf.len() {
                self.buf.push(0);
            }

            let free = 8 - self.bit_pos % 8;
            let take = free.min(left);
            let chunk = ((value >> (left - take)) & mask(take)) as u8;

            self.buf[index] |= chunk << (free - take);
            left -= take;
            self.bit_pos += take;
        }
    }

    /// Writes the low `n` bits (max 64) of `value`; higher set bits are an error.
    pub fn write_uint(&mut self, value: u64, n: usize) -> Result<(), WriteError> {
        if n > 64 {
            return Err(WriteError::TooManyBits(n));
        }
        if value & !mask(n) != 0 {
            return Err(WriteError::ValueOutOfRange);
        }

        self.put(value, n);
        Ok(())
    }

    /// Writes `value` as an `n`-bit two's-complement integer.
    pub fn write_int(&mut self, value: i64, n: usize) -> Result<(), WriteError> {
        if n > 64 {
            return Err(WriteError::TooManyBits(n));
        }
        if sign_extend(value as u64 & mask(n), n) != value {
            return Err(WriteError::ValueOutOfRange);
        }

        self.put(value as u64 & mask(n), n);
        Ok(())
    }

    pub fn write_bit(&mut self, bit: bool) -> Result<(), WriteError> {
        self.put(bit as u64, 1);
        Ok(())
    }

    pub fn write_float(&mut self, encoding: FloatEncoding, value: Real) -> Result<(), WriteError> {
        let raw = encoding.encode(value)?;
        self.put(raw, encoding.bits());
        Ok(())
    }

    /// Writes `text` into an `n`-bit field, NUL-padded to `n / 8` bytes.
    pub fn write_text(&mut self, text: &str, n: usize, charset: Charset) -> Result<(), WriteError> {
        let bytes = charset.encode(text).ok_or(WriteError::InvalidText)?;
        let width = n / 8;
        if bytes.len() > width {
            return Err(WriteError::InvalidText);
        }

        for byte in bytes.iter() {
            self.put(*byte as u64, 8);
        }
        self.write_reserved((width - bytes.len()) * 8);
        Ok(())
    }

    /// Emits `n` zero bits.
    pub fn write_reserved(&mut self, n: usize) {
        let mut left = n;
        while left > 0 {
            let take = left.min(64);
            self.put(0, take);
            left -= take;
        }
    }
}

/// Sign-extends the low `bits` of `value` to a full `i64`.
pub fn sign_extend(value: u64, bits: usize) -> i64 {
    match bits {
        0 => 0,
        _ if bits >= 64 => value as i64,
        _ => {
            let shift = 64 - bits;
            ((value << shift) as i64) >> shift
        }
    }
}

/// All-ones mask of the low `bits` bits.
pub fn mask(bits: usize) -> u64 {
    match bits {
        0 => 0,
        _ if bits >= 64 => u64::MAX,
        _ => (1u64 << bits) - 1,
    }
}
