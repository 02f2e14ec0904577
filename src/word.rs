//! Two's-complement helpers shared by the assembler and the executor.
//!
//! Words are carried around as `u16`; the binary-string forms exist for
//! inspection and for the memory listing.

/// A 16-bit machine word.
pub type Word = u16;

const WORD_BITS: u32 = 16;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BitsError {
    #[error("empty bit string")]
    Empty,
    #[error("bit string is {len} bits wide, at most 32 supported")]
    TooWide { len: usize },
    #[error("invalid binary digit {ch:?}")]
    InvalidDigit { ch: char },
}

/// Interprets `bits` as a two's-complement number of `bits.len()` bits.
pub fn decode_signed(bits: &str) -> Result<i64, BitsError> {
    let len = bits.chars().count();
    if len == 0 {
        return Err(BitsError::Empty);
    }
    if len > 32 {
        return Err(BitsError::TooWide { len });
    }
    let mut unsigned: i64 = 0;
    for ch in bits.chars() {
        let bit = match ch {
            '0' => 0,
            '1' => 1,
            _ => return Err(BitsError::InvalidDigit { ch }),
        };
        unsigned = (unsigned << 1) | bit;
    }
    if unsigned >> (len - 1) & 1 == 0 {
        Ok(unsigned)
    } else {
        Ok(unsigned - (1i64 << len))
    }
}

/// Masks `value` to `width` bits and renders it zero-padded. Out-of-range
/// values wrap silently.
pub fn encode_signed(value: i64, width: u32) -> String {
    let masked = (value as u64) & mask(width);
    format!("{:0width$b}", masked, width = width as usize)
}

/// Renders a full word as its 16-character binary string.
pub fn to_bits(word: Word) -> String {
    format!("{:016b}", word)
}

pub fn mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Sign-extends the low `width` bits of `raw`.
#[inline]
pub fn sign_extend(raw: Word, width: u32) -> i16 {
    let s = WORD_BITS - width;
    ((raw << s) as i16) >> s
}

/// Inclusive signed range representable in `width` bits.
pub fn signed_range(width: u32) -> (i64, i64) {
    let half = 1i64 << (width - 1);
    (-half, half - 1)
}

pub fn fits_signed(value: i64, width: u32) -> bool {
    let (lo, hi) = signed_range(width);
    (lo..=hi).contains(&value)
}

/// Truncates `value` into a `width`-bit field.
pub fn field(value: i64, width: u32) -> Word {
    ((value as u64) & mask(width)) as Word
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_uses_msb_as_sign() {
        assert_eq!(decode_signed("0111").unwrap(), 7);
        assert_eq!(decode_signed("1000").unwrap(), -8);
        assert_eq!(decode_signed("1111111111111111").unwrap(), -1);
        assert_eq!(decode_signed("1").unwrap(), -1);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert_eq!(decode_signed(""), Err(BitsError::Empty));
        assert_eq!(decode_signed("10x1"), Err(BitsError::InvalidDigit { ch: 'x' }));
    }

    #[test]
    fn encode_wraps_out_of_range() {
        assert_eq!(encode_signed(-1, 5), "11111");
        assert_eq!(encode_signed(32, 5), "00000");
        assert_eq!(encode_signed(3, 9), "000000011");
    }

    #[test]
    fn sign_extend_fields() {
        assert_eq!(sign_extend(0b1_1111, 5), -1);
        assert_eq!(sign_extend(0b0_1111, 5), 15);
        assert_eq!(sign_extend(0x1FF, 9), -1);
        assert_eq!(sign_extend(0x100, 9), -256);
        assert_eq!(signed_range(11), (-1024, 1023));
    }
}
