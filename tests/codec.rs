use pretty_assertions::assert_eq;

use lc3_rs::word::{decode_signed, encode_signed, field, sign_extend, BitsError};

#[test]
fn encode_then_decode_is_identity_within_range() {
    for width in [5u32, 6, 9, 11, 16] {
        let half = 1i64 << (width - 1);
        for v in [-half, -1, 0, 1, half - 1] {
            let bits = encode_signed(v, width);
            assert_eq!(bits.len(), width as usize);
            assert_eq!(decode_signed(&bits).unwrap(), v, "width {width}");
        }
    }
}

#[test]
fn encode_wraps_out_of_range_values() {
    assert_eq!(encode_signed(16, 5), "10000");
    assert_eq!(decode_signed("10000").unwrap(), -16);
    assert_eq!(encode_signed(-1, 9), "111111111");
}

#[test]
fn decode_rejects_junk() {
    assert_eq!(decode_signed(""), Err(BitsError::Empty));
    assert_eq!(decode_signed("1021"), Err(BitsError::InvalidDigit { ch: '2' }));
}

#[test]
fn field_and_sign_extend_agree() {
    for v in -256i64..256 {
        assert_eq!(i64::from(sign_extend(field(v, 9), 9)), v);
    }
    assert_eq!(sign_extend(0b11111, 5), -1);
    assert_eq!(sign_extend(0b01111, 5), 15);
}
