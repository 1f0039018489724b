//! Fixed-point arithmetic used by the 16-bit evaluators.
//!
//! Interpolation works in 15.16 fixed point: the integer part selects a grid cell, the lower
//! 16 bits are the position inside that cell. The matrix-shaper evaluator uses 1.14.

/// 1.0 in 1.14 fixed point.
pub const ONE_1FIXED14: i32 = 0x4000;

/// Maps `0..=0xffff * domain` onto `0..=domain` in 15.16 fixed point.
///
/// This is `a * 65536 / 65535`, computed without a division by 65535 per call in the common
/// case.
#[inline]
pub fn to_fixed_domain(a: i64) -> i64 {
    a + ((a + 0x7fff) / 0xffff)
}

/// Integer part of a 15.16 number.
#[inline]
pub fn fixed_to_int(x: i64) -> i64 {
    x >> 16
}

/// Fractional part of a 15.16 number, as 0..=0xffff.
#[inline]
pub fn fixed_rest_to_int(x: i64) -> i64 {
    x & 0xffff
}

/// Rounds a 15.16 number to the nearest integer.
#[inline]
pub fn round_fixed_to_int(x: i64) -> i64 {
    (x + 0x8000) >> 16
}

/// Converts a float to 1.14 fixed point, rounding to nearest.
#[inline]
pub fn double_to_1fixed14(x: f64) -> i32 {
    (x * 16384. + 0.5).floor() as i32
}

/// Floors a float to a word, saturating at the ends of the 16-bit range.
///
/// Rounds to nearest: `0.5` is added before flooring.
#[inline]
pub fn quick_saturate_word(d: f64) -> u16 {
    let d = d + 0.5;
    if d <= 0. || d.is_nan() {
        0
    } else if d >= 65535. {
        0xffff
    } else {
        d.floor() as u16
    }
}

/// Position of grid node `i` out of `max_samples` nodes, as a 16-bit value.
#[inline]
pub fn quantize_val(i: f64, max_samples: usize) -> u16 {
    let x = (i * 65535.) / (max_samples as f64 - 1.);
    quick_saturate_word(x)
}

/// Converts an 8-bit value to 16 bits (`0xab` → `0xabab`).
#[inline]
pub fn from_8_to_16(v: u8) -> u16 {
    ((v as u16) << 8) | v as u16
}

/// Converts a 16-bit value to 8 bits with rounding.
#[inline]
pub fn from_16_to_8(v: u16) -> u8 {
    (((v as u32) * 65281 + 8388608) >> 24) as u8
}

#[test]
fn fixed_domain() {
    assert_eq!(to_fixed_domain(0), 0);
    assert_eq!(to_fixed_domain(0x8000), 0x8001);
    // 0xffff maps exactly onto 1.0
    assert_eq!(to_fixed_domain(0xffff), 0x10000);
    assert_eq!(fixed_to_int(to_fixed_domain(0xffff * 7)), 7);
    assert_eq!(fixed_rest_to_int(to_fixed_domain(0xffff * 7)), 0);
}

#[test]
fn eight_bit_conversions() {
    for v in 0..=255u8 {
        assert_eq!(from_16_to_8(from_8_to_16(v)), v);
    }
    assert_eq!(quick_saturate_word(-3.), 0);
    assert_eq!(quick_saturate_word(70000.), 0xffff);
    assert_eq!(quick_saturate_word(1.49), 1);
    assert_eq!(quantize_val(1., 3), 0x8000);
    assert_eq!(double_to_1fixed14(1.), ONE_1FIXED14);
}
