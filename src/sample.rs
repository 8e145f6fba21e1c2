//! Sample representation and fixed-point arithmetic.
//!
//! Every buffer in the engine holds 16-bit words. A word is an unsigned
//! magnitude in `[0, 65535]` that doubles as a two's-complement signed
//! value: `0..=32767` is non-negative, `32768..=65535` encodes
//! `stored - 65536`. Keeping everything in unsigned words lets the render
//! path run on plain integer registers; the price is that every fixed-point
//! multiply has to reflect negative words around the modulus before scaling
//! them. [`scale`] implements that reflected multiply once, and every module
//! kernel goes through it.

/// One 16-bit sample word.
pub type Sample = u16;

/// Words strictly above this value encode negative samples.
pub const SIGN_BOUNDARY: i64 = 32768;

/// The word modulus; `word - WORD_MODULUS` recovers the signed value of a
/// negative word.
pub const WORD_MODULUS: i64 = 65536;

/// Sign-aware fixed-point multiply.
///
/// Scales `value` by `coeff / 2^shift`. Negative words (strictly above
/// [`SIGN_BOUNDARY`]) are reflected to their magnitude, scaled, and
/// re-reflected, so the multiply never crosses the sign boundary mid-flight.
/// `value` is accepted as an `i64` because intermediate filter and reverb
/// state legitimately drifts outside the 16-bit word range between stores.
#[inline]
pub fn scale(value: i64, coeff: i64, shift: u32) -> i64 {
    if value > SIGN_BOUNDARY {
        WORD_MODULUS - (((WORD_MODULUS - value) * coeff) >> shift)
    } else {
        (value * coeff) >> shift
    }
}

/// Quantize a fraction in `[0.0, 1.0]` to Q8 (unity = 256).
///
/// Out-of-range inputs are clamped before quantization.
#[inline]
pub fn q8_from_fraction(fraction: f64) -> i64 {
    let clamped = fraction.clamp(0.0, 1.0);
    libm::floor(clamped * 256.0 + 0.5) as i64
}

/// Quantize a fraction in `[0.0, 1.0]` to Q15 (unity = 32767), truncating.
#[inline]
pub fn q15_from_fraction(fraction: f64) -> i64 {
    (fraction.clamp(0.0, 1.0) * 32767.0) as i64
}

/// Interpret a word as its signed value.
#[inline]
pub fn to_signed(word: Sample) -> i32 {
    word as i16 as i32
}

/// Store a signed value as a word, wrapping modulo 2^16.
#[inline]
pub fn from_signed(value: i32) -> Sample {
    value as Sample
}
