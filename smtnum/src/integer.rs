//! Canonical byte codec for multi-precision integers.
//!
//! The wire format is the one used by `BigInteger.toByteArray()` on the JVM and by
//! [`BigInt::to_signed_bytes_be`] in Rust: big-endian two's-complement, minimal length.
//! Solvers hand out integers in sign+magnitude form, so both directions go through
//! an explicit two's-complement negation of a byte buffer.

use log::warn;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;

use crate::{
    error::{NumError, NumResult},
    sign::SignMagnitude,
};

/// Size limits applied by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecLimits {
    /// Largest encoded length accepted, in bytes.
    pub max_encoded_len: usize,
}

impl CodecLimits {
    /// Largest array a JVM caller can index.
    pub const DEFAULT_MAX_ENCODED_LEN: usize = i32::MAX as usize;
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_encoded_len: Self::DEFAULT_MAX_ENCODED_LEN,
        }
    }
}

/// Allocate a zero-filled buffer of `len` bytes, reporting failure instead of aborting.
pub(crate) fn try_zeroed(len: usize) -> NumResult<Vec<u8>> {
    let mut buf = Vec::new();
    if buf.try_reserve_exact(len).is_err() {
        warn!("Allocation of {len} bytes refused while converting a bignum");
        return Err(NumError::AllocationFailure { requested: len });
    }
    buf.resize(len, 0);
    Ok(buf)
}

/// Two's-complement negation of a big-endian buffer, in place.
///
/// Every byte is complemented, then 1 is added at the least significant byte and the
/// carry is propagated toward the most significant one.
pub fn negate_in_place(bytes: &mut [u8]) {
    let mut carry = 1u8;
    for b in bytes.iter_mut().rev() {
        let (value, overflow) = (!*b).overflowing_add(carry);
        *b = value;
        carry = overflow as u8;
    }
}

/// Whether `lead` is a redundant sign-extension byte in front of `next`.
#[inline]
fn is_redundant_lead(lead: u8, next: u8) -> bool {
    (lead == 0x00 && next & 0x80 == 0) || (lead == 0xFF && next & 0x80 != 0)
}

/// Returns `true` if `bytes` is a minimal two's-complement encoding.
pub fn is_canonical(bytes: &[u8]) -> bool {
    match bytes {
        [] => false,
        [_] => true,
        [lead, next, ..] => !is_redundant_lead(*lead, *next),
    }
}

/// Encode a sign+magnitude integer using the default [`CodecLimits`].
///
/// Examples:
/// - `127  -> [0x7F]`
/// - `-128 -> [0x80]`
/// - `128  -> [0x00, 0x80]`
/// - `-256 -> [0xFF, 0x00]`
///
/// ```
/// use num_bigint::{BigUint, Sign};
/// let bytes = smtnum::encode_bignum(Sign::Plus, &BigUint::from(255u32)).unwrap();
/// assert_eq!(bytes, vec![0x00, 0xFF]);
/// ```
pub fn encode_bignum(sign: Sign, magnitude: &BigUint) -> NumResult<Vec<u8>> {
    encode_bignum_with(sign, magnitude, &CodecLimits::default())
}

/// Encode a sign+magnitude integer into its canonical byte form.
///
/// Layout:
/// - `nbytes = ceil(bits(|N|) / 8) + 1`; byte 0 is a zero guard byte reserved for the sign.
/// - `|N|` is written big-endian into bytes `1..nbytes`.
/// - Negative values are negated in place with [`negate_in_place`].
/// - At most one redundant leading byte is trimmed.
///
/// A [`Sign::NoSign`] paired with a non-zero magnitude is rejected. A length above
/// `limits.max_encoded_len` or a refused allocation yields
/// [`NumError::AllocationFailure`].
pub fn encode_bignum_with(
    sign: Sign,
    magnitude: &BigUint,
    limits: &CodecLimits,
) -> NumResult<Vec<u8>> {
    if sign == Sign::NoSign && !magnitude.is_zero() {
        return Err(NumError::SignMismatch);
    }

    let nbytes = usize::try_from(magnitude.bits().div_ceil(8))
        .ok()
        .and_then(|n| n.checked_add(1))
        .unwrap_or(usize::MAX);
    if nbytes > limits.max_encoded_len {
        warn!(
            "Encoding needs {nbytes} bytes, above the limit of {}",
            limits.max_encoded_len
        );
        return Err(NumError::AllocationFailure { requested: nbytes });
    }

    let mut buf = try_zeroed(nbytes)?;

    // Digits are little-endian; fill from the last byte backward and leave buf[0] as guard.
    let mut pos = nbytes;
    'digits: for digit in magnitude.iter_u64_digits() {
        for byte in digit.to_le_bytes() {
            if pos == 1 {
                break 'digits;
            }
            pos -= 1;
            buf[pos] = byte;
        }
    }

    if sign == Sign::Minus && !magnitude.is_zero() {
        negate_in_place(&mut buf);
    }

    if buf.len() > 1 && is_redundant_lead(buf[0], buf[1]) {
        buf.remove(0);
    }

    Ok(buf)
}

/// Encode a [`BigInt`] into its canonical byte form.
pub fn encode_integer(value: &BigInt) -> NumResult<Vec<u8>> {
    encode_bignum(value.sign(), value.magnitude())
}

/// Decode a canonical (or any valid two's-complement) byte array.
///
/// If the high bit of byte 0 is clear the bytes are read as an unsigned magnitude.
/// Otherwise a scratch copy is negated in place, read as magnitude `M`, and the
/// result is `-M`. The input slice is never modified.
pub fn decode_bignum(bytes: &[u8]) -> NumResult<SignMagnitude> {
    decode_bignum_with(bytes, &CodecLimits::default())
}

/// Decode like [`decode_bignum`], refusing inputs longer than `limits.max_encoded_len`
/// with [`NumError::AllocationFailure`].
pub fn decode_bignum_with(bytes: &[u8], limits: &CodecLimits) -> NumResult<SignMagnitude> {
    let first = *bytes.first().ok_or(NumError::EmptyInput)?;
    if bytes.len() > limits.max_encoded_len {
        warn!(
            "Refusing to decode {} bytes, above the limit of {}",
            bytes.len(),
            limits.max_encoded_len
        );
        return Err(NumError::AllocationFailure {
            requested: bytes.len(),
        });
    }

    if first & 0x80 == 0 {
        let magnitude = BigUint::from_bytes_be(bytes);
        let sign = if magnitude.is_zero() {
            Sign::NoSign
        } else {
            Sign::Plus
        };
        SignMagnitude::new(sign, magnitude)
    } else {
        let mut scratch = try_zeroed(bytes.len())?;
        scratch.copy_from_slice(bytes);
        negate_in_place(&mut scratch);
        SignMagnitude::new(Sign::Minus, BigUint::from_bytes_be(&scratch))
    }
}

/// Decode a byte array straight into a [`BigInt`].
pub fn decode_integer(bytes: &[u8]) -> NumResult<BigInt> {
    decode_bignum(bytes).map(BigInt::from)
}

/// Decode a byte array into a [`BigInt`] under explicit limits.
pub fn decode_integer_with(bytes: &[u8], limits: &CodecLimits) -> NumResult<BigInt> {
    decode_bignum_with(bytes, limits).map(BigInt::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enc(n: i64) -> Vec<u8> {
        encode_integer(&BigInt::from(n)).unwrap()
    }

    fn dec(bytes: &[u8]) -> BigInt {
        decode_integer(bytes).unwrap()
    }

    #[test]
    fn encoding_shape_examples() {
        assert_eq!(enc(0), vec![0x00]);
        assert_eq!(enc(1), vec![0x01]);
        assert_eq!(enc(-1), vec![0xFF]);
        assert_eq!(enc(127), vec![0x7F]);
        assert_eq!(enc(-127), vec![0x81]);
        assert_eq!(enc(128), vec![0x00, 0x80]);
        assert_eq!(enc(-128), vec![0x80]);
        assert_eq!(enc(255), vec![0x00, 0xFF]);
        assert_eq!(enc(-255), vec![0xFF, 0x01]);
        assert_eq!(enc(256), vec![0x01, 0x00]);
        assert_eq!(enc(-256), vec![0xFF, 0x00]);
        assert_eq!(enc(-129), vec![0xFF, 0x7F]);
    }

    #[test]
    fn negate_propagates_carry() {
        let mut b = [0x00, 0x00];
        negate_in_place(&mut b);
        assert_eq!(b, [0x00, 0x00]);

        let mut b = [0x00, 0x01, 0x00];
        negate_in_place(&mut b);
        assert_eq!(b, [0xFF, 0xFF, 0x00]);
    }

    #[test]
    fn decode_reads_sign_from_high_bit() {
        assert_eq!(dec(&[0x80]), BigInt::from(-128));
        assert_eq!(dec(&[0x00, 0x80]), BigInt::from(128));
        assert_eq!(dec(&[0xFF, 0x00]), BigInt::from(-256));
        // Non-minimal input is still accepted.
        assert_eq!(dec(&[0x00, 0x00, 0x7F]), BigInt::from(127));
        assert_eq!(dec(&[0xFF, 0xFF, 0x80]), BigInt::from(-128));
    }

    #[test]
    fn decode_does_not_touch_input() {
        let input = [0xFF, 0x00];
        let _ = dec(&input);
        assert_eq!(input, [0xFF, 0x00]);
    }

    #[test]
    fn decode_empty_is_rejected() {
        assert_eq!(decode_bignum(&[]).unwrap_err(), NumError::EmptyInput);
    }

    #[test]
    fn limit_is_reported_as_allocation_failure() {
        let limits = CodecLimits { max_encoded_len: 2 };
        let err =
            encode_bignum_with(Sign::Plus, &BigUint::from(1u32 << 20), &limits).unwrap_err();
        assert_eq!(err, NumError::AllocationFailure { requested: 4 });

        // Exactly at the limit is fine.
        let ok = encode_bignum_with(Sign::Plus, &BigUint::from(128u32), &limits).unwrap();
        assert_eq!(ok, vec![0x00, 0x80]);
    }

    #[test]
    fn decode_limit_rejects_long_input() {
        let limits = CodecLimits { max_encoded_len: 2 };
        let err = decode_bignum_with(&[0x01, 0x00, 0x00], &limits).unwrap_err();
        assert_eq!(err, NumError::AllocationFailure { requested: 3 });
        let err = decode_integer_with(&[0xFF, 0x00, 0x00], &limits).unwrap_err();
        assert_eq!(err, NumError::AllocationFailure { requested: 3 });

        assert_eq!(decode_integer_with(&[0xFF, 0x00], &limits).unwrap(), BigInt::from(-256));
        // Emptiness is reported before the limit.
        let none = CodecLimits { max_encoded_len: 0 };
        assert_eq!(decode_bignum_with(&[], &none).unwrap_err(), NumError::EmptyInput);
    }

    #[test]
    fn no_sign_with_magnitude_is_rejected() {
        let err = encode_bignum(Sign::NoSign, &BigUint::from(9u32)).unwrap_err();
        assert_eq!(err, NumError::SignMismatch);
        assert_eq!(encode_bignum(Sign::Minus, &BigUint::zero()).unwrap(), vec![0x00]);
    }

    #[test]
    fn canonical_detection() {
        assert!(!is_canonical(&[]));
        assert!(is_canonical(&[0x00]));
        assert!(is_canonical(&[0xFF]));
        assert!(is_canonical(&[0x00, 0x80]));
        assert!(!is_canonical(&[0x00, 0x7F]));
        assert!(!is_canonical(&[0xFF, 0x80]));
        assert!(is_canonical(&[0xFF, 0x7F]));
    }
}
