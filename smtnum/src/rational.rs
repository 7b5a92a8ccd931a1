//! Rationals on top of the integer codec.
//!
//! A rational travels as two independent canonical byte arrays, one for the
//! numerator and one for the denominator. Decoding always canonicalizes: the
//! result is in lowest terms with a positive denominator.

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

use crate::{
    error::{NumError, NumResult},
    integer::{CodecLimits, decode_integer_with, encode_bignum_with},
};

/// Numerator and denominator of a rational, each in canonical byte form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RationalBytes {
    pub numerator: Vec<u8>,
    pub denominator: Vec<u8>,
}

/// Build a canonical rational from a numerator and a denominator.
///
/// Fails with [`NumError::ZeroDenominator`] instead of panicking like
/// [`BigRational::new`] would.
pub fn canonical_rational(numerator: BigInt, denominator: BigInt) -> NumResult<BigRational> {
    if denominator.is_zero() {
        return Err(NumError::ZeroDenominator);
    }
    // `Ratio::new` reduces by the gcd and moves the sign to the numerator.
    Ok(BigRational::new(numerator, denominator))
}

/// Encode both halves of `value` with the default [`CodecLimits`].
pub fn encode_rational(value: &BigRational) -> NumResult<RationalBytes> {
    encode_rational_with(value, &CodecLimits::default())
}

pub fn encode_rational_with(value: &BigRational, limits: &CodecLimits) -> NumResult<RationalBytes> {
    let numer = value.numer();
    let denom = value.denom();
    Ok(RationalBytes {
        numerator: encode_bignum_with(numer.sign(), numer.magnitude(), limits)?,
        denominator: encode_bignum_with(denom.sign(), denom.magnitude(), limits)?,
    })
}

/// Decode a numerator/denominator byte pair into a canonical rational.
///
/// The zero-denominator check happens on the decoded value, before anything is
/// handed to a solver, so `[0x00]` and `[0x00, 0x00]` are both rejected.
///
/// ```
/// let a = smtnum::decode_rational(&[0x06], &[0xFC]).unwrap(); //  6 / -4
/// let b = smtnum::decode_rational(&[0xFD], &[0x02]).unwrap(); // -3 /  2
/// assert_eq!(a, b);
/// ```
pub fn decode_rational(numerator: &[u8], denominator: &[u8]) -> NumResult<BigRational> {
    decode_rational_with(numerator, denominator, &CodecLimits::default())
}

/// Decode a rational pair, applying `limits` to each half separately.
pub fn decode_rational_with(
    numerator: &[u8],
    denominator: &[u8],
    limits: &CodecLimits,
) -> NumResult<BigRational> {
    let num = decode_integer_with(numerator, limits)?;
    let den = decode_integer_with(denominator, limits)?;
    canonical_rational(num, den)
}

/// Parse `"n"` or `"n/d"` in decimal notation.
pub fn parse_rational(input: &str) -> NumResult<BigRational> {
    let parse = |s: &str| {
        s.trim().parse::<BigInt>().map_err(|e| NumError::Parse {
            input: input.to_string(),
            reason: e.to_string(),
        })
    };

    match input.split_once('/') {
        None => Ok(BigRational::from_integer(parse(input)?)),
        Some((_, "")) => Err(NumError::Parse {
            input: input.to_string(),
            reason: "missing denominator".to_string(),
        }),
        Some((num, den)) => canonical_rational(parse(num)?, parse(den)?),
    }
}

/// Exact conversion of a decimal `u * 10^-s` into a rational.
pub fn rational_from_decimal(value: &BigDecimal) -> NumResult<BigRational> {
    let (unscaled, scale) = value.as_bigint_and_exponent();
    let exponent =
        u32::try_from(scale.unsigned_abs()).map_err(|_| NumError::ExponentOutOfRange(scale))?;
    let power = BigInt::from(10u32).pow(exponent);

    if scale >= 0 {
        canonical_rational(unscaled, power)
    } else {
        canonical_rational(unscaled * power, BigInt::one())
    }
}
