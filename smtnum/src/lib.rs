//! smtnum: lossless transport of solver integers and rationals as bytes.
//!
//! Solvers keep multi-precision numbers as a sign plus an unsigned magnitude. Managed
//! callers expect the big-endian two's-complement arrays produced by their own
//! arbitrary-precision types. This crate converts between the two.
//!
//! Encoding shape
//!  - Big-endian, two's-complement, minimal length: a leading `0x00`/`0xFF` byte only
//!    appears when it is needed to carry the sign.
//!  - Rationals are a pair of such arrays (numerator, denominator) and are always
//!    canonicalized on the way in.
//!
//! Example
//! ```
//! use num_bigint::BigInt;
//! use smtnum::{decode_integer, encode_integer};
//!
//! let bytes = encode_integer(&BigInt::from(-256)).unwrap();
//! assert_eq!(bytes, vec![0xFF, 0x00]);
//! assert_eq!(decode_integer(&bytes).unwrap(), BigInt::from(-256));
//! ```

/// Error type shared by every conversion.
pub mod error;
/// Integer codec and in-place two's-complement helpers.
pub mod integer;
/// Rational codec, canonicalization and parsing.
pub mod rational;
/// Sign+magnitude integer representation.
pub mod sign;

pub use error::{NumError, NumResult};
pub use integer::{
    CodecLimits, decode_bignum, decode_bignum_with, decode_integer, decode_integer_with,
    encode_bignum, encode_bignum_with, encode_integer, is_canonical,
};
pub use rational::{
    RationalBytes, canonical_rational, decode_rational, decode_rational_with, encode_rational,
    encode_rational_with, parse_rational, rational_from_decimal,
};
pub use sign::SignMagnitude;

pub extern crate num_bigint;
pub extern crate num_rational;
