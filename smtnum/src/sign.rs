use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{NumError, NumResult};

/// Engine-native form of a multi-precision integer: a sign and an unsigned
/// magnitude, kept separate the way GMP-style libraries store them.
///
/// Zero always carries [`Sign::NoSign`] and a non-zero magnitude never does.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SignMagnitude {
    sign: Sign,
    magnitude: BigUint,
}

impl SignMagnitude {
    /// Build from an explicit sign and magnitude.
    ///
    /// A negative or positive sign paired with a zero magnitude collapses to
    /// zero. A zero sign paired with a non-zero magnitude is rejected.
    pub fn new(sign: Sign, magnitude: BigUint) -> NumResult<Self> {
        if magnitude.is_zero() {
            return Ok(Self::zero());
        }
        if sign == Sign::NoSign {
            return Err(NumError::SignMismatch);
        }
        Ok(Self { sign, magnitude })
    }

    /// Build from a C-style signum (`-1`, `0` or `1`; any negative or positive
    /// value is accepted as such).
    pub fn from_signum(signum: i32, magnitude: BigUint) -> NumResult<Self> {
        let sign = match signum.signum() {
            -1 => Sign::Minus,
            0 => Sign::NoSign,
            _ => Sign::Plus,
        };
        Self::new(sign, magnitude)
    }

    pub fn zero() -> Self {
        Self {
            sign: Sign::NoSign,
            magnitude: BigUint::zero(),
        }
    }

    #[inline]
    pub fn sign(&self) -> Sign {
        self.sign
    }

    #[inline]
    pub fn magnitude(&self) -> &BigUint {
        &self.magnitude
    }

    /// Sign as `-1`, `0` or `1`.
    pub fn signum(&self) -> i32 {
        match self.sign {
            Sign::Minus => -1,
            Sign::NoSign => 0,
            Sign::Plus => 1,
        }
    }

    pub fn into_parts(self) -> (Sign, BigUint) {
        (self.sign, self.magnitude)
    }
}

impl From<BigInt> for SignMagnitude {
    fn from(value: BigInt) -> Self {
        let (sign, magnitude) = value.into_parts();
        Self { sign, magnitude }
    }
}

impl From<SignMagnitude> for BigInt {
    fn from(value: SignMagnitude) -> Self {
        BigInt::from_biguint(value.sign, value.magnitude)
    }
}

impl std::fmt::Display for SignMagnitude {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.sign == Sign::Minus {
            write!(f, "-")?;
        }
        write!(f, "{}", self.magnitude)
    }
}
