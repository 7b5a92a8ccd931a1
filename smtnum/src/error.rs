use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumError {
    #[error("Cannot decode an empty byte array")]
    EmptyInput,

    #[error("Rational denominator is zero")]
    ZeroDenominator,

    #[error("Failed to allocate {requested} bytes for a multi-precision value")]
    AllocationFailure { requested: usize },

    #[error("Sign is zero but the magnitude is not")]
    SignMismatch,

    #[error("Decimal exponent {0} is out of range")]
    ExponentOutOfRange(i64),

    #[error("Failed to parse '{input}' as a rational: {reason}")]
    Parse { input: String, reason: String },
}

pub type NumResult<T> = Result<T, NumError>;
