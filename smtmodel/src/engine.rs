//! Seams toward the solver engine.
//!
//! [`Engine`] is what the value protocol consumes from a model: raw access to nodes
//! addressed by handles. Implementations may assume the caller already checked the
//! handle kind, but must still report a mismatch instead of misbehaving.
//! [`TermSink`] is the (out of scope) term-construction side, used here only to
//! route decoded numeric constants into the engine.

use num_bigint::BigInt;
use num_rational::BigRational;

use crate::{
    error::ModelResult,
    kind::{TermId, TypeId, ValueHandle},
};

/// Operations a model exposes to the value protocol.
pub trait Engine {
    /// Value node of `term`, or [`ModelError::UndefinedValue`](crate::ModelError::UndefinedValue).
    fn value_of(&self, term: TermId) -> ModelResult<ValueHandle>;

    /// Check that `handle` addresses a node of this model with a matching kind.
    fn check(&self, handle: ValueHandle) -> ModelResult<()>;

    fn get_bool(&self, handle: ValueHandle) -> ModelResult<bool>;

    /// Fill a caller-provided accumulator with the exact value of an arithmetic node.
    fn get_exact(&self, handle: ValueHandle, acc: &mut BigRational) -> ModelResult<()>;

    fn bit_size(&self, handle: ValueHandle) -> ModelResult<u32>;

    /// Write `bit_size(handle)` bits into `out`, least significant first.
    fn get_bits(&self, handle: ValueHandle, out: &mut [bool]) -> ModelResult<()>;

    /// Index and type of a scalar node.
    fn get_scalar(&self, handle: ValueHandle) -> ModelResult<(i32, TypeId)>;

    fn tuple_arity(&self, handle: ValueHandle) -> ModelResult<u32>;

    /// Write the `tuple_arity(handle)` children into `out`.
    fn expand_tuple(&self, handle: ValueHandle, out: &mut [ValueHandle]) -> ModelResult<()>;

    fn function_arity(&self, handle: ValueHandle) -> ModelResult<u32>;

    fn function_type(&self, handle: ValueHandle) -> ModelResult<TypeId>;

    /// Number of point mappings of a function node, excluding the default.
    fn function_cardinality(&self, handle: ValueHandle) -> ModelResult<u32>;

    /// Write the `function_cardinality(handle)` mapping handles into `out` and return the default.
    fn expand_function(
        &self,
        handle: ValueHandle,
        out: &mut [ValueHandle],
    ) -> ModelResult<ValueHandle>;

    fn mapping_arity(&self, handle: ValueHandle) -> ModelResult<u32>;

    /// Write the `mapping_arity(handle)` arguments into `out` and return the result.
    fn expand_mapping(
        &self,
        handle: ValueHandle,
        out: &mut [ValueHandle],
    ) -> ModelResult<ValueHandle>;
}

/// Term construction forwarded to the engine.
pub trait TermSink {
    fn mk_integer(&mut self, value: BigInt) -> ModelResult<TermId>;

    /// `value` is always canonical when it reaches the sink.
    fn mk_rational(&mut self, value: BigRational) -> ModelResult<TermId>;
}

/// Decode a canonical integer and hand it to `sink`.
pub fn mk_integer_from_bytes<S: TermSink + ?Sized>(
    sink: &mut S,
    bytes: &[u8],
) -> ModelResult<TermId> {
    let value = smtnum::decode_integer(bytes)?;
    sink.mk_integer(value)
}

/// Decode and canonicalize a rational, then hand it to `sink`.
///
/// A zero denominator fails before the sink is touched.
pub fn mk_rational_from_bytes<S: TermSink + ?Sized>(
    sink: &mut S,
    numerator: &[u8],
    denominator: &[u8],
) -> ModelResult<TermId> {
    let value = smtnum::decode_rational(numerator, denominator)?;
    sink.mk_rational(value)
}

#[cfg(test)]
mod tests {
    use smtnum::NumError;

    use super::*;
    use crate::error::ModelError;

    #[derive(Default)]
    struct CountingSink {
        calls: usize,
        last: Option<BigRational>,
    }

    impl TermSink for CountingSink {
        fn mk_integer(&mut self, value: BigInt) -> ModelResult<TermId> {
            self.mk_rational(BigRational::from_integer(value))
        }

        fn mk_rational(&mut self, value: BigRational) -> ModelResult<TermId> {
            self.calls += 1;
            self.last = Some(value);
            Ok(self.calls as TermId)
        }
    }

    #[test]
    fn zero_denominator_never_reaches_the_sink() {
        let mut sink = CountingSink::default();
        let err = mk_rational_from_bytes(&mut sink, &[0x05], &[0x00]).unwrap_err();
        assert!(matches!(err, ModelError::Num(NumError::ZeroDenominator)));
        assert_eq!(sink.calls, 0);
    }

    #[test]
    fn sink_receives_canonical_values() {
        let mut sink = CountingSink::default();
        mk_rational_from_bytes(&mut sink, &[0x06], &[0xFC]).unwrap();
        let q = sink.last.take().unwrap();
        assert_eq!(q.numer(), &BigInt::from(-3));
        assert_eq!(q.denom(), &BigInt::from(2));

        mk_integer_from_bytes(&mut sink, &[0xFF, 0x00]).unwrap();
        assert_eq!(sink.last.unwrap(), BigRational::from_integer(BigInt::from(-256)));
        assert_eq!(sink.calls, 2);
    }

    #[test]
    fn empty_integer_bytes_are_rejected() {
        let mut sink = CountingSink::default();
        let err = mk_integer_from_bytes(&mut sink, &[]).unwrap_err();
        assert!(matches!(err, ModelError::Num(NumError::EmptyInput)));
        assert_eq!(sink.calls, 0);
    }
}
