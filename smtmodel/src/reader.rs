//! Lazy decoding protocol over model values.
//!
//! A [`ValueReader`] wraps any [`Engine`] and adds the checks the raw engine calls
//! leave to their caller:
//! - the handle kind is compared with the operation before the engine is called;
//! - the engine is asked for arities and cardinalities before any output is sized;
//! - output allocations are fallible and bounded by the configured limits;
//! - caller-provided buffers are written only once the whole operation succeeded.
//!
//! Every expansion goes exactly one level down. Callers decide how deep to go.

use log::{debug, trace};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{ToPrimitive, Zero};
use smallvec::SmallVec;
use smtnum::{CodecLimits, RationalBytes};

use crate::{
    config::BindingConfig,
    engine::Engine,
    error::{ModelError, ModelResult, try_filled},
    kind::{TermId, TypeId, ValueHandle, ValueKind},
};

/// Leaf decoding requested through [`ValueReader::decode_leaf`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafRequest {
    Bool,
    Int64,
    Double,
    Rational64,
    /// Numerator and denominator as canonical bytes.
    Exact,
    /// Canonical bytes of an integral value.
    IntegerBytes,
    Bits,
    Scalar,
}

impl LeafRequest {
    /// Kind a handle must have for this request.
    pub const fn required_kind(self) -> ValueKind {
        match self {
            LeafRequest::Bool => ValueKind::Bool,
            LeafRequest::Int64
            | LeafRequest::Double
            | LeafRequest::Rational64
            | LeafRequest::Exact
            | LeafRequest::IntegerBytes => ValueKind::Rational,
            LeafRequest::Bits => ValueKind::Bitvector,
            LeafRequest::Scalar => ValueKind::Scalar,
        }
    }
}

/// Result of [`ValueReader::decode_leaf`].
#[derive(Debug, Clone, PartialEq)]
pub enum LeafValue {
    Bool(bool),
    Int64(i64),
    Double(f64),
    Rational64 { numerator: i64, denominator: i64 },
    Exact(RationalBytes),
    IntegerBytes(Vec<u8>),
    Bits(Vec<bool>),
    Scalar { index: i32, ty: TypeId },
}

/// Default value plus point overrides of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionExpansion {
    pub default: ValueHandle,
    /// Handles of kind [`ValueKind::Mapping`], one per override.
    pub mappings: Vec<ValueHandle>,
}

/// Arguments and result of a single function point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingExpansion {
    pub args: SmallVec<ValueHandle, 4>,
    pub result: ValueHandle,
}

/// One-level expansion of a composite value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    Tuple(SmallVec<ValueHandle, 4>),
    Function(FunctionExpansion),
    Mapping(MappingExpansion),
}

/// Protocol entry point, borrowing the engine it reads from.
pub struct ValueReader<'e, E: Engine + ?Sized> {
    engine: &'e E,
    limits: CodecLimits,
    max_expansion_len: usize,
}

impl<E: Engine + ?Sized> Clone for ValueReader<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: Engine + ?Sized> Copy for ValueReader<'_, E> {}

impl<E: Engine + ?Sized> std::fmt::Debug for ValueReader<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueReader")
            .field("limits", &self.limits)
            .field("max_expansion_len", &self.max_expansion_len)
            .finish_non_exhaustive()
    }
}

impl<'e, E: Engine + ?Sized> ValueReader<'e, E> {
    pub fn new(engine: &'e E) -> Self {
        Self::with_config(engine, &BindingConfig::default())
    }

    pub fn with_config(engine: &'e E, config: &BindingConfig) -> Self {
        Self {
            engine,
            limits: config.codec_limits(),
            max_expansion_len: config.model.max_expansion_len,
        }
    }

    pub fn engine(&self) -> &'e E {
        self.engine
    }

    /// Kind precondition, then liveness of the handle.
    fn require(&self, handle: ValueHandle, kind: ValueKind) -> ModelResult<()> {
        if handle.kind != kind {
            return Err(ModelError::KindMismatch {
                expected: kind,
                found: handle.kind,
            });
        }
        self.engine.check(handle)
    }

    fn alloc_handles(&self, len: usize) -> ModelResult<Vec<ValueHandle>> {
        if len > self.max_expansion_len {
            return Err(ModelError::AllocationFailure { requested: len });
        }
        try_filled(len, ValueHandle::PLACEHOLDER)
    }

    fn exact(&self, handle: ValueHandle) -> ModelResult<BigRational> {
        self.require(handle, ValueKind::Rational)?;
        let mut acc = BigRational::zero();
        self.engine.get_exact(handle, &mut acc)?;
        Ok(acc)
    }

    fn integral(&self, handle: ValueHandle) -> ModelResult<BigInt> {
        let q = self.exact(handle)?;
        if !q.is_integer() {
            return Err(ModelError::NotRepresentable {
                handle,
                target: "an integer",
            });
        }
        Ok(q.to_integer())
    }

    // ----- term level -----

    /// Value node of `term`; a negative term id has no value.
    pub fn get_value(&self, term: TermId) -> ModelResult<ValueHandle> {
        if term < 0 {
            return Err(ModelError::UndefinedValue { term });
        }
        self.engine.value_of(term)
    }

    /// Value of `term`, treating an [`ValueKind::Unknown`] node as undefined.
    fn defined_value(&self, term: TermId) -> ModelResult<ValueHandle> {
        let handle = self.get_value(term)?;
        if handle.kind == ValueKind::Unknown {
            return Err(ModelError::UndefinedValue { term });
        }
        Ok(handle)
    }

    pub fn bool_value(&self, term: TermId) -> ModelResult<bool> {
        self.decode_bool(self.defined_value(term)?)
    }

    pub fn int64_value(&self, term: TermId) -> ModelResult<i64> {
        self.decode_int64(self.defined_value(term)?)
    }

    pub fn double_value(&self, term: TermId) -> ModelResult<f64> {
        self.decode_double(self.defined_value(term)?)
    }

    pub fn rational64_value(&self, term: TermId) -> ModelResult<(i64, i64)> {
        self.decode_rational64(self.defined_value(term)?)
    }

    pub fn big_integer_value(&self, term: TermId) -> ModelResult<BigInt> {
        self.decode_big_integer(self.defined_value(term)?)
    }

    pub fn big_rational_value(&self, term: TermId) -> ModelResult<BigRational> {
        self.decode_big_rational(self.defined_value(term)?)
    }

    pub fn bits_value(&self, term: TermId) -> ModelResult<Vec<bool>> {
        self.decode_bits(self.defined_value(term)?)
    }

    pub fn scalar_value(&self, term: TermId) -> ModelResult<(i32, TypeId)> {
        self.decode_scalar(self.defined_value(term)?)
    }

    // ----- leaves -----

    pub fn decode_bool(&self, handle: ValueHandle) -> ModelResult<bool> {
        self.require(handle, ValueKind::Bool)?;
        let value = self.engine.get_bool(handle)?;
        trace!("{handle} decoded as bool {value}");
        Ok(value)
    }

    pub fn is_integer(&self, handle: ValueHandle) -> ModelResult<bool> {
        Ok(self.exact(handle)?.is_integer())
    }

    pub fn is_int32(&self, handle: ValueHandle) -> ModelResult<bool> {
        let q = self.exact(handle)?;
        Ok(q.is_integer() && q.numer().to_i32().is_some())
    }

    pub fn is_int64(&self, handle: ValueHandle) -> ModelResult<bool> {
        let q = self.exact(handle)?;
        Ok(q.is_integer() && q.numer().to_i64().is_some())
    }

    pub fn decode_int64(&self, handle: ValueHandle) -> ModelResult<i64> {
        let value = self
            .integral(handle)?
            .to_i64()
            .ok_or(ModelError::NotRepresentable {
                handle,
                target: "a 64-bit integer",
            })?;
        trace!("{handle} decoded as int64 {value}");
        Ok(value)
    }

    pub fn decode_double(&self, handle: ValueHandle) -> ModelResult<f64> {
        let q = self.exact(handle)?;
        q.to_f64().ok_or(ModelError::NotRepresentable {
            handle,
            target: "a double",
        })
    }

    /// Numerator and (positive) denominator, both fitting in 64 bits.
    pub fn decode_rational64(&self, handle: ValueHandle) -> ModelResult<(i64, i64)> {
        let q = self.exact(handle)?;
        match (q.numer().to_i64(), q.denom().to_i64()) {
            (Some(num), Some(den)) => Ok((num, den)),
            _ => Err(ModelError::NotRepresentable {
                handle,
                target: "a 64-bit rational",
            }),
        }
    }

    pub fn decode_big_rational(&self, handle: ValueHandle) -> ModelResult<BigRational> {
        self.exact(handle)
    }

    pub fn decode_big_integer(&self, handle: ValueHandle) -> ModelResult<BigInt> {
        self.integral(handle)
    }

    /// Exact value as canonical numerator/denominator bytes.
    pub fn decode_exact(&self, handle: ValueHandle) -> ModelResult<RationalBytes> {
        let q = self.exact(handle)?;
        Ok(smtnum::encode_rational_with(&q, &self.limits)?)
    }

    /// Canonical bytes of an integral value.
    pub fn decode_integer_bytes(&self, handle: ValueHandle) -> ModelResult<Vec<u8>> {
        let n = self.integral(handle)?;
        Ok(smtnum::encode_bignum_with(n.sign(), n.magnitude(), &self.limits)?)
    }

    pub fn bit_size(&self, handle: ValueHandle) -> ModelResult<u32> {
        self.require(handle, ValueKind::Bitvector)?;
        self.engine.bit_size(handle)
    }

    /// Bits of a bitvector, least significant first.
    pub fn decode_bits(&self, handle: ValueHandle) -> ModelResult<Vec<bool>> {
        let size = self.bit_size(handle)? as usize;
        let mut bits = try_filled(size, false)?;
        self.engine.get_bits(handle, &mut bits)?;
        Ok(bits)
    }

    /// Write the bits into `out` and return how many were written.
    pub fn decode_bits_into(&self, handle: ValueHandle, out: &mut [bool]) -> ModelResult<usize> {
        let size = self.bit_size(handle)? as usize;
        if out.len() < size {
            return Err(ModelError::BufferTooSmall {
                required: size,
                provided: out.len(),
            });
        }
        let bits = self.decode_bits(handle)?;
        out[..size].copy_from_slice(&bits);
        Ok(size)
    }

    /// Index of the element and its type.
    pub fn decode_scalar(&self, handle: ValueHandle) -> ModelResult<(i32, TypeId)> {
        self.require(handle, ValueKind::Scalar)?;
        self.engine.get_scalar(handle)
    }

    /// Single entry point over every leaf decoder.
    pub fn decode_leaf(&self, handle: ValueHandle, request: LeafRequest) -> ModelResult<LeafValue> {
        let expected = request.required_kind();
        if handle.kind != expected {
            return Err(ModelError::KindMismatch {
                expected,
                found: handle.kind,
            });
        }
        Ok(match request {
            LeafRequest::Bool => LeafValue::Bool(self.decode_bool(handle)?),
            LeafRequest::Int64 => LeafValue::Int64(self.decode_int64(handle)?),
            LeafRequest::Double => LeafValue::Double(self.decode_double(handle)?),
            LeafRequest::Rational64 => {
                let (numerator, denominator) = self.decode_rational64(handle)?;
                LeafValue::Rational64 {
                    numerator,
                    denominator,
                }
            }
            LeafRequest::Exact => LeafValue::Exact(self.decode_exact(handle)?),
            LeafRequest::IntegerBytes => {
                LeafValue::IntegerBytes(self.decode_integer_bytes(handle)?)
            }
            LeafRequest::Bits => LeafValue::Bits(self.decode_bits(handle)?),
            LeafRequest::Scalar => {
                let (index, ty) = self.decode_scalar(handle)?;
                LeafValue::Scalar { index, ty }
            }
        })
    }

    // ----- composites -----

    pub fn tuple_arity(&self, handle: ValueHandle) -> ModelResult<u32> {
        self.require(handle, ValueKind::Tuple)?;
        self.engine.tuple_arity(handle)
    }

    pub fn function_arity(&self, handle: ValueHandle) -> ModelResult<u32> {
        self.require(handle, ValueKind::Function)?;
        self.engine.function_arity(handle)
    }

    pub fn function_type(&self, handle: ValueHandle) -> ModelResult<TypeId> {
        self.require(handle, ValueKind::Function)?;
        self.engine.function_type(handle)
    }

    pub fn function_cardinality(&self, handle: ValueHandle) -> ModelResult<u32> {
        self.require(handle, ValueKind::Function)?;
        self.engine.function_cardinality(handle)
    }

    pub fn mapping_arity(&self, handle: ValueHandle) -> ModelResult<u32> {
        self.require(handle, ValueKind::Mapping)?;
        self.engine.mapping_arity(handle)
    }

    pub fn expand_tuple(&self, handle: ValueHandle) -> ModelResult<SmallVec<ValueHandle, 4>> {
        let arity = self.tuple_arity(handle)? as usize;
        let mut children = self.alloc_handles(arity)?;
        self.engine.expand_tuple(handle, &mut children)?;
        debug!("{handle} expanded into {arity} components");
        Ok(SmallVec::from_vec(children))
    }

    /// Components of a tuple written into `out`; returns the arity.
    pub fn expand_tuple_into(
        &self,
        handle: ValueHandle,
        out: &mut [ValueHandle],
    ) -> ModelResult<usize> {
        let arity = self.tuple_arity(handle)? as usize;
        if out.len() < arity {
            return Err(ModelError::BufferTooSmall {
                required: arity,
                provided: out.len(),
            });
        }
        let children = self.expand_tuple(handle)?;
        out[..arity].copy_from_slice(&children);
        Ok(arity)
    }

    pub fn expand_function(&self, handle: ValueHandle) -> ModelResult<FunctionExpansion> {
        let cardinality = self.function_cardinality(handle)? as usize;
        let mut mappings = self.alloc_handles(cardinality)?;
        let default = self.engine.expand_function(handle, &mut mappings)?;
        debug!("{handle} expanded into {cardinality} mappings plus default {default}");
        Ok(FunctionExpansion { default, mappings })
    }

    /// Mappings written into `out`; returns the default and the cardinality.
    pub fn expand_function_into(
        &self,
        handle: ValueHandle,
        out: &mut [ValueHandle],
    ) -> ModelResult<(ValueHandle, usize)> {
        let cardinality = self.function_cardinality(handle)? as usize;
        if out.len() < cardinality {
            return Err(ModelError::BufferTooSmall {
                required: cardinality,
                provided: out.len(),
            });
        }
        let expansion = self.expand_function(handle)?;
        out[..cardinality].copy_from_slice(&expansion.mappings);
        Ok((expansion.default, cardinality))
    }

    pub fn expand_mapping(&self, handle: ValueHandle) -> ModelResult<MappingExpansion> {
        let arity = self.mapping_arity(handle)? as usize;
        let mut args = self.alloc_handles(arity)?;
        let result = self.engine.expand_mapping(handle, &mut args)?;
        Ok(MappingExpansion {
            args: SmallVec::from_vec(args),
            result,
        })
    }

    /// Arguments written into `out`; returns the result and the arity.
    pub fn expand_mapping_into(
        &self,
        handle: ValueHandle,
        out: &mut [ValueHandle],
    ) -> ModelResult<(ValueHandle, usize)> {
        let arity = self.mapping_arity(handle)? as usize;
        if out.len() < arity {
            return Err(ModelError::BufferTooSmall {
                required: arity,
                provided: out.len(),
            });
        }
        let expansion = self.expand_mapping(handle)?;
        out[..arity].copy_from_slice(&expansion.args);
        Ok((expansion.result, arity))
    }

    /// One-level expansion of any composite; leaves yield [`ModelError::NotComposite`].
    pub fn expand(&self, handle: ValueHandle) -> ModelResult<Expansion> {
        match handle.kind {
            ValueKind::Tuple => self.expand_tuple(handle).map(Expansion::Tuple),
            ValueKind::Function => self.expand_function(handle).map(Expansion::Function),
            ValueKind::Mapping => self.expand_mapping(handle).map(Expansion::Mapping),
            ValueKind::Unknown
            | ValueKind::Bool
            | ValueKind::Rational
            | ValueKind::Bitvector
            | ValueKind::Scalar => Err(ModelError::NotComposite { found: handle.kind }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;

    fn sample() -> (Model, ValueHandle, ValueHandle, ValueHandle) {
        let mut b = Model::builder();
        let half = b.add_rational(BigRational::new(1.into(), 2.into())).unwrap();
        let big = b.add_integer(BigInt::from(1u64) << 70).unwrap();
        let neg = b.add_integer(-5).unwrap();
        (b.build(), half, big, neg)
    }

    #[test]
    fn arithmetic_leaves() {
        let (model, half, big, neg) = sample();
        let r = model.reader();

        assert_eq!(r.decode_double(half).unwrap(), 0.5);
        assert_eq!(r.decode_rational64(half).unwrap(), (1, 2));
        assert!(!r.is_integer(half).unwrap());
        assert!(matches!(
            r.decode_int64(half),
            Err(ModelError::NotRepresentable { .. })
        ));

        assert!(r.is_integer(big).unwrap());
        assert!(!r.is_int64(big).unwrap());
        assert!(matches!(
            r.decode_int64(big),
            Err(ModelError::NotRepresentable { .. })
        ));
        let bytes = r.decode_integer_bytes(big).unwrap();
        assert_eq!(bytes.len(), 9);
        assert_eq!(bytes[0], 0x40);

        assert_eq!(r.decode_int64(neg).unwrap(), -5);
        assert!(r.is_int32(neg).unwrap());
        assert_eq!(r.decode_integer_bytes(neg).unwrap(), vec![0xFB]);
        let exact = r.decode_exact(neg).unwrap();
        assert_eq!(exact.numerator, vec![0xFB]);
        assert_eq!(exact.denominator, vec![0x01]);
    }

    #[test]
    fn codec_limits_apply_to_exact_bytes() {
        let (model, _, big, _) = sample();
        let mut config = BindingConfig::default();
        config.codec.max_encoded_len = 4;
        let r = model.reader_with(&config);
        assert!(matches!(
            r.decode_integer_bytes(big),
            Err(ModelError::AllocationFailure { requested: 10 })
        ));
    }

    #[test]
    fn expansion_limit_is_an_allocation_failure() {
        let mut b = Model::builder();
        let t = b.add_bool(true).unwrap();
        let tuple = b.add_tuple(&[t, t, t]).unwrap();
        let model = b.build();

        let mut config = BindingConfig::default();
        config.model.max_expansion_len = 2;
        let r = model.reader_with(&config);
        assert!(matches!(
            r.expand_tuple(tuple),
            Err(ModelError::AllocationFailure { requested: 3 })
        ));
    }

    #[test]
    fn expanding_a_leaf_names_its_kind() {
        let (model, half, _, _) = sample();
        let err = model.reader().expand(half).unwrap_err();
        assert!(matches!(
            err,
            ModelError::NotComposite {
                found: ValueKind::Rational
            }
        ));
        assert_eq!(err.to_string(), "Value of kind Rational has no children to expand");
    }

    #[test]
    fn leaf_request_checks_kind_first() {
        let (model, half, _, _) = sample();
        let r = model.reader();
        assert!(matches!(
            r.decode_leaf(half, LeafRequest::Bool),
            Err(ModelError::KindMismatch {
                expected: ValueKind::Bool,
                found: ValueKind::Rational
            })
        ));
        assert_eq!(
            r.decode_leaf(half, LeafRequest::Rational64).unwrap(),
            LeafValue::Rational64 {
                numerator: 1,
                denominator: 2
            }
        );
    }
}
