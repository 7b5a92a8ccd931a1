//! In-process model: an arena of value nodes plus a term assignment.
//!
//! The [`Model`] is the arena and a [`ValueHandle`] is an index into it. Nodes are
//! appended through a [`ModelBuilder`], which checks every child reference at insertion
//! time, so a built model never contains dangling ids.

use std::collections::BTreeMap;

use log::debug;
use num_bigint::BigInt;
use num_rational::BigRational;
use smallvec::SmallVec;

use crate::{
    config::BindingConfig,
    engine::{Engine, TermSink},
    error::{ModelError, ModelResult},
    kind::{TermId, TypeId, ValueHandle, ValueKind},
    node::{NodeId, ValueNode},
    reader::ValueReader,
};

/// Immutable satisfying assignment: a value table and a term → node map.
///
/// Dropping the model invalidates every handle taken from it.
#[derive(Debug, Clone, Default)]
pub struct Model {
    nodes: Vec<ValueNode>,
    assignments: BTreeMap<TermId, NodeId>,
}

impl Model {
    pub fn builder() -> ModelBuilder {
        ModelBuilder::new()
    }

    /// Number of nodes in the value table.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Terms that have a value, in increasing order.
    pub fn terms(&self) -> impl Iterator<Item = TermId> + '_ {
        self.assignments.keys().copied()
    }

    /// Reader with the default limits.
    pub fn reader(&self) -> ValueReader<'_, Self> {
        ValueReader::new(self)
    }

    pub fn reader_with(&self, config: &BindingConfig) -> ValueReader<'_, Self> {
        ValueReader::with_config(self, config)
    }

    /// Handle for a node id known to be in range.
    fn handle_of(&self, id: NodeId) -> ValueHandle {
        ValueHandle::new(self.nodes[id as usize].kind(), id)
    }

    fn lookup(&self, handle: ValueHandle) -> ModelResult<&ValueNode> {
        self.nodes
            .get(handle.id as usize)
            .filter(|node| node.kind() == handle.kind)
            .ok_or(ModelError::InvalidHandle {
                kind: handle.kind,
                id: handle.id as i64,
            })
    }

    fn fill(&self, ids: &[NodeId], out: &mut [ValueHandle]) -> ModelResult<()> {
        if out.len() < ids.len() {
            return Err(ModelError::BufferTooSmall {
                required: ids.len(),
                provided: out.len(),
            });
        }
        for (slot, &id) in out.iter_mut().zip(ids) {
            *slot = self.handle_of(id);
        }
        Ok(())
    }
}

fn mismatch(expected: ValueKind, node: &ValueNode) -> ModelError {
    ModelError::KindMismatch {
        expected,
        found: node.kind(),
    }
}

impl Engine for Model {
    fn value_of(&self, term: TermId) -> ModelResult<ValueHandle> {
        self.assignments
            .get(&term)
            .map(|&id| self.handle_of(id))
            .ok_or(ModelError::UndefinedValue { term })
    }

    fn check(&self, handle: ValueHandle) -> ModelResult<()> {
        self.lookup(handle).map(|_| ())
    }

    fn get_bool(&self, handle: ValueHandle) -> ModelResult<bool> {
        match self.lookup(handle)? {
            ValueNode::Bool(b) => Ok(*b),
            other => Err(mismatch(ValueKind::Bool, other)),
        }
    }

    fn get_exact(&self, handle: ValueHandle, acc: &mut BigRational) -> ModelResult<()> {
        match self.lookup(handle)? {
            ValueNode::Rational(q) => {
                acc.clone_from(q);
                Ok(())
            }
            other => Err(mismatch(ValueKind::Rational, other)),
        }
    }

    fn bit_size(&self, handle: ValueHandle) -> ModelResult<u32> {
        match self.lookup(handle)? {
            ValueNode::Bitvector(bits) => Ok(bits.len() as u32),
            other => Err(mismatch(ValueKind::Bitvector, other)),
        }
    }

    fn get_bits(&self, handle: ValueHandle, out: &mut [bool]) -> ModelResult<()> {
        match self.lookup(handle)? {
            ValueNode::Bitvector(bits) => {
                let provided = out.len();
                let dst = out.get_mut(..bits.len()).ok_or(ModelError::BufferTooSmall {
                    required: bits.len(),
                    provided,
                })?;
                dst.copy_from_slice(bits);
                Ok(())
            }
            other => Err(mismatch(ValueKind::Bitvector, other)),
        }
    }

    fn get_scalar(&self, handle: ValueHandle) -> ModelResult<(i32, TypeId)> {
        match self.lookup(handle)? {
            ValueNode::Scalar { index, ty } => Ok((*index, *ty)),
            other => Err(mismatch(ValueKind::Scalar, other)),
        }
    }

    fn tuple_arity(&self, handle: ValueHandle) -> ModelResult<u32> {
        match self.lookup(handle)? {
            ValueNode::Tuple(children) => Ok(children.len() as u32),
            other => Err(mismatch(ValueKind::Tuple, other)),
        }
    }

    fn expand_tuple(&self, handle: ValueHandle, out: &mut [ValueHandle]) -> ModelResult<()> {
        match self.lookup(handle)? {
            ValueNode::Tuple(children) => self.fill(children, out),
            other => Err(mismatch(ValueKind::Tuple, other)),
        }
    }

    fn function_arity(&self, handle: ValueHandle) -> ModelResult<u32> {
        match self.lookup(handle)? {
            ValueNode::Function { arity, .. } => Ok(*arity),
            other => Err(mismatch(ValueKind::Function, other)),
        }
    }

    fn function_type(&self, handle: ValueHandle) -> ModelResult<TypeId> {
        match self.lookup(handle)? {
            ValueNode::Function { ty, .. } => Ok(*ty),
            other => Err(mismatch(ValueKind::Function, other)),
        }
    }

    fn function_cardinality(&self, handle: ValueHandle) -> ModelResult<u32> {
        match self.lookup(handle)? {
            ValueNode::Function { mappings, .. } => Ok(mappings.len() as u32),
            other => Err(mismatch(ValueKind::Function, other)),
        }
    }

    fn expand_function(
        &self,
        handle: ValueHandle,
        out: &mut [ValueHandle],
    ) -> ModelResult<ValueHandle> {
        match self.lookup(handle)? {
            ValueNode::Function {
                default, mappings, ..
            } => {
                self.fill(mappings, out)?;
                Ok(self.handle_of(*default))
            }
            other => Err(mismatch(ValueKind::Function, other)),
        }
    }

    fn mapping_arity(&self, handle: ValueHandle) -> ModelResult<u32> {
        match self.lookup(handle)? {
            ValueNode::Mapping { args, .. } => Ok(args.len() as u32),
            other => Err(mismatch(ValueKind::Mapping, other)),
        }
    }

    fn expand_mapping(
        &self,
        handle: ValueHandle,
        out: &mut [ValueHandle],
    ) -> ModelResult<ValueHandle> {
        match self.lookup(handle)? {
            ValueNode::Mapping { args, result } => {
                self.fill(args, out)?;
                Ok(self.handle_of(*result))
            }
            other => Err(mismatch(ValueKind::Mapping, other)),
        }
    }
}

/// Incremental construction of a [`Model`] from explicit values.
///
/// Every `add_*` call appends one node and returns its handle. Children must be
/// handles returned earlier by the same builder.
///
/// ```
/// use smtmodel::{Model, ValueKind};
///
/// let mut b = Model::builder();
/// let x = b.add_integer(7).unwrap();
/// let flag = b.add_bool(true).unwrap();
/// let pair = b.add_tuple(&[x, flag]).unwrap();
/// b.assign(0, pair).unwrap();
///
/// let model = b.build();
/// let reader = model.reader();
/// let root = reader.get_value(0).unwrap();
/// assert_eq!(root.kind, ValueKind::Tuple);
/// let children = reader.expand_tuple(root).unwrap();
/// assert_eq!(reader.decode_int64(children[0]).unwrap(), 7);
/// ```
#[derive(Debug, Default)]
pub struct ModelBuilder {
    nodes: Vec<ValueNode>,
    assignments: BTreeMap<TermId, NodeId>,
    next_term: TermId,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, node: ValueNode) -> ModelResult<ValueHandle> {
        let id = NodeId::try_from(self.nodes.len()).map_err(|_| ModelError::AllocationFailure {
            requested: self.nodes.len() + 1,
        })?;
        if self.nodes.try_reserve(1).is_err() {
            return Err(ModelError::AllocationFailure {
                requested: self.nodes.len() + 1,
            });
        }
        let kind = node.kind();
        self.nodes.push(node);
        Ok(ValueHandle::new(kind, id))
    }

    /// Resolve a handle given by the caller to a node id of this builder.
    fn resolve(&self, handle: ValueHandle) -> ModelResult<NodeId> {
        match self.nodes.get(handle.id as usize) {
            Some(node) if node.kind() == handle.kind => Ok(handle.id),
            _ => Err(ModelError::InvalidHandle {
                kind: handle.kind,
                id: handle.id as i64,
            }),
        }
    }

    fn resolve_all(&self, handles: &[ValueHandle]) -> ModelResult<SmallVec<NodeId, 4>> {
        handles.iter().map(|&h| self.resolve(h)).collect()
    }

    pub fn add_unknown(&mut self) -> ModelResult<ValueHandle> {
        self.push(ValueNode::Unknown)
    }

    pub fn add_bool(&mut self, value: bool) -> ModelResult<ValueHandle> {
        self.push(ValueNode::Bool(value))
    }

    /// The value is canonical by construction of [`BigRational`].
    pub fn add_rational(&mut self, value: BigRational) -> ModelResult<ValueHandle> {
        self.push(ValueNode::Rational(value))
    }

    pub fn add_integer(&mut self, value: impl Into<BigInt>) -> ModelResult<ValueHandle> {
        self.add_rational(BigRational::from_integer(value.into()))
    }

    /// Bits are given least significant first; at least one bit is required.
    pub fn add_bitvector(
        &mut self,
        bits: impl IntoIterator<Item = bool>,
    ) -> ModelResult<ValueHandle> {
        let bits: Vec<bool> = bits.into_iter().collect();
        if bits.is_empty() {
            return Err(ModelError::MalformedValue(
                "bitvector must have at least one bit".to_string(),
            ));
        }
        self.push(ValueNode::Bitvector(bits))
    }

    /// Convenience: the low `width` bits of `value`, least significant first.
    pub fn add_bitvector_u64(&mut self, value: u64, width: u32) -> ModelResult<ValueHandle> {
        self.add_bitvector((0..width).map(|i| i < 64 && (value >> i) & 1 == 1))
    }

    pub fn add_scalar(&mut self, index: i32, ty: TypeId) -> ModelResult<ValueHandle> {
        if index < 0 || ty < 0 {
            return Err(ModelError::MalformedValue(format!(
                "scalar index {index} of type {ty} must be non-negative"
            )));
        }
        self.push(ValueNode::Scalar { index, ty })
    }

    pub fn add_tuple(&mut self, children: &[ValueHandle]) -> ModelResult<ValueHandle> {
        if children.is_empty() {
            return Err(ModelError::MalformedValue(
                "tuple must have at least one component".to_string(),
            ));
        }
        let ids = self.resolve_all(children)?;
        self.push(ValueNode::Tuple(ids))
    }

    pub fn add_mapping(
        &mut self,
        args: &[ValueHandle],
        result: ValueHandle,
    ) -> ModelResult<ValueHandle> {
        if args.is_empty() {
            return Err(ModelError::MalformedValue(
                "mapping must have at least one argument".to_string(),
            ));
        }
        let args = self.resolve_all(args)?;
        let result = self.resolve(result)?;
        self.push(ValueNode::Mapping { args, result })
    }

    /// Add a finite function of type `ty` taking `arity` arguments.
    ///
    /// Every mapping must have exactly `arity` arguments.
    pub fn add_function(
        &mut self,
        ty: TypeId,
        arity: u32,
        default: ValueHandle,
        mappings: &[ValueHandle],
    ) -> ModelResult<ValueHandle> {
        if arity == 0 {
            return Err(ModelError::MalformedValue(
                "function arity must be at least one".to_string(),
            ));
        }
        let default = self.resolve(default)?;

        let mut ids = Vec::new();
        if ids.try_reserve_exact(mappings.len()).is_err() {
            return Err(ModelError::AllocationFailure {
                requested: mappings.len(),
            });
        }
        for &m in mappings {
            let id = self.resolve(m)?;
            match &self.nodes[id as usize] {
                ValueNode::Mapping { args, .. } if args.len() == arity as usize => ids.push(id),
                ValueNode::Mapping { args, .. } => {
                    return Err(ModelError::MalformedValue(format!(
                        "mapping {m} has {} arguments, function arity is {arity}",
                        args.len()
                    )));
                }
                other => {
                    return Err(ModelError::KindMismatch {
                        expected: ValueKind::Mapping,
                        found: other.kind(),
                    });
                }
            }
        }

        self.push(ValueNode::Function {
            ty,
            arity,
            default,
            mappings: ids,
        })
    }

    /// Give `term` the value `value`; a later assignment of the same term wins.
    pub fn assign(&mut self, term: TermId, value: ValueHandle) -> ModelResult<()> {
        if term < 0 {
            return Err(ModelError::InvalidTerm(term));
        }
        let id = self.resolve(value)?;
        self.assignments.insert(term, id);
        self.next_term = self.next_term.max(term.saturating_add(1));
        Ok(())
    }

    /// Build a model from parallel `vars`/`values` arrays.
    pub fn assign_all(&mut self, vars: &[TermId], values: &[ValueHandle]) -> ModelResult<()> {
        if vars.len() != values.len() {
            return Err(ModelError::MalformedValue(format!(
                "{} variables for {} values",
                vars.len(),
                values.len()
            )));
        }
        for (&term, &value) in vars.iter().zip(values) {
            self.assign(term, value)?;
        }
        Ok(())
    }

    pub fn build(self) -> Model {
        debug!(
            "Model built with {} value nodes and {} assigned terms",
            self.nodes.len(),
            self.assignments.len()
        );
        Model {
            nodes: self.nodes,
            assignments: self.assignments,
        }
    }

    fn fresh_constant(&mut self, value: BigRational) -> ModelResult<TermId> {
        let term = self.next_term;
        if term == TermId::MAX {
            return Err(ModelError::InvalidTerm(term));
        }
        let handle = self.add_rational(value)?;
        self.assign(term, handle)?;
        Ok(term)
    }
}

/// Numeric constants become fresh terms whose value is the constant itself.
impl TermSink for ModelBuilder {
    fn mk_integer(&mut self, value: BigInt) -> ModelResult<TermId> {
        self.fresh_constant(BigRational::from_integer(value))
    }

    fn mk_rational(&mut self, value: BigRational) -> ModelResult<TermId> {
        self.fresh_constant(value)
    }
}
