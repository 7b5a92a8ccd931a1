use num_rational::BigRational;
use smallvec::SmallVec;

use crate::kind::{TypeId, ValueKind};

/// Index of a node inside a model's value table.
pub type NodeId = u32;

/// One entry of a model's value table.
///
/// Composite nodes only store the ids of their children; the child kinds are
/// looked up from the table when handles are produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueNode {
    /// A value the engine could not represent.
    Unknown,
    Bool(bool),
    /// Any arithmetic value, integral or not, kept canonical.
    Rational(BigRational),
    /// Bits of a bitvector, least significant first.
    Bitvector(Vec<bool>),
    /// Element `index` of the scalar or uninterpreted type `ty`.
    Scalar { index: i32, ty: TypeId },
    Tuple(SmallVec<NodeId, 4>),
    /// Finite function: `mappings` override `default` at specific points.
    Function {
        ty: TypeId,
        arity: u32,
        default: NodeId,
        mappings: Vec<NodeId>,
    },
    /// One point of a function: `args` maps to `result`.
    Mapping {
        args: SmallVec<NodeId, 4>,
        result: NodeId,
    },
}

impl ValueNode {
    pub fn kind(&self) -> ValueKind {
        match self {
            ValueNode::Unknown => ValueKind::Unknown,
            ValueNode::Bool(_) => ValueKind::Bool,
            ValueNode::Rational(_) => ValueKind::Rational,
            ValueNode::Bitvector(_) => ValueKind::Bitvector,
            ValueNode::Scalar { .. } => ValueKind::Scalar,
            ValueNode::Tuple(_) => ValueKind::Tuple,
            ValueNode::Function { .. } => ValueKind::Function,
            ValueNode::Mapping { .. } => ValueKind::Mapping,
        }
    }
}
