//! Lazy exploration of SMT model values.
//!
//! A satisfying assignment is a table of value nodes. Leaves are booleans,
//! arithmetic values, bitvectors and scalars. Composites are tuples and finite
//! functions, with each function point being a mapping. Callers never receive the
//! whole tree. They get a [`ValueHandle`] per term and ask for one level at a
//! time: a leaf is decoded, a composite is expanded into child handles.
//!
//! Arithmetic leaves travel through [`smtnum`]'s canonical byte codec when exact
//! values are needed.
//!
//! ```
//! use smtmodel::{Expansion, Model, ValueKind};
//!
//! let mut b = Model::builder();
//! let zero = b.add_integer(0).unwrap();
//! let one = b.add_integer(1).unwrap();
//! let point = b.add_mapping(&[one], one).unwrap();
//! let f = b.add_function(3, 1, zero, &[point]).unwrap();
//! b.assign(0, f).unwrap();
//! let model = b.build();
//!
//! let root = model.reader().get_value(0).unwrap();
//! let Expansion::Function(fx) = smtmodel::expand(&model, root).unwrap() else {
//!     unreachable!()
//! };
//! assert_eq!(fx.default, zero);
//! assert_eq!(fx.mappings[0].kind, ValueKind::Mapping);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod kind;
pub mod model;
pub mod node;
pub mod reader;

pub use config::{BindingConfig, CodecConfig, LogConfig, LogLevel, ModelConfig};
pub use engine::{Engine, TermSink, mk_integer_from_bytes, mk_rational_from_bytes};
pub use error::{ModelError, ModelResult};
pub use kind::{TermId, TypeId, ValueHandle, ValueKind, get_kind};
pub use model::{Model, ModelBuilder};
pub use node::{NodeId, ValueNode};
pub use reader::{
    Expansion, FunctionExpansion, LeafRequest, LeafValue, MappingExpansion, ValueReader,
};

pub extern crate smtnum;

/// Decode a leaf of `engine` with default limits.
pub fn decode_leaf<E: Engine + ?Sized>(
    engine: &E,
    handle: ValueHandle,
    request: LeafRequest,
) -> ModelResult<LeafValue> {
    ValueReader::new(engine).decode_leaf(handle, request)
}

/// Expand a composite of `engine` by one level with default limits.
pub fn expand<E: Engine + ?Sized>(engine: &E, handle: ValueHandle) -> ModelResult<Expansion> {
    ValueReader::new(engine).expand(handle)
}
