use smtnum::NumError;
use thiserror::Error;

use crate::kind::{TermId, ValueHandle, ValueKind};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Value tag {0} is outside the known value kinds")]
    InvalidTag(i32),

    #[error("Handle <{kind}: {id}> does not address a live node of this model")]
    InvalidHandle { kind: ValueKind, id: i64 },

    #[error("Operation expects a {expected} value, found {found}")]
    KindMismatch {
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("Value of kind {found} has no children to expand")]
    NotComposite { found: ValueKind },

    #[error("Output buffer holds {provided} entries, {required} are required")]
    BufferTooSmall { required: usize, provided: usize },

    #[error("Term {term} has no value in this model")]
    UndefinedValue { term: TermId },

    #[error("Value {handle} cannot be represented as {target}")]
    NotRepresentable {
        handle: ValueHandle,
        target: &'static str,
    },

    #[error("Failed to allocate room for {requested} elements")]
    AllocationFailure { requested: usize },

    #[error("Term id {0} is not a valid term")]
    InvalidTerm(TermId),

    #[error("Malformed value: {0}")]
    MalformedValue(String),

    #[error("Numeric conversion failed: {0}")]
    Num(#[source] NumError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration file '{file}': {source}")]
    ConfigParse {
        source: toml::de::Error,
        file: String,
    },
}

impl From<NumError> for ModelError {
    fn from(value: NumError) -> Self {
        match value {
            NumError::AllocationFailure { requested } => {
                ModelError::AllocationFailure { requested }
            }
            other => ModelError::Num(other),
        }
    }
}

pub type ModelResult<T> = Result<T, ModelError>;

/// Allocate a vector of `len` copies of `fill`, reporting failure instead of aborting.
pub(crate) fn try_filled<T: Clone>(len: usize, fill: T) -> ModelResult<Vec<T>> {
    let mut buf = Vec::new();
    if buf.try_reserve_exact(len).is_err() {
        log::warn!("Allocation of {len} elements refused");
        return Err(ModelError::AllocationFailure { requested: len });
    }
    buf.resize(len, fill);
    Ok(buf)
}
