use thiserror::Error;

/// Input errors detected before any process is launched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid range spec '{spec}': {reason}")]
    InvalidRange { spec: String, reason: String },
    #[error("too many modifier ranges: {given} (at most {max} placeholders %0-%9)")]
    TooManyRanges { given: usize, max: usize },
    #[error("variant count overflows the address space")]
    TooManyVariants,
}
