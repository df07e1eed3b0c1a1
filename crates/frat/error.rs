//! The library's single error type, spanning the whole pipeline from file
//! I/O through grammar compilation to evaluation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FratError {
    #[error("could not read grammar source: {0}")]
    Io(#[from] std::io::Error),

    #[error("empty grammar source")]
    EmptySource,

    #[error(transparent)]
    Grammar(frat_core::FratCoreError),

    /// A grammar-level error raised while parsing a `--space` pattern
    /// rather than the grammar file itself; `pattern` is the exact text
    /// that was being parsed, so the diagnostic can be built against it
    /// instead of the grammar source (`spec.md` §6.2, §7).
    #[error("invalid space pattern {pattern:?}: {source}")]
    SpacePattern { pattern: String, source: frat_core::FratCoreError },

    #[error(transparent)]
    Vm(#[from] frat_vm::VmError),
}

pub type FratResult<T> = Result<T, FratError>;
