//! Opcode compilation and the random-walk evaluator for FuzzyRat grammars.
//!
//! [`compiler::compile`] turns a verified, desugared [`frat_core::GrammarState`]
//! into a frozen [`opcode::CompiledUnit`]; [`eval::eval`] walks it against a
//! [`rand_source::RandSource`] to produce one generated sentence.

pub mod asciimap;
pub mod compiler;
pub mod eval;
pub mod opcode;
pub mod rand_source;

pub use asciimap::AsciiMap;
pub use compiler::compile;
pub use eval::{eval, VmError, VmResult};
pub use opcode::{CompiledUnit, OpAddr, Opcode};
pub use rand_source::{OsRandSource, RandSource, SequenceRandSource};
