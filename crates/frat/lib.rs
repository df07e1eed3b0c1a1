//! The FuzzyRat library API (`spec.md` §6.2): load a grammar into a
//! [`Context`], [`Context::compile`] it into a [`Code`], then [`Code::exec`]
//! it repeatedly to produce random sentences.

pub mod error;
pub mod logging;

pub use error::{FratError, FratResult};
pub use frat_vm::{OsRandSource, RandSource, SequenceRandSource};

use frat_core::space::{insert_space, DEFAULT_SPACE_PATTERN};
use frat_core::{desugar, parser, verify};

/// Per-compile knobs, analogous to the teacher's parser configuration
/// object: a start-production override and a space-pattern override.
///
/// `space_pattern`: `None` installs the default whitespace pattern;
/// `Some(String::new())` disables whitespace insertion entirely;
/// `Some(pattern)` installs a custom pattern (an invalid pattern is a
/// compile-time fatal error, `spec.md` §7).
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub start_production: Option<String>,
    pub space_pattern: Option<String>,
}

/// An in-memory grammar source plus the options that will govern its next
/// compile. Analogous to the C API's opaque `Context` handle.
pub struct Context {
    source_name: String,
    source: Vec<u8>,
    options: CompileOptions,
}

impl Context {
    /// Builds a context from an in-memory buffer. Fails on an empty
    /// source (the null-handle case of `new_context` in `spec.md` §6.2).
    pub fn new(source_name: impl Into<String>, source: Vec<u8>) -> FratResult<Context> {
        if source.is_empty() {
            return Err(FratError::EmptySource);
        }
        Ok(Context { source_name: source_name.into(), source, options: CompileOptions::default() })
    }

    /// Reads the grammar source from a file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> FratResult<Context> {
        let path = path.as_ref();
        let source = std::fs::read(path)?;
        let source_name = path.to_string_lossy().into_owned();
        Context::new(source_name, source)
    }

    /// `None` restores the default space pattern; `Some(String::new())`
    /// disables whitespace insertion; any other string is parsed as the
    /// space regex at compile time.
    pub fn set_space_pattern(&mut self, pattern: Option<String>) {
        self.options.space_pattern = pattern;
    }

    /// Overrides the default (first-declared) start symbol.
    pub fn set_start_production(&mut self, name: impl Into<String>) {
        self.options.start_production = Some(name.into());
    }

    /// Formats an error the way `spec.md` §7 requires:
    /// `[error] (<source-name>):<line>: <message>`, the offending line,
    /// and a caret marker beneath it. Returns `None` for errors with no
    /// source location (`UndefinedStart` on an empty grammar, or any
    /// non-grammar error). A [`FratError::SpacePattern`] is built against
    /// the pattern text it came from, not the grammar file, since that's
    /// the buffer its token offsets actually index into.
    pub fn format_diagnostic(&self, err: &FratError) -> Option<String> {
        match err {
            FratError::Grammar(grammar_err) => {
                self.format_against(&self.source_name, &self.source, grammar_err)
            }
            FratError::SpacePattern { pattern, source } => {
                self.format_against("<space-pattern>", pattern.as_bytes(), source)
            }
            FratError::Io(_) | FratError::EmptySource | FratError::Vm(_) => None,
        }
    }

    fn format_against(
        &self,
        source_name: &str,
        buf: &[u8],
        err: &frat_core::FratCoreError,
    ) -> Option<String> {
        let token = err.token()?;
        let lexer = frat_core::Lexer::new(source_name.to_string(), buf);
        let line = lexer.line_number(token);
        let line_tok = lexer.line_token(token);
        let marker = lexer.line_marker(line_tok, token);
        Some(format!(
            "[error] ({source_name}):{line}: {err}\n{}\n{marker}",
            lexer.text_str(line_tok),
        ))
    }

    /// Parses, verifies, inserts spaces, desugars, and compiles the
    /// grammar into a frozen [`Code`].
    pub fn compile(&self) -> FratResult<Code> {
        let mut state = parser::parse_grammar(
            &self.source_name,
            &self.source,
            self.options.start_production.as_deref(),
        )
        .map_err(FratError::Grammar)?;

        verify::verify(&state).map_err(FratError::Grammar)?;

        let pattern: &str = match self.options.space_pattern.as_deref() {
            Some("") => "",
            Some(pattern) => pattern,
            None => DEFAULT_SPACE_PATTERN,
        };
        if !pattern.is_empty() {
            insert_space(&mut state, pattern.as_bytes()).map_err(|source| {
                FratError::SpacePattern { pattern: pattern.to_string(), source }
            })?;
        }

        desugar::desugar(&mut state);

        let unit = frat_vm::compile(&state)?;
        Ok(Code { unit })
    }
}

/// A frozen, compiled grammar, ready to be executed any number of times.
pub struct Code {
    unit: frat_vm::CompiledUnit,
}

impl Code {
    /// Executes the compiled unit once against the default OS-entropy
    /// random source, producing one generated sentence.
    pub fn exec(&self) -> FratResult<Vec<u8>> {
        let mut rand = OsRandSource::new();
        self.exec_with_source(&mut rand)
    }

    /// Executes against an injected [`RandSource`]. Hidden from the CLI;
    /// exists for deterministic tests (`spec.md` §6.2, §8.2).
    pub fn exec_with_source(&self, rand: &mut dyn RandSource) -> FratResult<Vec<u8>> {
        Ok(frat_vm::eval(&self.unit, rand)?)
    }
}
