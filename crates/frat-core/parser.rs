//! Predictive recursive-descent parser, single-token lookahead.
//!
//! Two mutually exclusive sub-grammars are selected by the first character
//! of a production's name (`spec.md` §4.2): **lexical** productions (name
//! starts with `_` or uppercase) use the regex-style sub-grammar;
//! **syntactic** productions (name starts with lowercase) use the
//! production-level sub-grammar. `NTERM` and `.`/`CHARSET` are each
//! admissible in exactly one sub-grammar, which keeps the two disjoint.

use crate::ast::{Node, NodeRef};
use crate::error::{FratCoreError, ParseErrorKind};
use crate::grammar::GrammarState;
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};
use crate::FratCoreResult;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    cur: Token,
}

impl<'a> Parser<'a> {
    pub fn new(mut lexer: Lexer<'a>) -> Self {
        let cur = lexer.next();
        Parser { lexer, cur }
    }

    pub fn lexer(&self) -> &Lexer<'a> {
        &self.lexer
    }

    fn bump(&mut self) -> Token {
        let tok = self.cur;
        self.cur = self.lexer.next();
        tok
    }

    fn text(&self, tok: Token) -> &'a str {
        self.lexer.text_str(tok)
    }

    fn mismatched(&self, expected: &[TokenKind]) -> FratCoreError {
        FratCoreError::Parse {
            kind: ParseErrorKind::MismatchedToken,
            token: self.cur,
            found: self.cur.kind,
            expected: expected.to_vec(),
        }
    }

    fn no_viable_alternative(&self, expected: &[TokenKind]) -> FratCoreError {
        FratCoreError::Parse {
            kind: ParseErrorKind::NoViableAlternative,
            token: self.cur,
            found: self.cur.kind,
            expected: expected.to_vec(),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> FratCoreResult<Token> {
        if self.cur.kind == kind {
            Ok(self.bump())
        } else if self.cur.kind == TokenKind::Invalid {
            Err(FratCoreError::InvalidToken { token: self.cur })
        } else {
            Err(self.mismatched(&[kind]))
        }
    }

    /// Parses exactly one production: `terminalProd | nonTerminalProd`.
    pub fn parse_production(&mut self) -> FratCoreResult<(Token, NodeRef)> {
        match self.cur.kind {
            TokenKind::Term => self.parse_terminal_production(),
            TokenKind::NTerm => self.parse_non_terminal_production(),
            _ => Err(self.no_viable_alternative(&[TokenKind::Term, TokenKind::NTerm])),
        }
    }

    fn parse_terminal_production(&mut self) -> FratCoreResult<(Token, NodeRef)> {
        let name = self.expect(TokenKind::Term)?;
        self.expect(TokenKind::Def)?;
        let body = self.parse_regex_alt()?;
        self.expect(TokenKind::SemiColon)?;
        Ok((name, body))
    }

    fn parse_non_terminal_production(&mut self) -> FratCoreResult<(Token, NodeRef)> {
        let name = self.expect(TokenKind::NTerm)?;
        self.expect(TokenKind::Def)?;
        let body = self.parse_alternative()?;
        self.expect(TokenKind::SemiColon)?;
        Ok((name, body))
    }

    // ---- production-level (syntactic) sub-grammar ----

    fn parse_alternative(&mut self) -> FratCoreResult<NodeRef> {
        let left = self.parse_sequence()?;
        if self.cur.kind == TokenKind::Alt {
            self.bump();
            let right = self.parse_alternative()?;
            Ok(Node::alternative(left, right))
        } else {
            Ok(left)
        }
    }

    fn at_primary_first(&self) -> bool {
        matches!(
            self.cur.kind,
            TokenKind::POpen | TokenKind::Term | TokenKind::NTerm | TokenKind::String
        )
    }

    fn parse_sequence(&mut self) -> FratCoreResult<NodeRef> {
        let left = self.parse_suffix()?;
        if self.at_primary_first() {
            let right = self.parse_sequence()?;
            Ok(Node::sequence(left, right))
        } else {
            Ok(left)
        }
    }

    fn parse_suffix(&mut self) -> FratCoreResult<NodeRef> {
        let mut node = self.parse_primary()?;
        loop {
            node = match self.cur.kind {
                TokenKind::Zero => {
                    let tok = self.bump();
                    std::rc::Rc::new(Node::ZeroOrMore { token: tok, child: node })
                }
                TokenKind::One => {
                    let tok = self.bump();
                    std::rc::Rc::new(Node::OneOrMore { token: tok, child: node })
                }
                TokenKind::Opt => {
                    let tok = self.bump();
                    std::rc::Rc::new(Node::Option { token: tok, child: node })
                }
                _ => break,
            };
        }
        Ok(node)
    }

    fn parse_primary(&mut self) -> FratCoreResult<NodeRef> {
        match self.cur.kind {
            TokenKind::POpen => {
                self.bump();
                let node = self.parse_alternative()?;
                self.expect(TokenKind::PClose)?;
                Ok(node)
            }
            TokenKind::Term => {
                let tok = self.bump();
                Ok(Node::non_terminal(tok, self.text(tok)))
            }
            TokenKind::NTerm => {
                let tok = self.bump();
                Ok(Node::non_terminal(tok, self.text(tok)))
            }
            TokenKind::String => {
                let tok = self.bump();
                Ok(std::rc::Rc::new(Node::String { token: tok, raw: self.text(tok).to_string() }))
            }
            TokenKind::Invalid => Err(FratCoreError::InvalidToken { token: self.cur }),
            _ => Err(self.no_viable_alternative(&[
                TokenKind::POpen,
                TokenKind::Term,
                TokenKind::NTerm,
                TokenKind::String,
            ])),
        }
    }

    // ---- regex-style (lexical) sub-grammar ----

    fn parse_regex_alt(&mut self) -> FratCoreResult<NodeRef> {
        let left = self.parse_regex_seq()?;
        if self.cur.kind == TokenKind::Alt {
            self.bump();
            let right = self.parse_regex_alt()?;
            Ok(Node::alternative(left, right))
        } else {
            Ok(left)
        }
    }

    fn at_regex_primary_first(&self) -> bool {
        matches!(
            self.cur.kind,
            TokenKind::POpen | TokenKind::Term | TokenKind::Dot | TokenKind::CharSet | TokenKind::String
        )
    }

    fn parse_regex_seq(&mut self) -> FratCoreResult<NodeRef> {
        let left = self.parse_regex_suffix()?;
        if self.at_regex_primary_first() {
            let right = self.parse_regex_seq()?;
            Ok(Node::sequence(left, right))
        } else {
            Ok(left)
        }
    }

    fn parse_regex_suffix(&mut self) -> FratCoreResult<NodeRef> {
        let mut node = self.parse_regex_primary()?;
        loop {
            node = match self.cur.kind {
                TokenKind::Zero => {
                    let tok = self.bump();
                    std::rc::Rc::new(Node::ZeroOrMore { token: tok, child: node })
                }
                TokenKind::One => {
                    let tok = self.bump();
                    std::rc::Rc::new(Node::OneOrMore { token: tok, child: node })
                }
                TokenKind::Opt => {
                    let tok = self.bump();
                    std::rc::Rc::new(Node::Option { token: tok, child: node })
                }
                _ => break,
            };
        }
        Ok(node)
    }

    fn parse_regex_primary(&mut self) -> FratCoreResult<NodeRef> {
        match self.cur.kind {
            TokenKind::POpen => {
                self.bump();
                let node = self.parse_regex_alt()?;
                self.expect(TokenKind::PClose)?;
                Ok(node)
            }
            TokenKind::Term => {
                let tok = self.bump();
                Ok(Node::non_terminal(tok, self.text(tok)))
            }
            TokenKind::Dot => {
                let tok = self.bump();
                Ok(std::rc::Rc::new(Node::Any { token: tok }))
            }
            TokenKind::CharSet => {
                let tok = self.bump();
                Ok(std::rc::Rc::new(Node::CharSet { token: tok, raw: self.text(tok).to_string() }))
            }
            TokenKind::String => {
                let tok = self.bump();
                Ok(std::rc::Rc::new(Node::String { token: tok, raw: self.text(tok).to_string() }))
            }
            TokenKind::Invalid => Err(FratCoreError::InvalidToken { token: self.cur }),
            _ => Err(self.no_viable_alternative(&[
                TokenKind::POpen,
                TokenKind::Term,
                TokenKind::Dot,
                TokenKind::CharSet,
                TokenKind::String,
            ])),
        }
    }

    /// Parses an entire pattern string through the regex sub-grammar,
    /// requiring it to consume the whole input. Used by the CLI/facade to
    /// parse the `--space` option (`spec.md` §4.2, §6.2).
    pub fn parse_pattern(source: &'a [u8]) -> FratCoreResult<NodeRef> {
        let lexer = Lexer::new("<pattern>", source);
        let mut parser = Parser::new(lexer);
        let node = parser.parse_regex_alt()?;
        if parser.cur.kind != TokenKind::Eos {
            return Err(parser.mismatched(&[TokenKind::Eos]));
        }
        Ok(node)
    }
}

/// Parses every production in `source` and builds a [`GrammarState`]:
/// the first production's name becomes the start symbol unless
/// `preset_start` names one already (an external override via
/// `set_start_production`, `spec.md` §6.2), and duplicate names raise
/// `DefinedProduction`.
pub fn parse_grammar(
    source_name: &str,
    source: &[u8],
    preset_start: Option<&str>,
) -> FratCoreResult<GrammarState> {
    let lexer = Lexer::new(source_name.to_string(), source);
    let mut parser = Parser::new(lexer);
    let mut state = GrammarState::new();
    if let Some(name) = preset_start {
        state.set_start_symbol(name);
    }

    let mut first = true;
    while parser.cur.kind != TokenKind::Eos {
        let (name_tok, body) = parser.parse_production()?;
        let name = parser.text(name_tok).to_string();

        if first && state.start_symbol().is_empty() {
            state.set_start_symbol(name.clone());
        }
        first = false;

        if !state.insert(name, body) {
            return Err(FratCoreError::DefinedProduction { token: name_tok });
        }
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    #[test]
    fn parses_single_syntactic_production() {
        let state = parse_grammar("<t>", b"a = 'x' 'y' ;", None).unwrap();
        assert_eq!(state.start_symbol(), "a");
        let body = state.get("a").unwrap();
        assert_eq!(body.kind(), NodeKind::Sequence);
    }

    #[test]
    fn parses_lexical_production_with_charset_and_dot() {
        let state = parse_grammar("<t>", b"A = [a-c]* . ;", None).unwrap();
        let body = state.get("A").unwrap();
        assert_eq!(body.kind(), NodeKind::Sequence);
    }

    #[test]
    fn duplicate_production_is_an_error() {
        let err = parse_grammar("<t>", b"a = 'x' ; a = 'y' ;", None).unwrap_err();
        assert!(matches!(err, FratCoreError::DefinedProduction { .. }));
    }

    #[test]
    fn missing_semicolon_expects_semicolon() {
        let err = parse_grammar("<t>", b"a = 'x'", None).unwrap_err();
        match err {
            FratCoreError::Parse { expected, .. } => {
                assert!(expected.contains(&TokenKind::SemiColon));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn start_symbol_defaults_to_first_production() {
        let state = parse_grammar("<t>", b"b = 'y' ; a = 'x' ;", None).unwrap();
        assert_eq!(state.start_symbol(), "b");
    }

    #[test]
    fn parse_pattern_parses_a_bare_regex_body() {
        let node = Parser::parse_pattern(b"[ \\t\\n]*").unwrap();
        assert_eq!(node.kind(), NodeKind::ZeroOrMore);
    }
}
