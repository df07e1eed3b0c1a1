//! Optional whitespace injection between adjacent symbols of syntactic
//! productions (`spec.md` §4.4).
//!
//! Lexical productions define tokens; spaces must never leak into token
//! interiors, so only syntactic bodies are rewritten. The two repetition
//! rules and the juxtaposition rule together guarantee that every
//! boundary *between* generated tokens is a site where whitespace may
//! appear.

use crate::ast::{Node, NodeRef};
use crate::grammar::GrammarState;
use crate::parser::Parser;
use crate::token::Token;
use crate::{is_lexical, FratCoreResult, SPACE_NAME};
use std::rc::Rc;

/// The default space pattern, `[ \t\n]*` (`spec.md` §9 notes the
/// carriage-return omission is a pinned choice, not an oversight).
pub const DEFAULT_SPACE_PATTERN: &str = "[ \\t\\n]*";

/// Name reserved for the synthesised start-symbol whitespace wrapper.
/// Digit-prefixed, so it can never collide with a user production name
/// (`TERM`/`NTERM` both require a non-digit first character).
const START_WRAPPER_NAME: &str = "0_start";

fn space_ref(token: Token) -> NodeRef {
    Node::non_terminal(token, SPACE_NAME)
}

/// Rewrites every syntactic production's body to install implicit
/// whitespace at juxtaposition and repetition boundaries. `pattern` is
/// parsed through the regex sub-grammar and installed under the reserved
/// name `_`.
pub fn insert_space(state: &mut GrammarState, pattern: &[u8]) -> FratCoreResult<()> {
    let space_body = Parser::parse_pattern(pattern)?;
    state.set(SPACE_NAME, space_body);

    let names: Vec<String> = state.names().map(str::to_string).collect();
    for name in names {
        if name == SPACE_NAME || is_lexical(&name) {
            continue;
        }
        let body = state.get(&name).unwrap().clone();
        let transformed = transform(&body);
        state.set(name, transformed);
    }

    if !state.start_symbol().is_empty() && !is_lexical(state.start_symbol()) {
        let start = state.start_symbol().to_string();
        let token = Token::synthetic(0);
        let wrapper = Node::sequence(
            space_ref(token),
            Node::sequence(Node::non_terminal(token, start), space_ref(token)),
        );
        state.set(START_WRAPPER_NAME, wrapper);
        state.set_start_symbol(START_WRAPPER_NAME);
    }

    Ok(())
}

fn transform(node: &NodeRef) -> NodeRef {
    match node.as_ref() {
        Node::Sequence { token, left, right } => {
            let l = transform(left);
            let r = transform(right);
            Node::sequence(l, Node::sequence(space_ref(*token), r))
        }
        Node::ZeroOrMore { token, child } => {
            let c = transform(child);
            Rc::new(Node::ZeroOrMore { token: *token, child: Node::sequence(space_ref(*token), c) })
        }
        Node::OneOrMore { token, child } => {
            let c = transform(child);
            Rc::new(Node::OneOrMore { token: *token, child: Node::sequence(space_ref(*token), c) })
        }
        Node::Option { token, child } => {
            Rc::new(Node::Option { token: *token, child: transform(child) })
        }
        Node::Alternative { token, left, right } => {
            Rc::new(Node::Alternative { token: *token, left: transform(left), right: transform(right) })
        }
        Node::Empty { .. }
        | Node::Any { .. }
        | Node::String { .. }
        | Node::CharSet { .. }
        | Node::NonTerminal { .. } => node.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use crate::parser::parse_grammar;

    #[test]
    fn wraps_syntactic_start_and_inserts_between_symbols() {
        let mut state = parse_grammar("<t>", b"a = 'a' ('b' | 'c') ;", None).unwrap();
        insert_space(&mut state, DEFAULT_SPACE_PATTERN.as_bytes()).unwrap();
        assert_eq!(state.start_symbol(), START_WRAPPER_NAME);
        assert!(state.contains(SPACE_NAME));
        assert_eq!(state.get(START_WRAPPER_NAME).unwrap().kind(), NodeKind::Sequence);
    }

    #[test]
    fn leaves_lexical_productions_byte_for_byte_identical() {
        let mut state = parse_grammar("<t>", b"a = A ; A = 'x' 'y' ;", None).unwrap();
        let before = format!("{:?}", state.get("A").unwrap());
        insert_space(&mut state, DEFAULT_SPACE_PATTERN.as_bytes()).unwrap();
        let after = format!("{:?}", state.get("A").unwrap());
        assert_eq!(before, after);
    }

    #[test]
    fn repeat_wrapper_is_retained() {
        let mut state = parse_grammar("<t>", b"a = 'a'+ ;", None).unwrap();
        insert_space(&mut state, DEFAULT_SPACE_PATTERN.as_bytes()).unwrap();
        let wrapper = state.get(START_WRAPPER_NAME).unwrap();
        // start' = _ a _ ; the middle element should still reach a OneOrMore
        // inside the transformed `a` production.
        let a = state.get("a").unwrap();
        assert_eq!(a.kind(), NodeKind::OneOrMore);
        let _ = wrapper;
    }
}
