//! Rewrites repetition and option sugar into plain alternation and fresh
//! recursive productions (`spec.md` §4.5), so the opcode compiler in
//! `frat-vm` only ever has to handle the six-variant core:
//! `Empty, Any, CharSet, String, Sequence, Alternative, NonTerminal`.
//!
//! Desugaring runs last in the AST pipeline, after whitespace insertion —
//! the inserter's own `ZeroOrMore`/`OneOrMore` rewrite rules depend on
//! seeing the sugar nodes intact.
//!
//! - `X?`      → `X | ()`
//! - `X*`      → a fresh production `P = X P | () ;`, referenced in place
//! - `X+`      → `X X*`, i.e. one copy of `X` followed by the same
//!               freshly synthesised `P` as above (the transformed copy of
//!               `X` is shared via `Rc`, not duplicated).

use crate::ast::{Node, NodeRef};
use crate::grammar::GrammarState;

/// Name prefix for synthesised repeat productions: digit-led, so no
/// user-declared `TERM`/`NTERM` name can ever collide with one.
const REPEAT_PREFIX: &str = "1_repeat";

struct Desugarer<'g> {
    state: &'g mut GrammarState,
    counter: usize,
}

impl<'g> Desugarer<'g> {
    fn fresh_name(&mut self) -> String {
        let name = format!("{REPEAT_PREFIX}{}", self.counter);
        self.counter += 1;
        name
    }

    /// Rewrites `node`, installing any freshly synthesised productions into
    /// `self.state` as a side effect, and returns the replacement subtree.
    fn transform(&mut self, node: &NodeRef) -> NodeRef {
        match node.as_ref() {
            Node::Empty { .. } | Node::Any { .. } | Node::String { .. } | Node::CharSet { .. } => {
                node.clone()
            }
            Node::NonTerminal { .. } => node.clone(),
            Node::Sequence { left, right, .. } => {
                Node::sequence(self.transform(left), self.transform(right))
            }
            Node::Alternative { left, right, .. } => {
                Node::alternative(self.transform(left), self.transform(right))
            }
            Node::Option { token, child } => {
                let c = self.transform(child);
                Node::alternative(c, Node::empty(*token))
            }
            Node::ZeroOrMore { token, child } => {
                let c = self.transform(child);
                self.synthesize_star(*token, c)
            }
            Node::OneOrMore { token, child } => {
                let c = self.transform(child);
                let star = self.synthesize_star(*token, c.clone());
                Node::sequence(c, star)
            }
        }
    }

    /// Installs `P = c P | () ;` under a fresh name and returns a reference
    /// to it. Shared between the `*` and `+` cases: `X+` reuses the exact
    /// same synthesised tail as `X*`.
    fn synthesize_star(&mut self, token: crate::token::Token, c: NodeRef) -> NodeRef {
        let name = self.fresh_name();
        let self_ref = Node::non_terminal(token, name.clone());
        let body = Node::alternative(Node::sequence(c, self_ref.clone()), Node::empty(token));
        self.state.set(name, body);
        self_ref
    }
}

/// Desugars every production body in `state` in place.
pub fn desugar(state: &mut GrammarState) {
    let names: Vec<String> = state.names().map(str::to_string).collect();
    let mut d = Desugarer { state, counter: 0 };
    for name in names {
        let body = d.state.get(&name).unwrap().clone();
        let transformed = d.transform(&body);
        d.state.set(name, transformed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use crate::parser::parse_grammar;

    #[test]
    fn option_becomes_alternative_with_empty() {
        let mut state = parse_grammar("<t>", b"a = 'x'? ;", None).unwrap();
        desugar(&mut state);
        let body = state.get("a").unwrap();
        assert_eq!(body.kind(), NodeKind::Alternative);
        if let Node::Alternative { right, .. } = body.as_ref() {
            assert_eq!(right.kind(), NodeKind::Empty);
        } else {
            unreachable!();
        }
    }

    #[test]
    fn star_synthesizes_a_fresh_recursive_production() {
        let mut state = parse_grammar("<t>", b"a = 'x'* ;", None).unwrap();
        let before = state.len();
        desugar(&mut state);
        assert_eq!(state.len(), before + 1);
        let body = state.get("a").unwrap();
        assert_eq!(body.kind(), NodeKind::NonTerminal);
        if let Node::NonTerminal { name, .. } = body.as_ref() {
            let tail = state.get(name).unwrap();
            assert_eq!(tail.kind(), NodeKind::Alternative);
        } else {
            unreachable!();
        }
    }

    #[test]
    fn plus_is_one_copy_followed_by_star() {
        let mut state = parse_grammar("<t>", b"a = 'x'+ ;", None).unwrap();
        desugar(&mut state);
        let body = state.get("a").unwrap();
        assert_eq!(body.kind(), NodeKind::Sequence);
        if let Node::Sequence { left, right, .. } = body.as_ref() {
            assert_eq!(left.kind(), NodeKind::String);
            assert_eq!(right.kind(), NodeKind::NonTerminal);
        } else {
            unreachable!();
        }
    }

    #[test]
    fn only_core_node_kinds_remain_after_desugaring() {
        let mut state = parse_grammar("<t>", b"a = 'x'? 'y'* 'z'+ ;", None).unwrap();
        desugar(&mut state);
        for (_, body) in state.iter() {
            assert_core_kinds(body);
        }
    }

    fn assert_core_kinds(node: &NodeRef) {
        assert!(matches!(
            node.kind(),
            NodeKind::Empty
                | NodeKind::Any
                | NodeKind::CharSet
                | NodeKind::String
                | NodeKind::Sequence
                | NodeKind::Alternative
                | NodeKind::NonTerminal
        ));
        node.for_each_child(assert_core_kinds);
    }
}
