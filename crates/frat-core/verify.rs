//! Semantic verification: every `NonTerminal` reference must resolve, and
//! a start production must exist (`spec.md` §4.3).

use crate::ast::Node;
use crate::error::FratCoreError;
use crate::grammar::GrammarState;
use crate::FratCoreResult;

/// Verifies `state`, returning the first `UndefinedNonTerminal` found (in
/// production declaration order, then left-to-right within a body), or
/// `UndefinedStart` if the start symbol is empty or unresolved.
pub fn verify(state: &GrammarState) -> FratCoreResult<()> {
    if state.start_symbol().is_empty() || !state.contains(state.start_symbol()) {
        return Err(FratCoreError::UndefinedStart { name: state.start_symbol().to_string() });
    }

    for (_, body) in state.iter() {
        check_node(body, state)?;
    }
    Ok(())
}

fn check_node(node: &Node, state: &GrammarState) -> FratCoreResult<()> {
    if let Node::NonTerminal { token, name } = node {
        if !state.contains(name) {
            return Err(FratCoreError::UndefinedNonTerminal { token: *token });
        }
    }
    let mut result = Ok(());
    node.for_each_child(|child| {
        if result.is_ok() {
            result = check_node(child, state);
        }
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_grammar;

    #[test]
    fn accepts_a_well_formed_grammar() {
        let state = parse_grammar("<t>", b"a = 'x' b ; b = 'y' ;", None).unwrap();
        assert!(verify(&state).is_ok());
    }

    #[test]
    fn rejects_undefined_non_terminal() {
        let state = parse_grammar("<t>", b"a = 'x' b ;", None).unwrap();
        let err = verify(&state).unwrap_err();
        assert!(matches!(err, FratCoreError::UndefinedNonTerminal { .. }));
    }

    #[test]
    fn rejects_missing_start() {
        let mut state = GrammarState::new();
        state.set_start_symbol("missing");
        let err = verify(&state).unwrap_err();
        assert!(matches!(err, FratCoreError::UndefinedStart { .. }));
    }

    #[test]
    fn rejects_empty_start() {
        let state = GrammarState::new();
        let err = verify(&state).unwrap_err();
        assert!(matches!(err, FratCoreError::UndefinedStart { .. }));
    }
}
