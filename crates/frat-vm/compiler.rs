//! AST → opcode graph compilation (`spec.md` §4.6).
//!
//! Each production is compiled with an explicit continuation address (the
//! opcode to run once the production's body has finished): `compile_node`
//! takes the AST node plus the address its chain should fall through to,
//! and returns the address of the chain's first opcode. This is the usual
//! continuation-passing construction for threaded code, and it means a
//! production's body never needs a second pass to patch `next` fields.

use crate::asciimap::AsciiMap;
use crate::eval::VmError;
use crate::opcode::{OpArena, OpAddr, Opcode, CompiledUnit};
use frat_core::ast::{Node, NodeRef};
use frat_core::GrammarState;
use std::collections::HashMap;

/// Compiles every production in `state` into a [`CompiledUnit`]. `state`
/// must already be verified, space-inserted (if desired), and desugared;
/// the compiler does not re-check well-formedness, except for charsets
/// that decode to no bytes at all, which only become apparent once the
/// bracket expression is actually built.
pub fn compile(state: &GrammarState) -> Result<CompiledUnit, VmError> {
    let ids: HashMap<&str, u32> =
        state.iter().enumerate().map(|(i, (name, _))| (name, i as u32)).collect();

    log::debug!("compiling {} production(s) to opcodes", ids.len());

    let mut arena = OpArena::new();
    let mut heads = vec![OpAddr::NULL; ids.len()];

    for (name, body) in state.iter() {
        let pid = ids[name];
        let ret = arena.push(Opcode::Ret);
        let head = compile_node(body, ret, &mut arena, &ids)?;
        heads[pid as usize] = head;
    }

    let start_id = ids[state.start_symbol()];
    log::debug!("start production '{}' -> opcode graph of {} node(s)", state.start_symbol(), arena.len());
    Ok(CompiledUnit { arena, heads, start_id })
}

fn compile_node(
    node: &NodeRef,
    next: OpAddr,
    arena: &mut OpArena,
    ids: &HashMap<&str, u32>,
) -> Result<OpAddr, VmError> {
    Ok(match node.as_ref() {
        Node::Empty { .. } => arena.push(Opcode::Empty { next }),
        Node::Any { .. } => arena.push(Opcode::Any { next }),
        Node::String { raw, .. } => compile_string(raw, next, arena),
        Node::CharSet { raw, .. } => {
            let map = build_charset(raw);
            if map.population() == 0 {
                return Err(VmError::EmptyCharSet { raw: raw.clone() });
            }
            arena.push(Opcode::CharSet { map, next })
        }
        Node::Sequence { left, right, .. } => {
            let right_head = compile_node(right, next, arena, ids)?;
            compile_node(left, right_head, arena, ids)?
        }
        Node::Alternative { .. } => compile_alternative(node, next, arena, ids)?,
        Node::NonTerminal { name, .. } => {
            let pid = ids[name.as_str()];
            arena.push(Opcode::Call { pid, next })
        }
        // Desugaring runs before compilation; these never reach the compiler.
        Node::ZeroOrMore { .. } | Node::OneOrMore { .. } | Node::Option { .. } => {
            unreachable!("sugar node survived desugaring")
        }
    })
}

/// Flattens a chain of `|`-joined arms, compiles each into its own chain
/// converging on a shared `Empty` join node, and emits a single `Alt`.
/// Multiple `Empty` arms (from desugared `?`/`*`) collapse into one.
fn compile_alternative(
    node: &NodeRef,
    next: OpAddr,
    arena: &mut OpArena,
    ids: &HashMap<&str, u32>,
) -> Result<OpAddr, VmError> {
    let mut flat = Vec::new();
    flatten_alternative(node, &mut flat);

    let mut seen_empty = false;
    let join = arena.push(Opcode::Empty { next });
    let mut arms = Vec::with_capacity(flat.len());
    for arm in &flat {
        if matches!(arm.as_ref(), Node::Empty { .. }) {
            if seen_empty {
                continue;
            }
            seen_empty = true;
        }
        arms.push(compile_node(arm, join, arena, ids)?);
    }

    Ok(arena.push(Opcode::Alt { arms }))
}

fn flatten_alternative(node: &NodeRef, out: &mut Vec<NodeRef>) {
    match node.as_ref() {
        Node::Alternative { left, right, .. } => {
            flatten_alternative(left, out);
            flatten_alternative(right, out);
        }
        _ => out.push(node.clone()),
    }
}

fn compile_string(raw: &str, next: OpAddr, arena: &mut OpArena) -> OpAddr {
    let decoded = decode_literal(strip_quotes(raw));
    let mut cur = next;
    for &byte in decoded.iter().rev() {
        cur = arena.push(Opcode::Char { c: byte, next: cur });
    }
    cur
}

fn strip_quotes(raw: &str) -> &[u8] {
    let bytes = raw.as_bytes();
    &bytes[1..bytes.len() - 1]
}

/// Decodes the escape forms permitted inside `STRING`/`CHARSET` content
/// (`spec.md` §4.1): `\t \r \n`, the quote character, backslash, and a
/// 1-2 hex digit byte escape `\xH{1,2}`. Unknown escapes yield the literal
/// byte following the backslash.
fn decode_literal(content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len());
    let mut i = 0;
    while i < content.len() {
        if content[i] == b'\\' && i + 1 < content.len() {
            let esc = content[i + 1];
            match esc {
                b't' => {
                    out.push(b'\t');
                    i += 2;
                }
                b'r' => {
                    out.push(b'\r');
                    i += 2;
                }
                b'n' => {
                    out.push(b'\n');
                    i += 2;
                }
                b'x' => {
                    let (value, consumed) = decode_hex_escape(&content[i + 2..]);
                    out.push(value);
                    i += 2 + consumed;
                }
                other => {
                    out.push(other);
                    i += 2;
                }
            }
        } else {
            out.push(content[i]);
            i += 1;
        }
    }
    out
}

/// Consumes up to two hex digits from `rest`, returning the decoded byte
/// and the number of digit bytes consumed. Zero digits decodes to `0`.
fn decode_hex_escape(rest: &[u8]) -> (u8, usize) {
    let mut value: u8 = 0;
    let mut consumed = 0;
    for &b in rest.iter().take(2) {
        match (b as char).to_digit(16) {
            Some(d) => {
                value = value * 16 + d as u8;
                consumed += 1;
            }
            None => break,
        }
    }
    (value, consumed)
}

/// Builds an `AsciiMap` from a bracket expression's raw text (including
/// the surrounding `[`/`]`). A leading `^` negates; `a-b` sets every byte
/// in the inclusive range; escapes follow `STRING` rules, plus `\]`/`\^`.
fn build_charset(raw: &str) -> AsciiMap {
    let bytes = raw.as_bytes();
    let mut content = &bytes[1..bytes.len() - 1];
    let negate = content.first() == Some(&b'^');
    if negate {
        content = &content[1..];
    }

    let decoded = decode_literal(content);
    let mut map = AsciiMap::new();
    let mut i = 0;
    while i < decoded.len() {
        if i + 2 < decoded.len() && decoded[i + 1] == b'-' {
            let (lo, hi) = (decoded[i], decoded[i + 2]);
            let (lo, hi) = (lo.min(hi), lo.max(hi));
            for c in lo..=hi {
                map.add(c);
            }
            i += 3;
        } else {
            map.add(decoded[i]);
            i += 1;
        }
    }

    if negate {
        map.complement()
    } else {
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frat_core::desugar::desugar;
    use frat_core::parser::parse_grammar;

    fn compile_source(src: &[u8]) -> CompiledUnit {
        let mut state = parse_grammar("<t>", src, None).unwrap();
        desugar(&mut state);
        compile(&state).unwrap()
    }

    #[test]
    fn empty_charset_is_rejected_at_compile_time() {
        let mut state = parse_grammar("<t>", b"A = [^\\x00-\\x7f] ;", None).unwrap();
        desugar(&mut state);
        assert!(matches!(compile(&state), Err(VmError::EmptyCharSet { .. })));
    }

    #[test]
    fn string_literal_compiles_to_a_char_chain() {
        let unit = compile_source(b"a = 'ab' ;");
        let head = unit.head(unit.start_id());
        match unit.op(head) {
            Opcode::Char { c, next } => {
                assert_eq!(*c, b'a');
                match unit.op(*next) {
                    Opcode::Char { c, .. } => assert_eq!(*c, b'b'),
                    other => panic!("unexpected {other:?}"),
                }
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn charset_range_and_negation() {
        let map = build_charset("[a-c]");
        assert_eq!(map.population(), 3);
        assert!(map.contains(b'b'));

        let neg = build_charset("[^a-c]");
        assert_eq!(neg.population(), 125);
        assert!(!neg.contains(b'b'));
    }

    #[test]
    fn hex_escape_decodes_one_or_two_digits() {
        assert_eq!(decode_literal(b"\\x41"), vec![0x41]);
        assert_eq!(decode_literal(b"\\x4"), vec![0x04]);
    }

    #[test]
    fn alternative_flattens_and_dedupes_empty_arms() {
        let unit = compile_source(b"a = 'x'? ;");
        let head = unit.head(unit.start_id());
        match unit.op(head) {
            Opcode::Alt { arms } => assert_eq!(arms.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn non_terminal_compiles_to_call() {
        let unit = compile_source(b"a = b ; b = 'x' ;");
        let head = unit.head(unit.start_id());
        assert!(matches!(unit.op(head), Opcode::Call { .. }));
    }
}
