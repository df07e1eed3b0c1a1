//! The opcode-graph evaluator: a tight integer-dispatch loop driven by a
//! pluggable [`RandSource`] (`spec.md` §4.7).

use crate::opcode::{CompiledUnit, OpAddr, Opcode};
use crate::rand_source::RandSource;
use thiserror::Error;

/// Ceiling on the return-address stack, expressed in entries rather than
/// bytes. Exceeding it signals unbounded recursion (a left-recursive
/// syntactic production that never terminates, `spec.md` §8.3).
const RET_STACK_CAPACITY: usize = 2 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum VmError {
    #[error("return-stack overflow: grammar recurses without termination")]
    ReturnStackOverflow,

    #[error("character set `{raw}` matches no bytes")]
    EmptyCharSet { raw: String },
}

pub type VmResult<T> = Result<T, VmError>;

/// Runs `unit` to completion against `rand`, returning the accumulated
/// output buffer. Bootstraps with a synthetic `Call(start_id)` whose
/// `next` is the null sentinel, so the single matching `Ret` halts the
/// loop when the return stack empties.
pub fn eval(unit: &CompiledUnit, rand: &mut dyn RandSource) -> VmResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut ret_stack: Vec<OpAddr> = Vec::new();

    let mut current = unit.head(unit.start_id());

    loop {
        if current.is_null() {
            match ret_stack.pop() {
                Some(addr) => {
                    current = addr;
                    continue;
                }
                None => break,
            }
        }

        current = match unit.op(current) {
            Opcode::Empty { next } => *next,
            Opcode::Any { next } => {
                let c = rand.generate(32, 126) as u8;
                buffer.push(c);
                *next
            }
            Opcode::Char { c, next } => {
                buffer.push(*c);
                *next
            }
            Opcode::CharSet { map, next } => {
                let population = map.population();
                debug_assert!(population > 0, "empty charsets are rejected at compile time");
                let i = rand.generate(0, population - 1);
                buffer.push(map.lookup(i));
                *next
            }
            Opcode::Alt { arms } => {
                let i = rand.generate(0, (arms.len() - 1) as u32) as usize;
                arms[i]
            }
            Opcode::Call { pid, next } => {
                if ret_stack.len() >= RET_STACK_CAPACITY {
                    log::warn!("return-stack ceiling of {RET_STACK_CAPACITY} entries reached, aborting walk");
                    return Err(VmError::ReturnStackOverflow);
                }
                ret_stack.push(*next);
                unit.head(*pid)
            }
            Opcode::Ret => match ret_stack.pop() {
                Some(addr) => addr,
                None => OpAddr::NULL,
            },
        };
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::rand_source::SequenceRandSource;
    use frat_core::desugar::desugar;
    use frat_core::parser::parse_grammar;
    use frat_core::space::{insert_space, DEFAULT_SPACE_PATTERN};

    fn run(src: &[u8], sequence: Vec<u32>) -> String {
        let mut state = parse_grammar("<t>", src, None).unwrap();
        desugar(&mut state);
        let unit = compile(&state).unwrap();
        let mut rand = SequenceRandSource::new(sequence);
        let bytes = eval(&unit, &mut rand).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    fn run_spaced(src: &[u8], pattern: &[u8], sequence: Vec<u32>) -> String {
        let mut state = parse_grammar("<t>", src, None).unwrap();
        insert_space(&mut state, pattern).unwrap();
        desugar(&mut state);
        let unit = compile(&state).unwrap();
        let mut rand = SequenceRandSource::new(sequence);
        let bytes = eval(&unit, &mut rand).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn scenario_1_any_emits_literal_bytes() {
        // `generate` is clamped to the requested range; the sequence's
        // byte values already lie in [32, 126], so they pass through.
        assert_eq!(run(b"A = .... ;", vec![b'a' as u32, b'A' as u32, b'@' as u32, b'7' as u32]), "aA@7");
    }

    #[test]
    fn scenario_2_charset_selection_is_positional() {
        assert_eq!(run(b"A = [abc] [abc] [abc] ;", vec![1, 2, 0, 3]), "bca");
    }

    #[test]
    fn scenario_4_alternation_of_literals() {
        assert_eq!(run(b"A = 'a' | 'b' | 'c' ;", vec![2]), "c");
        assert_eq!(run(b"A = 'a' | 'b' | 'c' ;", vec![0]), "a");
        assert_eq!(run(b"A = 'a' | 'b' | 'c' ;", vec![1]), "b");
    }

    #[test]
    fn scenario_5_option_may_emit_empty() {
        assert_eq!(run(b"A = 'a'? ;", vec![1]), "");
        assert_eq!(run(b"A = 'a'? ;", vec![0]), "a");
    }

    #[test]
    fn scenario_6_space_insertion_between_alternation_arms() {
        assert_eq!(run_spaced(b"a = 'a' ('b' | 'c') ;", b"' '", vec![0]), " a b ");
        assert_eq!(run_spaced(b"a = 'a' ('b' | 'c') ;", b"' '", vec![1]), " a c ");
    }

    #[test]
    fn scenario_7_space_insertion_across_repetition() {
        assert_eq!(run_spaced(b"a = 'a'+ ;", b"' '", vec![0, 0, 1]), "  a a a ");
    }

    #[test]
    fn left_recursion_hits_the_return_stack_ceiling() {
        let mut state = parse_grammar("<t>", b"a = 'a' a ;", None).unwrap();
        desugar(&mut state);
        let unit = compile(&state).unwrap();
        let mut rand = SequenceRandSource::new(vec![0]);
        assert!(matches!(eval(&unit, &mut rand), Err(VmError::ReturnStackOverflow)));
    }
}
