//! The opcode graph produced by the compiler and walked by the evaluator
//! (`spec.md` §3, §4.6).
//!
//! The teacher threads opcodes with raw pointers into an arena; here the
//! arena is a plain `Vec<Opcode>` and `next` links are indices into it,
//! which keeps the graph `Send`/`Sync` and sidesteps lifetime plumbing for
//! what is, after all, just a fixed-size DAG-with-cycles.

use crate::asciimap::AsciiMap;

/// An index into a [`CompiledUnit`]'s opcode arena, or the null sentinel
/// that means "halt".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpAddr(u32);

impl OpAddr {
    pub const NULL: OpAddr = OpAddr(u32::MAX);

    fn new(index: usize) -> Self {
        OpAddr(index as u32)
    }

    pub fn is_null(self) -> bool {
        self == OpAddr::NULL
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub enum Opcode {
    Empty { next: OpAddr },
    Any { next: OpAddr },
    Char { c: u8, next: OpAddr },
    CharSet { map: AsciiMap, next: OpAddr },
    /// Terminates the straight-line segment; each arm is the head of an
    /// independent chain that converges on a shared `Empty` join node.
    Alt { arms: Vec<OpAddr> },
    /// Pushes this opcode's `next` onto the return stack and transfers
    /// control to production `pid`'s head.
    Call { pid: u32, next: OpAddr },
    Ret,
}

/// A growable arena of opcodes, addressed by [`OpAddr`].
#[derive(Debug, Default)]
pub struct OpArena {
    ops: Vec<Opcode>,
}

impl OpArena {
    pub fn new() -> Self {
        OpArena { ops: Vec::new() }
    }

    pub fn push(&mut self, op: Opcode) -> OpAddr {
        let addr = OpAddr::new(self.ops.len());
        self.ops.push(op);
        addr
    }

    pub fn get(&self, addr: OpAddr) -> &Opcode {
        &self.ops[addr.index()]
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// A frozen, fully compiled grammar: a start production id and a dense
/// table of production id → chain head address.
#[derive(Debug)]
pub struct CompiledUnit {
    pub(crate) arena: OpArena,
    pub(crate) heads: Vec<OpAddr>,
    pub(crate) start_id: u32,
}

impl CompiledUnit {
    pub fn start_id(&self) -> u32 {
        self.start_id
    }

    pub fn head(&self, pid: u32) -> OpAddr {
        self.heads[pid as usize]
    }

    pub(crate) fn op(&self, addr: OpAddr) -> &Opcode {
        self.arena.get(addr)
    }
}
