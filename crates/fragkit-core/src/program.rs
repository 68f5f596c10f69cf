//! Fixed-function style kernel programs.
//!
//! A [`Program`] is a straight-line sequence of vector instructions over named
//! four-lane registers, in the assembly dialect of ARB fragment programs:
//!
//! ```text
//! MOV out.x, orig.x;
//! CMP out.x, coord.x, border.x, out.x;   # out.x = coord.x < 0 ? border.x : out.x
//! SUB out.yzw, 1, coord.xxyz;
//! ```
//!
//! There is no control flow. Every instruction reads all of its sources
//! before writing its destination, so a register may appear on both sides.

use std::collections::HashMap;
use std::fmt;

use glam::Vec4;

use crate::error::{KernelError, Result};
use crate::lane::{Swizzle, WriteMask};
use crate::select::select_neg4;

/// Instruction opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Mov,
    Add,
    Sub,
    Mul,
    Min,
    Max,
    /// `CMP d, a, b, c`: lane-wise `a < 0 ? b : c`.
    Cmp,
}

impl Opcode {
    /// Number of source operands.
    pub fn arity(self) -> usize {
        match self {
            Opcode::Mov => 1,
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Min | Opcode::Max => 2,
            Opcode::Cmp => 3,
        }
    }

    /// Assembly mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Mov => "MOV",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Min => "MIN",
            Opcode::Max => "MAX",
            Opcode::Cmp => "CMP",
        }
    }

    /// Parses a mnemonic, ignoring case.
    pub fn from_mnemonic(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "MOV" => Some(Opcode::Mov),
            "ADD" => Some(Opcode::Add),
            "SUB" => Some(Opcode::Sub),
            "MUL" => Some(Opcode::Mul),
            "MIN" => Some(Opcode::Min),
            "MAX" => Some(Opcode::Max),
            "CMP" => Some(Opcode::Cmp),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// What a source operand reads from.
#[derive(Debug, Clone, PartialEq)]
pub enum RegRef {
    /// A named register.
    Named(String),
    /// A scalar constant, replicated to every lane.
    Literal(f32),
}

/// A source operand.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub reg: RegRef,
    pub swizzle: Swizzle,
    pub negate: bool,
}

impl Source {
    /// Reads a named register through `swizzle`.
    pub fn reg(name: impl Into<String>, swizzle: Swizzle) -> Self {
        Self {
            reg: RegRef::Named(name.into()),
            swizzle,
            negate: false,
        }
    }

    /// A literal operand.
    pub fn literal(value: f32) -> Self {
        Self {
            reg: RegRef::Literal(value),
            swizzle: Swizzle::IDENTITY,
            negate: false,
        }
    }

    fn read(&self, registers: &RegisterFile) -> Result<Vec4> {
        let value = match &self.reg {
            RegRef::Named(name) => self.swizzle.apply(registers.read(name)?),
            RegRef::Literal(v) => Vec4::splat(*v),
        };
        Ok(if self.negate { -value } else { value })
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negate {
            f.write_str("-")?;
        }
        match &self.reg {
            RegRef::Named(name) if self.swizzle.is_identity() => write!(f, "{name}"),
            RegRef::Named(name) => write!(f, "{name}.{}", self.swizzle),
            RegRef::Literal(v) => write!(f, "{v}"),
        }
    }
}

/// A destination operand.
#[derive(Debug, Clone, PartialEq)]
pub struct Dest {
    pub reg: String,
    pub mask: WriteMask,
}

impl Dest {
    /// A destination writing the lanes in `mask`.
    pub fn new(reg: impl Into<String>, mask: WriteMask) -> Self {
        Self {
            reg: reg.into(),
            mask,
        }
    }
}

impl fmt::Display for Dest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mask == WriteMask::ALL {
            write!(f, "{}", self.reg)
        } else {
            write!(f, "{}.{}", self.reg, self.mask)
        }
    }
}

/// One instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub dest: Dest,
    pub sources: Vec<Source>,
}

impl Instruction {
    /// Creates an instruction, checking the operand count.
    pub fn new(opcode: Opcode, dest: Dest, sources: Vec<Source>) -> Result<Self> {
        if sources.len() != opcode.arity() {
            return Err(KernelError::Arity {
                opcode: opcode.mnemonic().to_string(),
                expected: opcode.arity(),
                actual: sources.len(),
            });
        }
        Ok(Self {
            opcode,
            dest,
            sources,
        })
    }

    /// Executes the instruction against `registers`.
    pub fn execute(&self, registers: &mut RegisterFile) -> Result<()> {
        let operands = self
            .sources
            .iter()
            .map(|s| s.read(registers))
            .collect::<Result<Vec<_>>>()?;

        let value = match (self.opcode, operands.as_slice()) {
            (Opcode::Mov, [a]) => *a,
            (Opcode::Add, [a, b]) => *a + *b,
            (Opcode::Sub, [a, b]) => *a - *b,
            (Opcode::Mul, [a, b]) => *a * *b,
            (Opcode::Min, [a, b]) => a.min(*b),
            (Opcode::Max, [a, b]) => a.max(*b),
            (Opcode::Cmp, [a, b, c]) => select_neg4(*a, *b, *c),
            (opcode, ops) => {
                return Err(KernelError::Arity {
                    opcode: opcode.mnemonic().to_string(),
                    expected: opcode.arity(),
                    actual: ops.len(),
                })
            }
        };

        let current = registers.get(&self.dest.reg).unwrap_or(Vec4::ZERO);
        registers.set(self.dest.reg.clone(), self.dest.mask.write(current, value));
        Ok(())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.opcode, self.dest)?;
        for source in &self.sources {
            write!(f, ", {source}")?;
        }
        f.write_str(";")
    }
}

/// Named four-lane registers.
#[derive(Debug, Clone, Default)]
pub struct RegisterFile {
    registers: HashMap<String, Vec4>,
}

impl RegisterFile {
    /// Creates an empty register file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `value`, returning `self` for chaining.
    pub fn with(mut self, name: impl Into<String>, value: Vec4) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a register.
    pub fn set(&mut self, name: impl Into<String>, value: Vec4) {
        self.registers.insert(name.into(), value);
    }

    /// Gets a register, if it has been bound or written.
    pub fn get(&self, name: &str) -> Option<Vec4> {
        self.registers.get(name).copied()
    }

    fn read(&self, name: &str) -> Result<Vec4> {
        self.get(name)
            .ok_or_else(|| KernelError::UndefinedRegister(name.to_string()))
    }
}

/// A straight-line kernel program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    /// Creates a program from already-built instructions.
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Parses assembly text.
    ///
    /// Statements end with `;` and may span lines. `#` starts a comment.
    /// Errors carry the line on which the offending statement starts.
    pub fn parse(source: &str) -> Result<Self> {
        let mut instructions = Vec::new();
        let mut pending = String::new();
        let mut start_line = 1;

        for (idx, raw) in source.lines().enumerate() {
            let line = idx + 1;
            let code = raw.split('#').next().unwrap_or_default();
            let mut pieces = code.split(';').peekable();

            while let Some(piece) = pieces.next() {
                if pending.trim().is_empty() {
                    start_line = line;
                }
                pending.push(' ');
                pending.push_str(piece);

                if pieces.peek().is_some() {
                    let statement = pending.trim();
                    if !statement.is_empty() {
                        let instruction =
                            parse_statement(statement).map_err(|message| KernelError::Parse {
                                line: start_line,
                                message,
                            })?;
                        instructions.push(instruction);
                    }
                    pending.clear();
                }
            }
        }

        if !pending.trim().is_empty() {
            return Err(KernelError::Parse {
                line: start_line,
                message: "missing ';' after last statement".into(),
            });
        }

        log::debug!("parsed kernel program ({} instructions)", instructions.len());
        Ok(Self { instructions })
    }

    /// Returns the instructions.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns the number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns whether the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Runs every instruction in order.
    pub fn execute(&self, registers: &mut RegisterFile) -> Result<()> {
        for instruction in &self.instructions {
            instruction.execute(registers)?;
        }
        Ok(())
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.instructions {
            writeln!(f, "{instruction}")?;
        }
        Ok(())
    }
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_statement(statement: &str) -> std::result::Result<Instruction, String> {
    let (mnemonic, rest) = statement
        .split_once(char::is_whitespace)
        .unwrap_or((statement, ""));
    let opcode =
        Opcode::from_mnemonic(mnemonic).ok_or_else(|| format!("unknown opcode '{mnemonic}'"))?;

    if rest.trim().is_empty() {
        return Err(format!("{opcode} has no operands"));
    }

    let mut operands = rest.split(',').map(str::trim);
    let dest = parse_dest(operands.next().unwrap_or_default())?;
    let sources = operands.map(parse_source).collect::<std::result::Result<Vec<_>, _>>()?;

    Instruction::new(opcode, dest, sources).map_err(|e| e.to_string())
}

fn parse_dest(operand: &str) -> std::result::Result<Dest, String> {
    let (name, mask) = match operand.split_once('.') {
        Some((name, mask)) => (name, WriteMask::parse(mask).map_err(|e| e.to_string())?),
        None => (operand, WriteMask::ALL),
    };
    if !is_identifier(name) {
        return Err(format!("invalid destination register '{operand}'"));
    }
    Ok(Dest::new(name, mask))
}

fn parse_source(operand: &str) -> std::result::Result<Source, String> {
    let (negate, body) = match operand.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, operand),
    };

    if body.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        let value: f32 = body
            .parse()
            .map_err(|_| format!("invalid literal '{body}'"))?;
        let mut source = Source::literal(value);
        source.negate = negate;
        return Ok(source);
    }

    let (name, swizzle) = match body.split_once('.') {
        Some((name, swizzle)) => (name, Swizzle::parse(swizzle).map_err(|e| e.to_string())?),
        None => (body, Swizzle::IDENTITY),
    };
    if !is_identifier(name) {
        return Err(format!("invalid source operand '{operand}'"));
    }

    let mut source = Source::reg(name, swizzle);
    source.negate = negate;
    Ok(source)
}
