//! Vector lanes, source swizzles and destination write masks.
//!
//! Every kernel value lives in a four-lane register. Source operands are read
//! through a [`Swizzle`] and results are stored through a [`WriteMask`], with
//! lane *i* of a result always landing in lane *i* of the destination.

use std::fmt;

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};

/// One lane of a four-component register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Lane {
    X,
    Y,
    Z,
    W,
}

impl Lane {
    /// All lanes in register order.
    pub const ALL: [Lane; 4] = [Lane::X, Lane::Y, Lane::Z, Lane::W];

    /// The spatial lanes a texture coordinate can occupy.
    pub const SPATIAL: [Lane; 3] = [Lane::X, Lane::Y, Lane::Z];

    /// Returns the lane index (x = 0 .. w = 3).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Parses a lane letter (`x`, `y`, `z` or `w`).
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'x' => Some(Lane::X),
            'y' => Some(Lane::Y),
            'z' => Some(Lane::Z),
            'w' => Some(Lane::W),
            _ => None,
        }
    }

    /// Returns the lane letter.
    pub fn as_char(self) -> char {
        match self {
            Lane::X => 'x',
            Lane::Y => 'y',
            Lane::Z => 'z',
            Lane::W => 'w',
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Component selection applied to a source operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swizzle(pub [Lane; 4]);

impl Swizzle {
    /// The identity swizzle `xyzw`.
    pub const IDENTITY: Swizzle = Swizzle([Lane::X, Lane::Y, Lane::Z, Lane::W]);

    /// A swizzle replicating a single lane into all four.
    pub fn splat(lane: Lane) -> Self {
        Self([lane; 4])
    }

    /// Parses a one-letter (replicating) or four-letter swizzle.
    pub fn parse(s: &str) -> Result<Self> {
        let lanes: Vec<Lane> = s
            .chars()
            .map(Lane::from_char)
            .collect::<Option<_>>()
            .ok_or_else(|| KernelError::InvalidSwizzle(s.to_string()))?;

        match lanes.as_slice() {
            [lane] => Ok(Self::splat(*lane)),
            [a, b, c, d] => Ok(Self([*a, *b, *c, *d])),
            _ => Err(KernelError::InvalidSwizzle(s.to_string())),
        }
    }

    /// Reads `value` through this swizzle.
    pub fn apply(self, value: Vec4) -> Vec4 {
        let [a, b, c, d] = self.0;
        Vec4::new(value[a.index()], value[b.index()], value[c.index()], value[d.index()])
    }

    /// Returns whether this is the identity swizzle.
    pub fn is_identity(self) -> bool {
        self == Self::IDENTITY
    }
}

impl Default for Swizzle {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Display for Swizzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        if a == b && b == c && c == d {
            return write!(f, "{a}");
        }
        write!(f, "{a}{b}{c}{d}")
    }
}

/// The set of destination lanes an instruction writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteMask([bool; 4]);

impl WriteMask {
    /// Writes all four lanes.
    pub const ALL: WriteMask = WriteMask([true; 4]);

    /// Creates a mask writing exactly the given lanes.
    pub fn from_lanes(lanes: &[Lane]) -> Self {
        let mut mask = [false; 4];
        for lane in lanes {
            mask[lane.index()] = true;
        }
        Self(mask)
    }

    /// Parses a write mask; letters must be distinct and in `xyzw` order.
    pub fn parse(s: &str) -> Result<Self> {
        let mut mask = [false; 4];
        let mut last: Option<Lane> = None;
        for c in s.chars() {
            let lane = Lane::from_char(c).ok_or_else(|| KernelError::InvalidSwizzle(s.to_string()))?;
            if last.is_some_and(|prev| prev >= lane) {
                return Err(KernelError::InvalidSwizzle(s.to_string()));
            }
            mask[lane.index()] = true;
            last = Some(lane);
        }
        if last.is_none() {
            return Err(KernelError::InvalidSwizzle(s.to_string()));
        }
        Ok(Self(mask))
    }

    /// Returns whether `lane` is written.
    pub fn contains(self, lane: Lane) -> bool {
        self.0[lane.index()]
    }

    /// Returns the written lanes in register order.
    pub fn lanes(self) -> impl Iterator<Item = Lane> {
        Lane::ALL.into_iter().filter(move |lane| self.contains(*lane))
    }

    /// Merges `value` into `dst`, touching only the masked lanes.
    pub fn write(self, dst: Vec4, value: Vec4) -> Vec4 {
        let mut out = dst;
        for lane in self.lanes() {
            out[lane.index()] = value[lane.index()];
        }
        out
    }
}

impl Default for WriteMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Display for WriteMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for lane in self.lanes() {
            write!(f, "{lane}")?;
        }
        Ok(())
    }
}
