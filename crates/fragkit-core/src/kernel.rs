//! Border-replacement kernels.
//!
//! These emulate clamp-to-border sampling for hardware that cannot clamp 3D
//! textures to a border colour: a value already fetched at a normalized
//! coordinate is kept when the coordinate lies inside the unit cube and is
//! replaced by a border value otherwise.
//!
//! The bounds test is inclusive. A coordinate of exactly `0.0` or `1.0` is
//! inside, because each test only fires on a strictly negative condition.
//!
//! [`replace_border`] is the fixed six-test routine. [`BoundsGuard`] is the
//! parameterized form used by call sites, with a choice of dimensionality,
//! per-axis border values and evaluation strategy.

use glam::{BVec3, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::lane::Lane;
use crate::select::{select_neg, select_neg4};

/// Which end of the unit interval a test guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Fires when the coordinate is below zero.
    Lower,
    /// Fires when the coordinate is above one.
    Upper,
}

/// A single bounds test on one coordinate lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AxisTest {
    pub axis: Lane,
    pub side: Side,
}

impl AxisTest {
    /// Test for `coord[axis] < 0`.
    pub const fn lower(axis: Lane) -> Self {
        Self {
            axis,
            side: Side::Lower,
        }
    }

    /// Test for `coord[axis] > 1`.
    pub const fn upper(axis: Lane) -> Self {
        Self {
            axis,
            side: Side::Upper,
        }
    }

    /// The value whose sign decides the test. Negative means out of bounds.
    #[inline]
    pub fn condition(self, tex_coord: Vec3) -> f32 {
        let c = tex_coord[self.axis.index()];
        match self.side {
            Side::Lower => c,
            Side::Upper => 1.0 - c,
        }
    }

    /// Returns whether this test rejects `tex_coord`.
    #[inline]
    pub fn fires(self, tex_coord: Vec3) -> bool {
        self.condition(tex_coord) < 0.0
    }
}

/// Lower tests on x, y, z followed by upper tests on x, y, z.
pub const CANONICAL_ORDER: [AxisTest; 6] = [
    AxisTest::lower(Lane::X),
    AxisTest::lower(Lane::Y),
    AxisTest::lower(Lane::Z),
    AxisTest::upper(Lane::X),
    AxisTest::upper(Lane::Y),
    AxisTest::upper(Lane::Z),
];

/// Returns `origval` if `tex_coord` lies in `[0, 1]` on all three axes,
/// `borderval` otherwise.
///
/// Evaluated as six chained select-on-sign operations with no branches, so it
/// is safe to run in lockstep across many samples.
#[inline]
pub fn replace_border(tex_coord: Vec3, origval: f32, borderval: f32) -> f32 {
    let mut result = origval;
    result = select_neg(tex_coord.x, borderval, result);
    result = select_neg(tex_coord.y, borderval, result);
    result = select_neg(tex_coord.z, borderval, result);

    let upper = Vec3::ONE - tex_coord;
    result = select_neg(upper.x, borderval, result);
    result = select_neg(upper.y, borderval, result);
    select_neg(upper.z, borderval, result)
}

/// Register-level form of [`replace_border`].
///
/// Only `.x` of the returned register is meaningful. The `yzw` lanes carry the
/// `1 - tex_coord` scratch values used for the upper-bound tests.
pub fn replace_border_register(tex_coord: Vec3, origval: Vec4, borderval: Vec4) -> Vec4 {
    let border = Vec4::splat(borderval.x);
    let mut out = Vec4::new(origval.x, 0.0, 0.0, 0.0);

    for lane in Lane::SPATIAL {
        let cond = Vec4::splat(tex_coord[lane.index()]);
        out.x = select_neg4(cond, border, out).x;
    }

    let upper = Vec3::ONE - tex_coord;
    out = Vec4::new(out.x, upper.x, upper.y, upper.z);

    for lane in [Lane::Y, Lane::Z, Lane::W] {
        let cond = Vec4::splat(out[lane.index()]);
        out.x = select_neg4(cond, border, out).x;
    }
    out
}

/// Runs the select chain over `order` instead of [`CANONICAL_ORDER`].
pub fn replace_border_ordered(
    tex_coord: Vec3,
    origval: f32,
    borderval: f32,
    order: &[AxisTest],
) -> f32 {
    order.iter().fold(origval, |running, test| {
        select_neg(test.condition(tex_coord), borderval, running)
    })
}

/// Returns whether the first `dim` lanes of `tex_coord` lie in `[0, 1]`.
pub fn is_in_bounds(tex_coord: Vec3, dim: Dim) -> bool {
    dim.lanes().iter().all(|&axis| {
        !AxisTest::lower(axis).fires(tex_coord) && !AxisTest::upper(axis).fires(tex_coord)
    })
}

/// Number of leading coordinate lanes a guard tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Dim {
    One,
    Two,
    #[default]
    Three,
}

impl Dim {
    /// Number of tested lanes.
    pub fn count(self) -> usize {
        match self {
            Dim::One => 1,
            Dim::Two => 2,
            Dim::Three => 3,
        }
    }

    /// The tested lanes, in axis order.
    pub fn lanes(self) -> &'static [Lane] {
        &Lane::SPATIAL[..self.count()]
    }

    /// Converts a lane count into a dimensionality.
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(Dim::One),
            2 => Some(Dim::Two),
            3 => Some(Dim::Three),
            _ => None,
        }
    }

    fn mask(self) -> BVec3 {
        let n = self.count();
        BVec3::new(n > 0, n > 1, n > 2)
    }
}

/// Replacement value(s) used when a coordinate is out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Border {
    /// One value regardless of which axis was violated.
    Uniform(f32),
    /// One value per axis. When several axes are violated the lowest axis
    /// wins (x over y over z).
    PerAxis(Vec3),
}

impl Border {
    /// The replacement value for a violation on `axis`.
    pub fn value(self, axis: Lane) -> f32 {
        match self {
            Border::Uniform(v) => v,
            Border::PerAxis(values) => values[axis.index()],
        }
    }

    /// Border values as a vector, one lane per axis.
    pub fn as_vec3(self) -> Vec3 {
        match self {
            Border::Uniform(v) => Vec3::splat(v),
            Border::PerAxis(values) => values,
        }
    }
}

impl Default for Border {
    fn default() -> Self {
        Border::Uniform(0.0)
    }
}

/// How a [`BoundsGuard`] evaluates its tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GuardStrategy {
    /// Sequential select-on-sign, one select per test.
    #[default]
    SelectChain,
    /// Per-axis violation magnitudes combined into one mask, then selected.
    ViolationMask,
    /// Plain scalar conditionals. Not suitable for lockstep execution.
    Branching,
}

/// A parameterized bounds-guarded sample kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsGuard {
    dim: Dim,
    border: Border,
    strategy: GuardStrategy,
}

impl BoundsGuard {
    /// Creates a guard over `dim` lanes with a zero uniform border.
    pub fn new(dim: Dim) -> Self {
        Self {
            dim,
            border: Border::default(),
            strategy: GuardStrategy::default(),
        }
    }

    /// Sets a uniform border value.
    pub fn with_border(mut self, value: f32) -> Self {
        self.border = Border::Uniform(value);
        self
    }

    /// Sets the border value used for violations on `axis`.
    ///
    /// The other axes keep their current value.
    pub fn with_axis_border(mut self, axis: Lane, value: f32) -> Self {
        let mut values = self.border.as_vec3();
        if let Some(slot) = Lane::SPATIAL.iter().position(|&l| l == axis) {
            values[slot] = value;
        }
        self.border = Border::PerAxis(values);
        self
    }

    /// Sets the evaluation strategy.
    pub fn with_strategy(mut self, strategy: GuardStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Returns the dimensionality.
    pub fn dim(&self) -> Dim {
        self.dim
    }

    /// Returns the border value(s).
    pub fn border(&self) -> Border {
        self.border
    }

    /// Returns the evaluation strategy.
    pub fn strategy(&self) -> GuardStrategy {
        self.strategy
    }

    /// The tests evaluated by the select chain, in order.
    ///
    /// A uniform border uses the canonical lower-then-upper order. Per-axis
    /// borders run axis-major from the highest axis down, so that the last
    /// firing test, and therefore the winning border value, belongs to the
    /// lowest violated axis.
    pub fn tests(&self) -> impl Iterator<Item = AxisTest> {
        let lanes = self.dim.lanes();
        let n = lanes.len();
        let mut order = [AxisTest::lower(Lane::X); 6];
        match self.border {
            Border::Uniform(_) => {
                for (i, &axis) in lanes.iter().enumerate() {
                    order[i] = AxisTest::lower(axis);
                    order[i + n] = AxisTest::upper(axis);
                }
            }
            Border::PerAxis(_) => {
                for (i, &axis) in lanes.iter().rev().enumerate() {
                    order[2 * i] = AxisTest::lower(axis);
                    order[2 * i + 1] = AxisTest::upper(axis);
                }
            }
        }
        order.into_iter().take(2 * n)
    }

    /// Returns `sample` if `tex_coord` is in bounds, otherwise the border.
    #[inline]
    pub fn apply(&self, tex_coord: Vec3, sample: f32) -> f32 {
        match self.strategy {
            GuardStrategy::SelectChain => self.apply_chain(tex_coord, sample),
            GuardStrategy::ViolationMask => self.apply_mask(tex_coord, sample),
            GuardStrategy::Branching => self.apply_branching(tex_coord, sample),
        }
    }

    /// Returns whether `tex_coord` is in bounds on the guarded lanes.
    pub fn contains(&self, tex_coord: Vec3) -> bool {
        is_in_bounds(tex_coord, self.dim)
    }

    fn apply_chain(&self, tex_coord: Vec3, sample: f32) -> f32 {
        self.tests().fold(sample, |running, test| {
            select_neg(
                test.condition(tex_coord),
                self.border.value(test.axis),
                running,
            )
        })
    }

    fn apply_mask(&self, tex_coord: Vec3, sample: f32) -> f32 {
        // Positive exactly when the axis is out of bounds.
        let violation = (-tex_coord).max(tex_coord - Vec3::ONE);
        let violation = Vec3::select(self.dim.mask(), violation, Vec3::NEG_INFINITY);

        match self.border {
            Border::Uniform(border) => select_neg(-violation.max_element(), border, sample),
            Border::PerAxis(values) => self
                .dim
                .lanes()
                .iter()
                .rev()
                .fold(sample, |running, &axis| {
                    let i = axis.index();
                    select_neg(-violation[i], values[i], running)
                }),
        }
    }

    fn apply_branching(&self, tex_coord: Vec3, sample: f32) -> f32 {
        for &axis in self.dim.lanes() {
            if AxisTest::lower(axis).fires(tex_coord) || AxisTest::upper(axis).fires(tex_coord) {
                return self.border.value(axis);
            }
        }
        sample
    }
}

impl Default for BoundsGuard {
    fn default() -> Self {
        Self::new(Dim::Three)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ORIG: f32 = 10.0;
    const BORDER: f32 = -1.0;

    const STRATEGIES: [GuardStrategy; 3] = [
        GuardStrategy::SelectChain,
        GuardStrategy::ViolationMask,
        GuardStrategy::Branching,
    ];

    fn scenarios() -> [(Vec3, f32); 6] {
        [
            (Vec3::new(0.5, 0.5, 0.5), ORIG),
            (Vec3::new(0.0, 0.5, 1.0), ORIG),
            (Vec3::new(-0.01, 0.5, 0.5), BORDER),
            (Vec3::new(0.5, 1.01, 0.5), BORDER),
            (Vec3::new(-5.0, 5.0, 0.5), BORDER),
            (Vec3::new(1.0, 1.0, 1.0), ORIG),
        ]
    }

    #[test]
    fn test_replace_border_scenarios() {
        for (coord, expected) in scenarios() {
            assert_eq!(replace_border(coord, ORIG, BORDER), expected, "{coord}");
        }
    }

    #[test]
    fn test_guard_scenarios_all_strategies() {
        for strategy in STRATEGIES {
            let guard = BoundsGuard::new(Dim::Three)
                .with_border(BORDER)
                .with_strategy(strategy);
            for (coord, expected) in scenarios() {
                assert_eq!(guard.apply(coord, ORIG), expected, "{strategy:?} {coord}");
            }
        }
    }

    #[test]
    fn test_register_form_matches_scalar() {
        for (coord, expected) in scenarios() {
            let out = replace_border_register(coord, Vec4::new(ORIG, 1.0, 2.0, 3.0), Vec4::splat(BORDER));
            assert_eq!(out.x, expected);
            assert_eq!(out.w, 1.0 - coord.z);
        }
    }

    #[test]
    fn test_negative_zero_is_in_bounds() {
        assert_eq!(replace_border(Vec3::new(-0.0, 0.5, 0.5), ORIG, BORDER), ORIG);
        for strategy in STRATEGIES {
            let guard = BoundsGuard::default().with_border(BORDER).with_strategy(strategy);
            assert_eq!(guard.apply(Vec3::new(0.5, -0.0, 0.5), ORIG), ORIG);
        }
    }

    #[test]
    fn test_lower_dims_ignore_trailing_lanes() {
        let guard = BoundsGuard::new(Dim::One).with_border(BORDER);
        assert_eq!(guard.apply(Vec3::new(0.5, 7.0, -3.0), ORIG), ORIG);
        assert_eq!(guard.apply(Vec3::new(1.5, 0.5, 0.5), ORIG), BORDER);

        let guard = BoundsGuard::new(Dim::Two).with_border(BORDER);
        assert_eq!(guard.apply(Vec3::new(0.5, 0.5, 9.0), ORIG), ORIG);
        assert_eq!(guard.apply(Vec3::new(0.5, -0.5, 0.5), ORIG), BORDER);
    }

    #[test]
    fn test_tests_order() {
        let uniform: Vec<_> = BoundsGuard::new(Dim::Three).tests().collect();
        assert_eq!(uniform, CANONICAL_ORDER.to_vec());

        let per_axis: Vec<_> = BoundsGuard::new(Dim::Two)
            .with_axis_border(Lane::X, 1.0)
            .tests()
            .collect();
        assert_eq!(
            per_axis,
            vec![
                AxisTest::lower(Lane::Y),
                AxisTest::upper(Lane::Y),
                AxisTest::lower(Lane::X),
                AxisTest::upper(Lane::X),
            ]
        );
    }

    #[test]
    fn test_per_axis_lowest_axis_wins() {
        let base = BoundsGuard::new(Dim::Three)
            .with_axis_border(Lane::X, 100.0)
            .with_axis_border(Lane::Y, 200.0)
            .with_axis_border(Lane::Z, 300.0);
        assert_eq!(base.border(), Border::PerAxis(Vec3::new(100.0, 200.0, 300.0)));

        for strategy in STRATEGIES {
            let guard = base.with_strategy(strategy);
            assert_eq!(guard.apply(Vec3::new(0.5, 0.5, 0.5), ORIG), ORIG);
            assert_eq!(guard.apply(Vec3::new(0.5, 0.5, 1.5), ORIG), 300.0);
            assert_eq!(guard.apply(Vec3::new(0.5, -1.0, 1.5), ORIG), 200.0);
            assert_eq!(guard.apply(Vec3::new(2.0, 0.5, -1.5), ORIG), 100.0);
        }
    }

    #[test]
    fn test_axis_border_keeps_previous_uniform() {
        let guard = BoundsGuard::default()
            .with_border(5.0)
            .with_axis_border(Lane::Z, 9.0);
        assert_eq!(guard.border().as_vec3(), Vec3::new(5.0, 5.0, 9.0));
        // w is not a spatial lane
        let guard = guard.with_axis_border(Lane::W, 1.0);
        assert_eq!(guard.border().as_vec3(), Vec3::new(5.0, 5.0, 9.0));
    }

    #[test]
    fn test_dim_helpers() {
        assert_eq!(Dim::from_count(2), Some(Dim::Two));
        assert_eq!(Dim::from_count(4), None);
        assert_eq!(Dim::Two.lanes(), &[Lane::X, Lane::Y]);
    }

    fn axis_value() -> impl Strategy<Value = f32> {
        prop_oneof![Just(0.0f32), Just(1.0f32), 0.001f32..0.999f32]
    }

    fn out_of_range() -> impl Strategy<Value = f32> {
        prop_oneof![-100.0f32..-1e-4f32, 1.0001f32..100.0f32]
    }

    proptest! {
        #[test]
        fn prop_interior_keeps_sample(x in 1e-6f32..1.0, y in 1e-6f32..1.0, z in 1e-6f32..1.0, v in -1e6f32..1e6) {
            let coord = Vec3::new(x, y, z);
            prop_assert_eq!(replace_border(coord, v, BORDER), v);
        }

        #[test]
        fn prop_boundary_is_inclusive(x in axis_value(), y in axis_value(), z in axis_value()) {
            let coord = Vec3::new(x, y, z);
            prop_assert_eq!(replace_border(coord, ORIG, BORDER), ORIG);
            prop_assert!(is_in_bounds(coord, Dim::Three));
        }

        #[test]
        fn prop_exterior_uses_border(
            axis in 0usize..3,
            bad in out_of_range(),
            others in prop::array::uniform3(-10.0f32..10.0),
        ) {
            let mut coord = Vec3::from_array(others);
            coord[axis] = bad;
            prop_assert_eq!(replace_border(coord, ORIG, BORDER), BORDER);
            prop_assert!(!is_in_bounds(coord, Dim::Three));
        }

        #[test]
        fn prop_deterministic(c in prop::array::uniform3(-2.0f32..2.0), v in -10.0f32..10.0) {
            let coord = Vec3::from_array(c);
            let first = replace_border(coord, v, BORDER);
            prop_assert_eq!(first, replace_border(coord, v, BORDER));
        }

        #[test]
        fn prop_order_independent(
            c in prop::array::uniform3(-2.0f32..2.0),
            order in Just(CANONICAL_ORDER.to_vec()).prop_shuffle(),
        ) {
            let coord = Vec3::from_array(c);
            prop_assert_eq!(
                replace_border_ordered(coord, ORIG, BORDER, &order),
                replace_border(coord, ORIG, BORDER)
            );
        }

        #[test]
        fn prop_strategies_agree(
            c in prop::array::uniform3(-2.0f32..2.0),
            borders in prop::array::uniform3(-50.0f32..0.0),
            dim in 1usize..=3,
            per_axis in any::<bool>(),
        ) {
            let coord = Vec3::from_array(c);
            let dim = Dim::from_count(dim).unwrap();
            let mut guard = BoundsGuard::new(dim).with_border(borders[0]);
            if per_axis {
                guard = guard
                    .with_axis_border(Lane::Y, borders[1])
                    .with_axis_border(Lane::Z, borders[2]);
            }
            let reference = guard.apply(coord, ORIG);
            for strategy in STRATEGIES {
                prop_assert_eq!(guard.with_strategy(strategy).apply(coord, ORIG), reference);
            }
            prop_assert_eq!(reference == ORIG, guard.contains(coord));
        }
    }
}
