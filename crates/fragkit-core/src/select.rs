//! Select-on-sign primitives.
//!
//! `select_neg(c, a, b)` yields `a` where `c < 0` and `b` otherwise. This is
//! the compare instruction of fixed-function fragment hardware and the only
//! conditional the kernels use. Negative zero is not negative.

use glam::Vec4;

/// Returns `if_neg` when `cond < 0.0`, otherwise `otherwise`.
#[inline]
pub fn select_neg(cond: f32, if_neg: f32, otherwise: f32) -> f32 {
    // Lowered to a compare + select, no branch.
    if cond < 0.0 {
        if_neg
    } else {
        otherwise
    }
}

/// Lane-wise [`select_neg`].
#[inline]
pub fn select_neg4(cond: Vec4, if_neg: Vec4, otherwise: Vec4) -> Vec4 {
    Vec4::select(cond.cmplt(Vec4::ZERO), if_neg, otherwise)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_neg_scalar() {
        assert_eq!(select_neg(-0.5, 1.0, 2.0), 1.0);
        assert_eq!(select_neg(0.5, 1.0, 2.0), 2.0);
        assert_eq!(select_neg(0.0, 1.0, 2.0), 2.0);
        assert_eq!(select_neg(-0.0, 1.0, 2.0), 2.0);
    }

    #[test]
    fn test_select_neg_lanes() {
        let out = select_neg4(
            Vec4::new(-1.0, 0.0, 1.0, -0.0),
            Vec4::splat(7.0),
            Vec4::new(1.0, 2.0, 3.0, 4.0),
        );
        assert_eq!(out, Vec4::new(7.0, 2.0, 3.0, 4.0));
    }
}
