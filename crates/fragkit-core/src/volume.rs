//! Scalar volumes and the texture fetch that feeds the border kernels.
//!
//! The fetch has its own boundary handling ([`WrapMode`]), which never
//! reports "outside". Guarding a fetch with a [`BoundsGuard`] re-derives the
//! in/out status from the coordinate, so edge texels are not repeated past
//! the volume faces.

use glam::{UVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};
use crate::kernel::BoundsGuard;

/// Boundary handling of the fetch itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WrapMode {
    /// Out-of-range texel indices read the nearest edge texel.
    #[default]
    ClampToEdge,
    /// Texel indices wrap around.
    Repeat,
}

/// Texel filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Interpolation {
    #[default]
    Nearest,
    /// Trilinear interpolation between texel centres.
    Linear,
}

/// A dense scalar volume, x fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    dims: UVec3,
    data: Vec<f32>,
}

impl Volume {
    /// Creates a volume from `x * y * z` values.
    pub fn new(dims: UVec3, data: Vec<f32>) -> Result<Self> {
        if dims.min_element() == 0 {
            return Err(KernelError::EmptyVolume(dims.x, dims.y, dims.z));
        }
        // A product that overflows can never match an allocated length.
        let expected = (dims.x as usize)
            .checked_mul(dims.y as usize)
            .and_then(|n| n.checked_mul(dims.z as usize))
            .unwrap_or(usize::MAX);
        if data.len() != expected {
            return Err(KernelError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { dims, data })
    }

    /// Returns the volume dimensions.
    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    /// Returns the raw values.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the texel at `(x, y, z)`, if in range.
    pub fn get(&self, x: u32, y: u32, z: u32) -> Option<f32> {
        if x >= self.dims.x || y >= self.dims.y || z >= self.dims.z {
            return None;
        }
        Some(self.data[self.index(x, y, z)])
    }

    fn index(&self, x: u32, y: u32, z: u32) -> usize {
        x as usize + self.dims.x as usize * (y as usize + self.dims.y as usize * z as usize)
    }

    fn texel(&self, i: [i64; 3], wrap: WrapMode) -> f32 {
        let x = wrap_index(i[0], self.dims.x, wrap);
        let y = wrap_index(i[1], self.dims.y, wrap);
        let z = wrap_index(i[2], self.dims.z, wrap);
        self.data[self.index(x, y, z)]
    }

    /// Nearest-texel fetch at a normalized coordinate.
    pub fn fetch_nearest(&self, coord: Vec3, wrap: WrapMode) -> f32 {
        let p = (coord * self.dims.as_vec3()).floor();
        self.texel([p.x as i64, p.y as i64, p.z as i64], wrap)
    }

    /// Trilinear fetch at a normalized coordinate.
    pub fn fetch_linear(&self, coord: Vec3, wrap: WrapMode) -> f32 {
        let p = coord * self.dims.as_vec3() - Vec3::splat(0.5);
        let base = p.floor();
        let t = p - base;
        let [x0, y0, z0] = [base.x as i64, base.y as i64, base.z as i64];

        let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
        let row = |y: i64, z: i64| {
            lerp(
                self.texel([x0, y, z], wrap),
                self.texel([x0.saturating_add(1), y, z], wrap),
                t.x,
            )
        };
        let plane = |z: i64| lerp(row(y0, z), row(y0.saturating_add(1), z), t.y);
        lerp(plane(z0), plane(z0.saturating_add(1)), t.z)
    }

    /// Fetches with the given filtering.
    pub fn fetch(&self, coord: Vec3, wrap: WrapMode, interpolation: Interpolation) -> f32 {
        match interpolation {
            Interpolation::Nearest => self.fetch_nearest(coord, wrap),
            Interpolation::Linear => self.fetch_linear(coord, wrap),
        }
    }

    /// Fetches, then replaces the value with the guard's border when the
    /// coordinate lies outside the volume.
    pub fn sample_guarded(
        &self,
        coord: Vec3,
        wrap: WrapMode,
        interpolation: Interpolation,
        guard: &BoundsGuard,
    ) -> f32 {
        guard.apply(coord, self.fetch(coord, wrap, interpolation))
    }
}

fn wrap_index(i: i64, len: u32, wrap: WrapMode) -> u32 {
    let len = i64::from(len);
    let mapped = match wrap {
        WrapMode::ClampToEdge => i.clamp(0, len - 1),
        WrapMode::Repeat => i.rem_euclid(len),
    };
    // In [0, len) after either mapping.
    u32::try_from(mapped).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Dim;

    fn ramp() -> Volume {
        // 4 x 2 x 1, value = x + 10 * y
        Volume::new(
            UVec3::new(4, 2, 1),
            vec![0.0, 1.0, 2.0, 3.0, 10.0, 11.0, 12.0, 13.0],
        )
        .unwrap()
    }

    #[test]
    fn test_new_validates_size() {
        let err = Volume::new(UVec3::new(2, 2, 2), vec![0.0; 7]).unwrap_err();
        assert!(matches!(err, KernelError::SizeMismatch { expected: 8, actual: 7 }));

        let err = Volume::new(UVec3::new(2, 0, 2), vec![]).unwrap_err();
        assert!(matches!(err, KernelError::EmptyVolume(2, 0, 2)));
    }

    #[test]
    fn test_get() {
        let v = ramp();
        assert_eq!(v.get(3, 1, 0), Some(13.0));
        assert_eq!(v.get(4, 0, 0), None);
    }

    #[test]
    fn test_nearest_wrap_modes() {
        let v = ramp();
        assert_eq!(v.fetch_nearest(Vec3::new(0.3, 0.2, 0.5), WrapMode::ClampToEdge), 1.0);
        // Exactly 1.0 lands past the last texel and is clamped onto it.
        assert_eq!(v.fetch_nearest(Vec3::new(1.0, 0.9, 0.5), WrapMode::ClampToEdge), 13.0);
        assert_eq!(v.fetch_nearest(Vec3::new(-0.5, 0.2, 0.5), WrapMode::ClampToEdge), 0.0);
        assert_eq!(v.fetch_nearest(Vec3::new(1.1, 0.2, 0.5), WrapMode::Repeat), 0.0);
        assert_eq!(v.fetch_nearest(Vec3::new(-0.1, 0.2, 0.5), WrapMode::Repeat), 3.0);
    }

    #[test]
    fn test_linear_interpolates_between_centres() {
        let v = ramp();
        // Halfway between texel centres x = 1 and x = 2 on row y = 0.
        let value = v.fetch_linear(Vec3::new(0.5, 0.25, 0.5), WrapMode::ClampToEdge);
        assert!((value - 1.5).abs() < 1e-6);
        // Halfway between the two rows.
        let value = v.fetch_linear(Vec3::new(0.125, 0.5, 0.5), WrapMode::ClampToEdge);
        assert!((value - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_guarded_sample_does_not_repeat_edge() {
        let v = ramp();
        let guard = BoundsGuard::new(Dim::Three).with_border(-1.0);
        let outside = Vec3::new(1.2, 0.5, 0.5);

        assert_eq!(v.fetch_nearest(outside, WrapMode::ClampToEdge), 13.0);
        for interp in [Interpolation::Nearest, Interpolation::Linear] {
            for wrap in [WrapMode::ClampToEdge, WrapMode::Repeat] {
                assert_eq!(v.sample_guarded(outside, wrap, interp, &guard), -1.0);
            }
        }

        let face = Vec3::new(1.0, 1.0, 0.0);
        assert_eq!(
            v.sample_guarded(face, WrapMode::ClampToEdge, Interpolation::Nearest, &guard),
            13.0
        );
    }

    #[test]
    fn test_far_coordinates_are_guarded() {
        let v = Volume::new(UVec3::splat(2), vec![5.0; 8]).unwrap();
        let guard = BoundsGuard::new(Dim::Three).with_border(-1.0);
        let far = [
            Vec3::new(1e30, 0.5, 0.5),
            Vec3::new(0.5, -1e30, 0.5),
            Vec3::new(0.5, 0.5, f32::INFINITY),
            Vec3::new(f32::NEG_INFINITY, 1e30, -1e30),
        ];
        for coord in far {
            for interp in [Interpolation::Nearest, Interpolation::Linear] {
                for wrap in [WrapMode::ClampToEdge, WrapMode::Repeat] {
                    assert_eq!(
                        v.sample_guarded(coord, wrap, interp, &guard),
                        -1.0,
                        "{coord} {wrap:?} {interp:?}"
                    );
                }
            }
        }
        // Edge texel read without a guard
        assert_eq!(
            v.fetch(Vec3::new(1e30, 0.5, 0.5), WrapMode::ClampToEdge, Interpolation::Linear),
            5.0
        );
    }

    #[test]
    fn test_new_rejects_overflowing_dims() {
        let err = Volume::new(UVec3::splat(u32::MAX), vec![0.0; 8]).unwrap_err();
        assert!(matches!(
            err,
            KernelError::SizeMismatch {
                expected: usize::MAX,
                actual: 8
            }
        ));
    }
}
