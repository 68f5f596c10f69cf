//! Applying a guard across many samples on the CPU.
//!
//! Each sample is processed independently; nothing here depends on the
//! order in which samples are visited.

use glam::Vec3;

use crate::error::{KernelError, Result};
use crate::kernel::BoundsGuard;

fn check_lengths(coords: usize, samples: usize) -> Result<()> {
    if coords != samples {
        return Err(KernelError::SizeMismatch {
            expected: coords,
            actual: samples,
        });
    }
    Ok(())
}

/// Returns the guarded value of every `(coord, sample)` pair.
pub fn guard_samples(guard: &BoundsGuard, coords: &[Vec3], samples: &[f32]) -> Result<Vec<f32>> {
    check_lengths(coords.len(), samples.len())?;
    Ok(coords
        .iter()
        .zip(samples)
        .map(|(&coord, &sample)| guard.apply(coord, sample))
        .collect())
}

/// Replaces out-of-bounds samples with the guard's border, in place.
pub fn guard_samples_in_place(
    guard: &BoundsGuard,
    coords: &[Vec3],
    samples: &mut [f32],
) -> Result<()> {
    check_lengths(coords.len(), samples.len())?;
    for (&coord, sample) in coords.iter().zip(samples.iter_mut()) {
        *sample = guard.apply(coord, *sample);
    }
    Ok(())
}
