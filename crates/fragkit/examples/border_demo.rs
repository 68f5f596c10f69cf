//! Demo showing border replacement on a small volume.
//!
//! Samples a 4x4x4 ramp volume along a line that leaves the unit cube on both
//! ends, then guards the samples on the CPU and, if available, the GPU.
//! Run with `RUST_LOG=debug` to see kernel and dispatch logging.

use fragkit::*;

fn main() -> Result<()> {
    init();

    let dims = UVec3::splat(4);
    let data: Vec<f32> = (0..64).map(|i| i as f32).collect();
    let volume = Volume::new(dims, data)?;

    let coords: Vec<Vec3> = (0..=12)
        .map(|i| {
            let t = -0.25 + 1.5 * i as f32 / 12.0;
            Vec3::new(t, 0.5, 0.5)
        })
        .collect();
    let samples: Vec<f32> = coords
        .iter()
        .map(|&c| volume.fetch(c, WrapMode::Repeat, Interpolation::Linear))
        .collect();

    let options = KernelOptions::new().with_border_value(-1.0);
    let cpu = BorderReplacer::new(options.clone())?.apply(&coords, &samples)?;

    let gpu_replacer = BorderReplacer::new(options.with_backend(Backend::Gpu))?;
    let gpu = gpu_replacer.apply(&coords, &samples)?;
    let backend = if gpu_replacer.uses_gpu() { "gpu" } else { "cpu fallback" };

    println!("{:>8} {:>10} {:>10} {:>14}", "x", "fetched", "cpu", backend);
    for (((c, s), a), b) in coords.iter().zip(&samples).zip(&cpu).zip(&gpu) {
        println!("{:>8.3} {s:>10.3} {a:>10.3} {b:>14.3}", c.x);
    }

    // The same kernel as an instruction program
    let registry = KernelRegistry::new();
    let program = registry.instantiate(
        "texture_border",
        &Bindings::border("tc", "value", "border", "result"),
    )?;
    println!("\n{program}");

    Ok(())
}
