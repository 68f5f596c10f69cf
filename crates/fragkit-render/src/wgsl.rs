//! WGSL generation for bounds guards.
//!
//! The generated function always uses the select chain: WGSL `select` is
//! branch-free, which is what lockstep fragment and compute invocations need.
//! Border values are passed as a `vec3<f32>` with one lane per axis; a
//! uniform border is passed splatted.

use fragkit_core::{BoundsGuard, Side};

/// Emits `fn name(tex_coord: vec3<f32>, origval: f32, borderval: vec3<f32>) -> f32`.
pub fn emit_guard_fn(name: &str, guard: &BoundsGuard) -> String {
    let selects: String = guard
        .tests()
        .map(|test| {
            let cond = match test.side {
                Side::Lower => "tex_coord",
                Side::Upper => "upper",
            };
            format!(
                "    result = select(result, borderval.{axis}, {cond}.{axis} < 0.0);\n",
                axis = test.axis
            )
        })
        .collect();

    format!(
        "fn {name}(tex_coord: vec3<f32>, origval: f32, borderval: vec3<f32>) -> f32 {{
    let upper = vec3<f32>(1.0) - tex_coord;
    var result = origval;
{selects}    return result;
}}
"
    )
}

/// Emits the compute entry point applying `kernel_fn` to every sample.
///
/// Bindings: `0` samples (read-only storage), `1` parameters (uniform),
/// `2` results (read-write storage).
pub fn emit_compute_entry(kernel_fn: &str, entry_point: &str, workgroup_size: u32) -> String {
    format!(
        "struct GuardSample {{
    tex_coord: vec3<f32>,
    value: f32,
}}

struct GuardParams {{
    border: vec3<f32>,
    count: u32,
}}

@group(0) @binding(0) var<storage, read> samples: array<GuardSample>;
@group(0) @binding(1) var<uniform> params: GuardParams;
@group(0) @binding(2) var<storage, read_write> results: array<f32>;

@compute @workgroup_size({workgroup_size})
fn {entry_point}(@builtin(global_invocation_id) id: vec3<u32>) {{
    let i = id.x;
    if (i >= params.count) {{
        return;
    }}
    let s = samples[i];
    results[i] = {kernel_fn}(s.tex_coord, s.value, params.border);
}}
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use fragkit_core::{Dim, Lane};

    #[test]
    fn test_uniform_guard_uses_canonical_order() {
        let src = emit_guard_fn("guard", &BoundsGuard::new(Dim::Three));
        let selects: Vec<&str> = src.lines().filter(|l| l.contains("select(")).collect();
        assert_eq!(selects.len(), 6);
        assert!(selects[0].contains("tex_coord.x < 0.0"));
        assert!(selects[2].contains("tex_coord.z < 0.0"));
        assert!(selects[3].contains("upper.x < 0.0"));
        assert!(selects[5].contains("upper.z < 0.0"));
        assert!(src.starts_with(
            "fn guard(tex_coord: vec3<f32>, origval: f32, borderval: vec3<f32>) -> f32 {"
        ));
        assert!(!src.contains("if"));
    }

    #[test]
    fn test_per_axis_guard_is_axis_major() {
        let guard = BoundsGuard::new(Dim::Two).with_axis_border(Lane::X, 4.0);
        let src = emit_guard_fn("g2", &guard);
        let selects: Vec<&str> = src.lines().filter(|l| l.contains("select(")).collect();
        assert_eq!(selects.len(), 4);
        assert!(selects[0].contains("borderval.y, tex_coord.y"));
        assert!(selects[3].contains("borderval.x, upper.x"));
    }

    #[test]
    fn test_compute_entry() {
        let src = emit_compute_entry("guard", "main", 128);
        assert!(src.contains("@compute @workgroup_size(128)"));
        assert!(src.contains("fn main(@builtin(global_invocation_id) id: vec3<u32>)"));
        assert!(src.contains("results[i] = guard(s.tex_coord, s.value, params.border);"));
    }
}
