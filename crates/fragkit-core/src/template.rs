//! Kernel templates with named bindings.
//!
//! A kernel body is written once over abstract names (`{{ texCoord }}`,
//! `{{ out_result }}`, ...) and instantiated at each call site with that
//! site's registers. Binding problems are integration errors, reported when
//! the program is assembled rather than when it runs.

use std::collections::BTreeMap;

use crate::error::{KernelError, Result};
use crate::kernel::Dim;
use crate::lane::{Lane, Swizzle, WriteMask};
use crate::program::{is_identifier, Program};

/// Binding name of the texture coordinate input.
pub const TEX_COORD: &str = "texCoord";
/// Binding name of the fetched sample input.
pub const ORIGVAL: &str = "origval";
/// Binding name of the border value input.
pub const BORDERVAL: &str = "borderval";
/// Binding name of the output register.
pub const OUT_RESULT: &str = "out_result";

/// The three-dimensional border routine.
///
/// The upper-bound distances `1 - texCoord` are parked in `out_result.yzw`,
/// so only `out_result.x` is defined afterwards.
pub const TEXTURE_BORDER_SOURCE: &str = "\
# Emulates clamp-to-border sampling on a 3D texture coordinate.
#
# Inputs:  {{ texCoord }}, {{ origval }}.x, {{ borderval }}.x
# Output:  {{ out_result }}.x (yzw are scratch)
MOV {{ out_result }}.x, {{ origval }}.x;
CMP {{ out_result }}.x, {{ texCoord }}.x, {{ borderval }}.x, {{ out_result }}.x;
CMP {{ out_result }}.x, {{ texCoord }}.y, {{ borderval }}.x, {{ out_result }}.x;
CMP {{ out_result }}.x, {{ texCoord }}.z, {{ borderval }}.x, {{ out_result }}.x;
SUB {{ out_result }}.yzw, 1, {{ texCoord }}.xxyz;
CMP {{ out_result }}.x, {{ out_result }}.y, {{ borderval }}.x, {{ out_result }}.x;
CMP {{ out_result }}.x, {{ out_result }}.z, {{ borderval }}.x, {{ out_result }}.x;
CMP {{ out_result }}.x, {{ out_result }}.w, {{ borderval }}.x, {{ out_result }}.x;
";

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Param(String),
}

/// A kernel body parameterized over binding names.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelTemplate {
    name: String,
    segments: Vec<Segment>,
    parameters: Vec<String>,
}

impl KernelTemplate {
    /// Parses `source`, collecting its `{{ name }}` placeholders.
    pub fn new(name: impl Into<String>, source: &str) -> Result<Self> {
        let name = name.into();
        let segments = scan(&name, source)?;

        let mut parameters: Vec<String> = Vec::new();
        for segment in &segments {
            if let Segment::Param(param) = segment {
                if !parameters.contains(param) {
                    parameters.push(param.clone());
                }
            }
        }

        Ok(Self {
            name,
            segments,
            parameters,
        })
    }

    /// Returns the template name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter names in order of first appearance.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Substitutes `bindings` into the template body.
    pub fn instantiate(&self, bindings: &Bindings) -> Result<String> {
        if let Some(param) = self
            .parameters
            .iter()
            .find(|p| bindings.get(p).is_none())
        {
            return Err(KernelError::MissingBinding {
                template: self.name.clone(),
                param: param.clone(),
            });
        }
        if let Some(param) = bindings.names().find(|b| !self.parameters.iter().any(|p| p == b)) {
            return Err(KernelError::UnknownBinding {
                template: self.name.clone(),
                param: param.to_string(),
            });
        }

        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Param(param) => out.push_str(bindings.get(param).unwrap_or_default()),
            }
        }
        Ok(out)
    }

    /// Instantiates and parses the template.
    pub fn compile(&self, bindings: &Bindings) -> Result<Program> {
        let source = self.instantiate(bindings)?;
        log::debug!("compiling kernel template '{}'", self.name);
        Program::parse(&source)
    }
}

/// Parameter-to-register assignments for one call site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    map: BTreeMap<String, String>,
}

impl Bindings {
    /// Creates an empty binding set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `param` to `register`.
    pub fn bind(mut self, param: impl Into<String>, register: impl Into<String>) -> Self {
        self.map.insert(param.into(), register.into());
        self
    }

    /// Bindings for the border routine.
    pub fn border(tex_coord: &str, origval: &str, borderval: &str, out_result: &str) -> Self {
        Self::new()
            .bind(TEX_COORD, tex_coord)
            .bind(ORIGVAL, origval)
            .bind(BORDERVAL, borderval)
            .bind(OUT_RESULT, out_result)
    }

    /// Returns the register bound to `param`.
    pub fn get(&self, param: &str) -> Option<&str> {
        self.map.get(param).map(String::as_str)
    }

    /// Returns the bound parameter names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }
}

/// Generates the border routine for `dim` coordinate lanes.
///
/// The three-dimensional result is [`TEXTURE_BORDER_SOURCE`].
pub fn border_template(dim: Dim) -> KernelTemplate {
    let source = border_source(dim);
    let name = match dim {
        Dim::Three => "texture_border".to_string(),
        _ => format!("texture_border_{}d", dim.count()),
    };
    match KernelTemplate::new(name, &source) {
        Ok(template) => template,
        // Generated placeholders are always well formed.
        Err(e) => unreachable!("generated border template is malformed: {e}"),
    }
}

fn border_source(dim: Dim) -> String {
    const TC: &str = "{{ texCoord }}";
    const ORIG: &str = "{{ origval }}";
    const BORDER: &str = "{{ borderval }}";
    const OUT: &str = "{{ out_result }}";

    let lanes = dim.lanes();
    let scratch = &[Lane::Y, Lane::Z, Lane::W][..lanes.len()];

    let mut lines = vec![
        format!(
            "# Emulates clamp-to-border sampling on a {}D texture coordinate.",
            dim.count()
        ),
        "#".to_string(),
        format!("# Inputs:  {TC}, {ORIG}.x, {BORDER}.x"),
        format!("# Output:  {OUT}.x (yzw are scratch)"),
        format!("MOV {OUT}.x, {ORIG}.x;"),
    ];
    lines.extend(
        lanes
            .iter()
            .map(|lane| format!("CMP {OUT}.x, {TC}.{lane}, {BORDER}.x, {OUT}.x;")),
    );

    // Lane i of the subtraction lands in lane i of the destination, so the
    // source swizzle is offset by one to line coordinates up with yzw.
    let mut swizzle = [Lane::X; 4];
    for (i, slot) in swizzle.iter_mut().enumerate().skip(1) {
        *slot = lanes[(i - 1).min(lanes.len() - 1)];
    }
    lines.push(format!(
        "SUB {OUT}.{}, 1, {TC}.{};",
        WriteMask::from_lanes(scratch),
        Swizzle(swizzle)
    ));
    lines.extend(
        scratch
            .iter()
            .map(|lane| format!("CMP {OUT}.x, {OUT}.{lane}, {BORDER}.x, {OUT}.x;")),
    );

    let mut src = lines.join("\n");
    src.push('\n');
    src
}

fn scan(template: &str, source: &str) -> Result<Vec<Segment>> {
    let syntax = |message: String| KernelError::TemplateSyntax {
        template: template.to_string(),
        message,
    };

    let mut segments = Vec::new();
    let mut rest = source;
    while let Some(open) = rest.find("{{") {
        if open > 0 {
            segments.push(Segment::Text(rest[..open].to_string()));
        }
        let after = &rest[open + 2..];
        let close = after
            .find("}}")
            .ok_or_else(|| syntax("unterminated placeholder".into()))?;
        let param = after[..close].trim();
        if !is_identifier(param) {
            return Err(syntax(format!("invalid parameter name '{param}'")));
        }
        segments.push(Segment::Param(param.to_string()));
        rest = &after[close + 2..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest.to_string()));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{replace_border, BoundsGuard};
    use crate::program::RegisterFile;
    use glam::{Vec3, Vec4};
    use proptest::prelude::*;

    fn canonical() -> KernelTemplate {
        KernelTemplate::new("texture_border", TEXTURE_BORDER_SOURCE).unwrap()
    }

    #[test]
    fn test_parameters_in_first_appearance_order() {
        assert_eq!(
            canonical().parameters(),
            &[TEX_COORD, ORIGVAL, BORDERVAL, OUT_RESULT]
        );
    }

    #[test]
    fn test_generated_3d_matches_canonical() {
        assert_eq!(border_source(Dim::Three), TEXTURE_BORDER_SOURCE);
        assert_eq!(border_template(Dim::Three), canonical());
    }

    #[test]
    fn test_generated_lower_dims() {
        let src = border_source(Dim::Two);
        assert!(src.contains("SUB {{ out_result }}.yz, 1, {{ texCoord }}.xxyy;"));
        assert!(!src.contains(".w"));
        assert_eq!(border_template(Dim::One).name(), "texture_border_1d");
        assert!(border_source(Dim::One).contains("SUB {{ out_result }}.y, 1, {{ texCoord }}.x;"));
    }

    #[test]
    fn test_instantiate_substitutes_every_occurrence() {
        let text = canonical()
            .instantiate(&Bindings::border("tc", "fetched", "edge", "res"))
            .unwrap();
        assert!(!text.contains("{{"));
        assert!(text.contains("MOV res.x, fetched.x;"));
        assert!(text.contains("SUB res.yzw, 1, tc.xxyz;"));
    }

    #[test]
    fn test_missing_binding() {
        let bindings = Bindings::new()
            .bind(TEX_COORD, "tc")
            .bind(ORIGVAL, "v")
            .bind(OUT_RESULT, "r");
        let err = canonical().instantiate(&bindings).unwrap_err();
        assert!(matches!(err, KernelError::MissingBinding { param, .. } if param == BORDERVAL));
    }

    #[test]
    fn test_unknown_binding() {
        let bindings = Bindings::border("tc", "v", "b", "r").bind("texcoord", "oops");
        let err = canonical().instantiate(&bindings).unwrap_err();
        assert!(matches!(err, KernelError::UnknownBinding { param, .. } if param == "texcoord"));
    }

    #[test]
    fn test_placeholder_syntax() {
        let t = KernelTemplate::new("t", "MOV {{a}}, {{  b }};").unwrap();
        assert_eq!(t.parameters(), &["a", "b"]);

        let err = KernelTemplate::new("t", "MOV {{ a, b;").unwrap_err();
        assert!(matches!(err, KernelError::TemplateSyntax { .. }));

        let err = KernelTemplate::new("t", "MOV {{ 1a }}, b;").unwrap_err();
        assert!(matches!(err, KernelError::TemplateSyntax { .. }));
    }

    #[test]
    fn test_two_call_sites_share_one_body() {
        let template = canonical();
        let site_a = template.compile(&Bindings::border("tc0", "s0", "bv", "r0")).unwrap();
        let site_b = template.compile(&Bindings::border("tc1", "s1", "bv", "r1")).unwrap();

        let mut regs = RegisterFile::new()
            .with("tc0", Vec4::new(0.5, 0.5, 0.5, 0.0))
            .with("tc1", Vec4::new(0.5, 1.5, 0.5, 0.0))
            .with("s0", Vec4::splat(3.0))
            .with("s1", Vec4::splat(4.0))
            .with("bv", Vec4::splat(-1.0));
        site_a.execute(&mut regs).unwrap();
        site_b.execute(&mut regs).unwrap();

        assert_eq!(regs.get("r0").unwrap().x, 3.0);
        assert_eq!(regs.get("r1").unwrap().x, -1.0);
    }

    proptest! {
        #[test]
        fn prop_program_matches_kernels(
            c in prop::array::uniform3(-1.5f32..1.5),
            sample in -100.0f32..100.0,
            dim in 1usize..=3,
        ) {
            let dim = Dim::from_count(dim).unwrap();
            let program = border_template(dim)
                .compile(&Bindings::border("tc", "orig", "border", "out"))
                .unwrap();
            let coord = Vec3::from_array(c);
            let mut regs = RegisterFile::new()
                .with("tc", coord.extend(0.0))
                .with("orig", Vec4::splat(sample))
                .with("border", Vec4::splat(-1000.0));
            program.execute(&mut regs).unwrap();

            let out = regs.get("out").unwrap().x;
            prop_assert_eq!(out, BoundsGuard::new(dim).with_border(-1000.0).apply(coord, sample));
            if dim == Dim::Three {
                prop_assert_eq!(out, replace_border(coord, sample, -1000.0));
            }
        }
    }
}
