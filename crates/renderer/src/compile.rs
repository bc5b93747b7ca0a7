use std::borrow::Cow;

/// Compiles the full-viewport field shader.
pub(crate) fn compile_field_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("field shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Owned(with_prelude(FIELD_BODY))),
    })
}

/// Compiles the lit, deforming solid shader.
pub(crate) fn compile_solid_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("solid shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Owned(with_prelude(SOLID_BODY))),
    })
}

/// Prepends the shared uniform block and colour helpers to a shader body.
fn with_prelude(body: &str) -> String {
    let mut source = String::with_capacity(PRELUDE.len() + body.len() + 1);
    source.push_str(PRELUDE);
    source.push('\n');
    source.push_str(body);
    source
}

/// Uniform block shared by both pipelines.
///
/// The layout must match `SceneUniforms` in `gpu/uniforms.rs`. `field.w` is 1
/// when the swapchain is not sRGB and the shaders encode themselves.
const PRELUDE: &str = r"struct Scene {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    field: vec4<f32>,
    mouse: vec4<f32>,
    color_a: vec4<f32>,
    color_b: vec4<f32>,
    camera_position: vec4<f32>,
    ambient: vec4<f32>,
    light: vec4<f32>,
    material: vec4<f32>,
    surface: vec4<f32>,
};

@group(0) @binding(0) var<uniform> scene: Scene;

fn srgb_to_linear(c: vec3<f32>) -> vec3<f32> {
    let lo = c / 12.92;
    let hi = pow((c + vec3<f32>(0.055)) / 1.055, vec3<f32>(2.4));
    return select(hi, lo, c <= vec3<f32>(0.04045));
}

fn linear_to_srgb(c: vec3<f32>) -> vec3<f32> {
    let x = clamp(c, vec3<f32>(0.0), vec3<f32>(1.0));
    let lo = x * 12.92;
    let hi = 1.055 * pow(x, vec3<f32>(1.0 / 2.4)) - vec3<f32>(0.055);
    return select(hi, lo, x <= vec3<f32>(0.0031308));
}
";

/// Quad at z = 0 scaled to the viewport's world extent; mirrors
/// `scene::ColorField::intensity_at`.
const FIELD_BODY: &str = r"struct FieldOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> FieldOut {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, -0.5),
        vec2<f32>(0.5, 0.5),
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, 0.5),
        vec2<f32>(-0.5, 0.5),
    );
    let corner = corners[index];
    let world = vec4<f32>(corner * scene.field.xy, 0.0, 1.0);

    var out: FieldOut;
    out.clip = scene.view_proj * world;
    out.uv = corner + vec2<f32>(0.5);
    return out;
}

@fragment
fn fs_main(in: FieldOut) -> @location(0) vec4<f32> {
    let t = scene.field.z * 0.15;
    let m = scene.mouse.xy * 0.1;
    let s = sin(in.uv.x * 8.0 + t + m.x * 12.0) + sin(in.uv.y * 6.0 - t + m.y * 12.0);
    let k = smoothstep(0.0, 1.0, s * 0.5 + 0.5);
    var color = mix(scene.color_a.rgb, scene.color_b.rgb, vec3<f32>(k));
    if (scene.field.w < 0.5) {
        color = srgb_to_linear(color);
    }
    return vec4<f32>(color, 1.0);
}
";

/// Blinn-Phong approximation of a metal/roughness material under one ambient
/// and one point light.
const SOLID_BODY: &str = r"struct SolidIn {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct SolidOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) world: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

const PI: f32 = 3.14159265;

@vertex
fn vs_main(vertex: SolidIn) -> SolidOut {
    let world = scene.model * vec4<f32>(vertex.position, 1.0);

    var out: SolidOut;
    out.clip = scene.view_proj * world;
    out.world = world.xyz;
    out.normal = (scene.model * vec4<f32>(vertex.normal, 0.0)).xyz;
    return out;
}

@fragment
fn fs_main(in: SolidOut) -> @location(0) vec4<f32> {
    let base = srgb_to_linear(scene.material.rgb);
    let roughness = clamp(scene.material.w, 0.02, 1.0);
    let metalness = clamp(scene.surface.x, 0.0, 1.0);

    let n = normalize(in.normal);
    let v = normalize(scene.camera_position.xyz - in.world);
    let l = normalize(scene.light.xyz - in.world);
    let h = normalize(l + v);
    let n_dot_l = max(dot(n, l), 0.0);
    let n_dot_h = max(dot(n, h), 0.0);

    let shininess = 2.0 / (roughness * roughness) - 2.0;
    let specular_color = mix(vec3<f32>(0.04), base, vec3<f32>(metalness));
    let diffuse = base * (1.0 - metalness) * n_dot_l;
    let specular = specular_color * pow(n_dot_h, shininess) * ((shininess + 8.0) / (8.0 * PI)) * n_dot_l;

    var color = base * scene.ambient.x + (diffuse + specular) * scene.light.w;
    if (scene.field.w > 0.5) {
        color = linear_to_srgb(color);
    }
    return vec4<f32>(color, 1.0);
}
";

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};

    fn validate(source: &str) {
        let module = wgpu::naga::front::wgsl::parse_str(source).expect("shader parses");
        Validator::new(ValidationFlags::all(), Capabilities::all())
            .validate(&module)
            .expect("shader validates");
    }

    #[test]
    fn field_shader_is_valid_wgsl() {
        validate(&with_prelude(FIELD_BODY));
    }

    #[test]
    fn solid_shader_is_valid_wgsl() {
        validate(&with_prelude(SOLID_BODY));
    }

    #[test]
    fn prelude_declares_every_uniform_field() {
        for field in [
            "view_proj", "model", "field", "mouse", "color_a", "color_b",
            "camera_position", "ambient", "light", "material", "surface",
        ] {
            assert!(PRELUDE.contains(&format!("{field}: ")), "missing {field}");
        }
    }
}
