use bytemuck::{Pod, Zeroable};
use glam::{DMat4, Mat4};
use scene::{Camera, Frame, Lights, SceneSettings, SolidVertex};

/// CPU mirror of the WGSL `Scene` uniform block.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    /// World width, world height, elapsed seconds, shader-side sRGB encode flag.
    pub field: [f32; 4],
    pub mouse: [f32; 4],
    pub color_a: [f32; 4],
    pub color_b: [f32; 4],
    pub camera_position: [f32; 4],
    pub ambient: [f32; 4],
    /// Point light position and intensity.
    pub light: [f32; 4],
    /// sRGB base colour and roughness.
    pub material: [f32; 4],
    /// Metalness.
    pub surface: [f32; 4],
}

fn mat4(matrix: DMat4) -> [[f32; 4]; 4] {
    matrix.as_mat4().to_cols_array_2d()
}

impl SceneUniforms {
    /// Static part of the block: palette, lights, material and camera position.
    pub fn new(settings: &SceneSettings, encode_srgb: bool) -> Self {
        let palette = settings.palette;
        let material = settings.solid.material;
        let mut uniforms = Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
            field: [1.0, 1.0, 0.0, if encode_srgb { 1.0 } else { 0.0 }],
            mouse: [0.0; 4],
            color_a: palette.color_a.as_vec3().extend(1.0).to_array(),
            color_b: palette.color_b.as_vec3().extend(1.0).to_array(),
            camera_position: settings.camera.position().as_vec3().extend(1.0).to_array(),
            ambient: [0.0; 4],
            light: [0.0; 4],
            material: material
                .color
                .as_vec3()
                .extend(material.roughness as f32)
                .to_array(),
            surface: [material.metalness as f32, 0.0, 0.0, 0.0],
        };
        uniforms.set_lights(&settings.lights);
        uniforms
    }

    pub fn set_lights(&mut self, lights: &Lights) {
        self.ambient = [lights.ambient.intensity as f32, 0.0, 0.0, 0.0];
        self.light = lights
            .point
            .position
            .as_vec3()
            .extend(lights.point.intensity as f32)
            .to_array();
    }

    /// Writes one frame's time, pointer, viewport and solid pose.
    pub fn update(&mut self, frame: &Frame, camera: &Camera) {
        let scale = frame.uniforms.scale;
        self.view_proj = mat4(camera.view_projection(scale.aspect()));
        self.model = mat4(frame.transform.model_matrix());
        self.field[0] = scale.width as f32;
        self.field[1] = scale.height as f32;
        self.field[2] = frame.uniforms.time as f32;
        self.mouse[0] = frame.uniforms.mouse.x as f32;
        self.mouse[1] = frame.uniforms.mouse.y as f32;
    }
}

/// Interleaved solid vertex as uploaded to the GPU.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct GpuVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl GpuVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

impl From<&SolidVertex> for GpuVertex {
    fn from(vertex: &SolidVertex) -> Self {
        Self {
            position: vertex.position.as_vec3().to_array(),
            normal: vertex.normal.as_vec3().to_array(),
        }
    }
}
