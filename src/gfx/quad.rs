//! GL quad presenter
//!
//! Owns the shader program, the static full-screen quad and the single
//! frame texture. Each presented frame fully replaces the texture
//! contents; the draw is one indexed call over two triangles.

use eframe::glow::{self, HasContext};
use thiserror::Error;

const VERTEX_SHADER: &str = r#"#version 330 core
layout (location = 0) in vec3 a_pos;
layout (location = 1) in vec2 a_tex;
out vec2 v_tex;
void main() {
    gl_Position = vec4(a_pos, 1.0);
    v_tex = a_tex;
}
"#;

const FRAGMENT_SHADER: &str = r#"#version 330 core
in vec2 v_tex;
out vec4 frag_color;
uniform sampler2D u_frame;
void main() {
    frag_color = texture(u_frame, v_tex);
}
"#;

/// Interleaved position (xyz) + texcoord (uv), one row per vertex.
/// Texture V is flipped: decoded frames have a top-left origin while GL
/// samples from the bottom left.
const VERTICES: [f32; 20] = [
    -1.0, 1.0, 0.0, 0.0, 0.0, // top left
    -1.0, -1.0, 0.0, 0.0, 1.0, // bottom left
    1.0, -1.0, 0.0, 1.0, 1.0, // bottom right
    1.0, 1.0, 0.0, 1.0, 0.0, // top right
];

/// Two triangles covering the quad.
const INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// GPU setup failures. All are startup-fatal; GL calls after a
/// successful link are not checked.
#[derive(Debug, Error)]
pub enum GfxError {
    #[error("shader compilation failed: {0}")]
    ShaderCompile(String),

    #[error("shader program link failed: {0}")]
    ProgramLink(String),

    #[error("gl object allocation failed: {0}")]
    Allocate(String),
}

/// The textured quad a video frame is presented on.
pub struct VideoQuad {
    program: glow::Program,
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ebo: glow::Buffer,
    texture: glow::Texture,
}

impl VideoQuad {
    /// Compile the shader pair, build the static quad and create the
    /// frame texture (linear filtering, repeat wrap, no mipmaps).
    pub fn new(gl: &glow::Context) -> Result<Self, GfxError> {
        unsafe {
            let vertex = compile_shader(gl, glow::VERTEX_SHADER, VERTEX_SHADER)?;
            let fragment = compile_shader(gl, glow::FRAGMENT_SHADER, FRAGMENT_SHADER)?;

            let program = gl.create_program().map_err(GfxError::Allocate)?;
            gl.attach_shader(program, vertex);
            gl.attach_shader(program, fragment);
            gl.link_program(program);

            // Shader objects are no longer needed once linked.
            gl.detach_shader(program, vertex);
            gl.detach_shader(program, fragment);
            gl.delete_shader(vertex);
            gl.delete_shader(fragment);

            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(GfxError::ProgramLink(log));
            }

            let vao = gl.create_vertex_array().map_err(GfxError::Allocate)?;
            let vbo = gl.create_buffer().map_err(GfxError::Allocate)?;
            let ebo = gl.create_buffer().map_err(GfxError::Allocate)?;

            gl.bind_vertex_array(Some(vao));

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&VERTICES),
                glow::STATIC_DRAW,
            );

            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(&INDICES),
                glow::STATIC_DRAW,
            );

            let stride = 5 * std::mem::size_of::<f32>() as i32;
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(1, 2, glow::FLOAT, false, stride, 3 * 4);
            gl.enable_vertex_attrib_array(1);

            let texture = gl.create_texture().map_err(GfxError::Allocate)?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );

            // The sampler reads texture unit 0; set once.
            gl.use_program(Some(program));
            let sampler = gl.get_uniform_location(program, "u_frame");
            gl.uniform_1_i32(sampler.as_ref(), 0);

            gl.bind_vertex_array(None);
            gl.use_program(None);

            Ok(Self {
                program,
                vao,
                vbo,
                ebo,
                texture,
            })
        }
    }

    /// Replace the full texture contents with one RGB24 frame.
    pub fn upload(&self, gl: &glow::Context, pixels: &[u8], width: u32, height: u32) {
        debug_assert_eq!(pixels.len(), width as usize * height as usize * 3);
        unsafe {
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(self.texture));
            // Rows are tightly packed; width * 3 is not always 4-aligned.
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGB8 as i32,
                width as i32,
                height as i32,
                0,
                glow::RGB,
                glow::UNSIGNED_BYTE,
                Some(pixels),
            );
        }
    }

    /// Draw the quad with the last uploaded frame.
    pub fn draw(&self, gl: &glow::Context) {
        unsafe {
            gl.use_program(Some(self.program));
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_2D, Some(self.texture));
            gl.bind_vertex_array(Some(self.vao));
            gl.draw_elements(glow::TRIANGLES, 6, glow::UNSIGNED_INT, 0);
            gl.bind_vertex_array(None);
        }
    }

    /// Delete all GL objects, reverse acquisition order.
    pub fn destroy(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_texture(self.texture);
            gl.delete_buffer(self.ebo);
            gl.delete_buffer(self.vbo);
            gl.delete_vertex_array(self.vao);
            gl.delete_program(self.program);
        }
    }
}

fn compile_shader(gl: &glow::Context, kind: u32, source: &str) -> Result<glow::Shader, GfxError> {
    unsafe {
        let shader = gl.create_shader(kind).map_err(GfxError::Allocate)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            return Err(GfxError::ShaderCompile(log));
        }
        Ok(shader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_is_four_vertices_two_triangles() {
        assert_eq!(VERTICES.len(), 4 * 5);
        assert_eq!(INDICES.len(), 6);
        assert!(INDICES.iter().all(|&i| (i as usize) < 4));
        // Every vertex is referenced.
        for v in 0..4u32 {
            assert!(INDICES.contains(&v));
        }
    }

    #[test]
    fn texture_v_is_flipped_against_clip_y() {
        for vertex in VERTICES.chunks_exact(5) {
            let clip_y = vertex[1];
            let tex_v = vertex[4];
            // Top of the quad samples the top of the frame (v = 0).
            assert_eq!(tex_v, if clip_y > 0.0 { 0.0 } else { 1.0 });
        }
    }

    #[test]
    fn geometry_byte_views_match_sizes() {
        assert_eq!(bytemuck::cast_slice::<f32, u8>(&VERTICES).len(), 20 * 4);
        assert_eq!(bytemuck::cast_slice::<u32, u8>(&INDICES).len(), 6 * 4);
    }
}
