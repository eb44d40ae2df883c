/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The two native seams of the binding: a [`Device`] that owns displays,
//! configs, contexts and surfaces, and the [`Gl`] function table that runs
//! against whichever context the device last made current.

use std::fmt::Debug;
use std::rc::Rc;

use euclid::default::Size2D;

use crate::context::GLContextAttributes;
use crate::gl::{GLbitfield, GLboolean, GLclampd, GLclampf, GLenum, GLfloat, GLint, GLsizei, GLuint};
use crate::options::SessionOptions;

/// Attributes handed to config selection. Every config is pbuffer-capable
/// and OpenGL ES 2 renderable.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConfigRequest {
    pub red_size: i32,
    pub green_size: i32,
    pub blue_size: i32,
    pub alpha_size: i32,
    pub depth_size: i32,
    pub stencil_size: i32,
}

impl ConfigRequest {
    pub fn new(options: &SessionOptions, attributes: &GLContextAttributes) -> ConfigRequest {
        let bits_if = |wanted: bool, bits: i32| if wanted { bits } else { 0 };
        ConfigRequest {
            red_size: options.color_bits,
            green_size: options.color_bits,
            blue_size: options.color_bits,
            alpha_size: bits_if(attributes.alpha, options.color_bits),
            depth_size: bits_if(attributes.depth, options.depth_bits),
            stencil_size: bits_if(attributes.stencil, options.stencil_bits),
        }
    }
}

/// The EGL side of the native driver.
///
/// Handles are plain copyable values; the device owns whatever they name.
/// Failures are reported as `None` or `false` and turned into state
/// transitions by the session.
pub trait Device {
    type Display: Copy + Debug + PartialEq;
    type Config: Copy + Debug;
    type Context: Copy + Debug + PartialEq;
    type Surface: Copy + Debug + PartialEq;

    fn get_display(&self) -> Option<Self::Display>;
    fn initialize(&self, display: Self::Display) -> bool;
    fn terminate(&self, display: Self::Display);

    /// Returns at most `max` configs matching `request`.
    fn choose_config(
        &self,
        display: Self::Display,
        request: &ConfigRequest,
        max: usize,
    ) -> Vec<Self::Config>;

    fn create_context(
        &self,
        display: Self::Display,
        config: Self::Config,
        client_version: i32,
    ) -> Option<Self::Context>;

    fn create_pbuffer_surface(
        &self,
        display: Self::Display,
        config: Self::Config,
        size: Size2D<i32>,
    ) -> Option<Self::Surface>;

    /// Makes `target` current, or releases the current context when `None`.
    fn make_current(
        &self,
        display: Self::Display,
        target: Option<(Self::Surface, Self::Context)>,
    ) -> bool;

    fn destroy_context(&self, display: Self::Display, context: Self::Context);
    fn destroy_surface(&self, display: Self::Display, surface: Self::Surface);

    /// Loads the GL function table. `context` must be current.
    fn load_gl(&self, display: Self::Display, context: Self::Context) -> Option<Rc<dyn Gl>>;
}

/// The subset of OpenGL ES 2.0 (plus `GL_EXT_draw_buffers` and
/// `GL_OES_vertex_array_object`) dispatched by the binding. Calls act on the
/// current context of the device that produced the table.
pub trait Gl {
    fn get_error(&self) -> GLenum;
    fn get_string(&self, which: GLenum) -> String;
    fn get_integer_v(&self, name: GLenum, result: &mut [GLint]);
    fn get_float_v(&self, name: GLenum, result: &mut [GLfloat]);
    fn get_boolean_v(&self, name: GLenum, result: &mut [GLboolean]);

    fn enable(&self, cap: GLenum);
    fn disable(&self, cap: GLenum);
    fn is_enabled(&self, cap: GLenum) -> GLboolean;
    fn pixel_store_i(&self, name: GLenum, param: GLint);
    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);

    fn gen_buffers(&self, n: GLsizei) -> Vec<GLuint>;
    fn gen_framebuffers(&self, n: GLsizei) -> Vec<GLuint>;
    fn gen_renderbuffers(&self, n: GLsizei) -> Vec<GLuint>;
    fn gen_textures(&self, n: GLsizei) -> Vec<GLuint>;
    fn gen_vertex_arrays(&self, n: GLsizei) -> Vec<GLuint>;
    fn create_program(&self) -> GLuint;
    fn create_shader(&self, shader_type: GLenum) -> GLuint;

    fn delete_buffers(&self, buffers: &[GLuint]);
    fn delete_framebuffers(&self, framebuffers: &[GLuint]);
    fn delete_renderbuffers(&self, renderbuffers: &[GLuint]);
    fn delete_textures(&self, textures: &[GLuint]);
    fn delete_vertex_arrays(&self, vertex_arrays: &[GLuint]);
    fn delete_program(&self, program: GLuint);
    fn delete_shader(&self, shader: GLuint);

    fn is_buffer(&self, buffer: GLuint) -> GLboolean;
    fn is_framebuffer(&self, framebuffer: GLuint) -> GLboolean;
    fn is_renderbuffer(&self, renderbuffer: GLuint) -> GLboolean;
    fn is_texture(&self, texture: GLuint) -> GLboolean;
    fn is_vertex_array(&self, vertex_array: GLuint) -> GLboolean;
    fn is_program(&self, program: GLuint) -> GLboolean;
    fn is_shader(&self, shader: GLuint) -> GLboolean;

    fn bind_buffer(&self, target: GLenum, buffer: GLuint);
    fn bind_framebuffer(&self, target: GLenum, framebuffer: GLuint);
    fn bind_renderbuffer(&self, target: GLenum, renderbuffer: GLuint);
    fn bind_texture(&self, target: GLenum, texture: GLuint);
    fn bind_vertex_array(&self, vao: GLuint);
    fn active_texture(&self, texture: GLenum);

    #[allow(clippy::too_many_arguments)]
    fn tex_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        internal_format: GLint,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
        format: GLenum,
        ty: GLenum,
        opt_data: Option<&[u8]>,
    );
    #[allow(clippy::too_many_arguments)]
    fn tex_sub_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        xoffset: GLint,
        yoffset: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        ty: GLenum,
        data: &[u8],
    );
    #[allow(clippy::too_many_arguments)]
    fn copy_tex_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        internal_format: GLenum,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
    );
    #[allow(clippy::too_many_arguments)]
    fn copy_tex_sub_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        xoffset: GLint,
        yoffset: GLint,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
    );
    fn generate_mipmap(&self, target: GLenum);

    fn framebuffer_texture_2d(
        &self,
        target: GLenum,
        attachment: GLenum,
        textarget: GLenum,
        texture: GLuint,
        level: GLint,
    );
    fn framebuffer_renderbuffer(
        &self,
        target: GLenum,
        attachment: GLenum,
        renderbuffertarget: GLenum,
        renderbuffer: GLuint,
    );
    fn renderbuffer_storage(
        &self,
        target: GLenum,
        internalformat: GLenum,
        width: GLsizei,
        height: GLsizei,
    );
    fn get_renderbuffer_parameter_iv(&self, target: GLenum, pname: GLenum) -> GLint;
    fn get_framebuffer_attachment_parameter_iv(
        &self,
        target: GLenum,
        attachment: GLenum,
        pname: GLenum,
    ) -> GLint;
    fn check_frame_buffer_status(&self, target: GLenum) -> GLenum;
    fn draw_buffers(&self, bufs: &[GLenum]);
    #[allow(clippy::too_many_arguments)]
    fn blit_framebuffer(
        &self,
        src_x0: GLint,
        src_y0: GLint,
        src_x1: GLint,
        src_y1: GLint,
        dst_x0: GLint,
        dst_y0: GLint,
        dst_x1: GLint,
        dst_y1: GLint,
        mask: GLbitfield,
        filter: GLenum,
    );

    fn clear_color(&self, r: GLclampf, g: GLclampf, b: GLclampf, a: GLclampf);
    fn clear_depth(&self, depth: GLclampd);
    fn clear_stencil(&self, s: GLint);
    fn clear(&self, buffer_mask: GLbitfield);
    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei);
    fn draw_elements(&self, mode: GLenum, count: GLsizei, element_type: GLenum, indices_offset: GLuint);
    fn read_pixels(
        &self,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        pixel_type: GLenum,
    ) -> Vec<u8>;
}
