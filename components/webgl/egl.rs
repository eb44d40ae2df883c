/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The native [`Device`]: EGL loaded at runtime, OpenGL ES functions loaded
//! through `eglGetProcAddress`.

use std::ffi::c_void;
use std::fmt;
use std::path::Path;
use std::ptr;
use std::rc::Rc;

use euclid::default::Size2D;
use gleam::gl::Gl as _;
use khronos_egl as egl;
use log::{debug, warn};

use crate::device::{ConfigRequest, Device, Gl};
use crate::gl::{
    GLbitfield, GLboolean, GLclampd, GLclampf, GLenum, GLfloat, GLint, GLsizei, GLuint,
};
use crate::options::SessionOptions;

type EglInstance = egl::DynamicInstance<egl::EGL1_4>;

/// Library names tried when no path is configured.
const DEFAULT_LIBRARIES: [&str; 2] = ["libEGL.so.1", "libEGL.so"];

#[derive(Debug)]
pub enum EglLoadError {
    Library(libloading::Error),
    Symbols(egl::LoadError<libloading::Error>),
}

impl std::error::Error for EglLoadError {}

impl fmt::Display for EglLoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            EglLoadError::Library(ref error) => write!(f, "Unable to open libEGL: {}", error),
            EglLoadError::Symbols(ref error) => write!(f, "Unable to load EGL 1.4: {:?}", error),
        }
    }
}

pub struct EglDevice {
    egl: EglInstance,
}

impl EglDevice {
    /// Opens libEGL from `options.egl_library`, or from the default library
    /// names.
    pub fn load(options: &SessionOptions) -> Result<EglDevice, EglLoadError> {
        let library = match options.egl_library {
            Some(ref path) => open_library(path)?,
            None => open_default_library()?,
        };
        let egl = unsafe { EglInstance::load_required_from(library) }
            .map_err(EglLoadError::Symbols)?;
        Ok(EglDevice { egl })
    }
}

fn open_library(path: &Path) -> Result<libloading::Library, EglLoadError> {
    debug!("Loading EGL from {}", path.display());
    unsafe { libloading::Library::new(path) }.map_err(EglLoadError::Library)
}

fn open_default_library() -> Result<libloading::Library, EglLoadError> {
    let mut last_error = None;
    for name in DEFAULT_LIBRARIES {
        match open_library(Path::new(name)) {
            Ok(library) => return Ok(library),
            Err(error) => last_error = Some(error),
        }
    }
    Err(last_error.unwrap_or(EglLoadError::Library(
        libloading::Error::DlOpenUnknown,
    )))
}

impl Device for EglDevice {
    type Display = egl::Display;
    type Config = egl::Config;
    type Context = egl::Context;
    type Surface = egl::Surface;

    fn get_display(&self) -> Option<egl::Display> {
        unsafe { self.egl.get_display(egl::DEFAULT_DISPLAY) }
    }

    fn initialize(&self, display: egl::Display) -> bool {
        match self.egl.initialize(display) {
            Ok((major, minor)) => debug!("Initialized EGL {}.{}", major, minor),
            Err(error) => {
                warn!("eglInitialize failed: {}", error);
                return false;
            },
        }
        self.egl.bind_api(egl::OPENGL_ES_API).is_ok()
    }

    fn terminate(&self, display: egl::Display) {
        if let Err(error) = self.egl.terminate(display) {
            warn!("eglTerminate failed: {}", error);
        }
    }

    fn choose_config(
        &self,
        display: egl::Display,
        request: &ConfigRequest,
        max: usize,
    ) -> Vec<egl::Config> {
        let attributes = [
            egl::SURFACE_TYPE,
            egl::PBUFFER_BIT,
            egl::RENDERABLE_TYPE,
            egl::OPENGL_ES2_BIT,
            egl::RED_SIZE,
            request.red_size,
            egl::GREEN_SIZE,
            request.green_size,
            egl::BLUE_SIZE,
            request.blue_size,
            egl::ALPHA_SIZE,
            request.alpha_size,
            egl::DEPTH_SIZE,
            request.depth_size,
            egl::STENCIL_SIZE,
            request.stencil_size,
            egl::NONE,
        ];
        let mut configs = Vec::with_capacity(max);
        if let Err(error) = self.egl.choose_config(display, &attributes, &mut configs) {
            warn!("eglChooseConfig failed: {}", error);
        }
        configs
    }

    fn create_context(
        &self,
        display: egl::Display,
        config: egl::Config,
        client_version: i32,
    ) -> Option<egl::Context> {
        let attributes = [egl::CONTEXT_CLIENT_VERSION, client_version, egl::NONE];
        self.egl
            .create_context(display, config, None, &attributes)
            .map_err(|error| warn!("eglCreateContext failed: {}", error))
            .ok()
    }

    fn create_pbuffer_surface(
        &self,
        display: egl::Display,
        config: egl::Config,
        size: Size2D<i32>,
    ) -> Option<egl::Surface> {
        let attributes = [egl::WIDTH, size.width, egl::HEIGHT, size.height, egl::NONE];
        self.egl
            .create_pbuffer_surface(display, config, &attributes)
            .map_err(|error| warn!("eglCreatePbufferSurface failed: {}", error))
            .ok()
    }

    fn make_current(
        &self,
        display: egl::Display,
        target: Option<(egl::Surface, egl::Context)>,
    ) -> bool {
        let result = match target {
            Some((surface, context)) => {
                self.egl
                    .make_current(display, Some(surface), Some(surface), Some(context))
            },
            None => self.egl.make_current(display, None, None, None),
        };
        result
            .map_err(|error| warn!("eglMakeCurrent failed: {}", error))
            .is_ok()
    }

    fn destroy_context(&self, display: egl::Display, context: egl::Context) {
        if let Err(error) = self.egl.destroy_context(display, context) {
            warn!("eglDestroyContext failed: {}", error);
        }
    }

    fn destroy_surface(&self, display: egl::Display, surface: egl::Surface) {
        if let Err(error) = self.egl.destroy_surface(display, surface) {
            warn!("eglDestroySurface failed: {}", error);
        }
    }

    fn load_gl(&self, _display: egl::Display, _context: egl::Context) -> Option<Rc<dyn Gl>> {
        let gl = unsafe {
            gleam::gl::GlesFns::load_with(|symbol| {
                self.egl
                    .get_proc_address(symbol)
                    .map_or(ptr::null(), |function| function as *const c_void)
            })
        };
        let queries = ObjectQueries {
            is_buffer: self.load_object_query("glIsBuffer"),
            is_program: self.load_object_query("glIsProgram"),
            is_vertex_array: self
                .load_object_query("glIsVertexArrayOES")
                .or_else(|| self.load_object_query("glIsVertexArray")),
        };
        Some(Rc::new(GleamGl(gl, queries)))
    }
}

impl EglDevice {
    fn load_object_query(&self, symbol: &str) -> Option<ObjectQuery> {
        let function = self.egl.get_proc_address(symbol)?;
        // Every glIs* entry point takes a name and returns a GLboolean.
        Some(unsafe { std::mem::transmute::<extern "system" fn(), ObjectQuery>(function) })
    }
}

type ObjectQuery = extern "system" fn(GLuint) -> GLboolean;

/// `glIs*` entry points missing from the `gleam` table.
struct ObjectQueries {
    is_buffer: Option<ObjectQuery>,
    is_program: Option<ObjectQuery>,
    is_vertex_array: Option<ObjectQuery>,
}

fn query_object(query: Option<ObjectQuery>, name: GLuint) -> GLboolean {
    query.map_or(crate::gl::FALSE, |is_object| is_object(name))
}

/// Forwards to a `gleam` function table.
pub struct GleamGl(Rc<dyn gleam::gl::Gl>, ObjectQueries);

impl Gl for GleamGl {
    fn get_error(&self) -> GLenum {
        self.0.get_error()
    }

    fn get_string(&self, which: GLenum) -> String {
        self.0.get_string(which)
    }

    fn get_integer_v(&self, name: GLenum, result: &mut [GLint]) {
        unsafe { self.0.get_integer_v(name, result) }
    }

    fn get_float_v(&self, name: GLenum, result: &mut [GLfloat]) {
        unsafe { self.0.get_float_v(name, result) }
    }

    fn get_boolean_v(&self, name: GLenum, result: &mut [GLboolean]) {
        unsafe { self.0.get_boolean_v(name, result) }
    }

    fn enable(&self, cap: GLenum) {
        self.0.enable(cap)
    }

    fn disable(&self, cap: GLenum) {
        self.0.disable(cap)
    }

    fn is_enabled(&self, cap: GLenum) -> GLboolean {
        self.0.is_enabled(cap)
    }

    fn pixel_store_i(&self, name: GLenum, param: GLint) {
        self.0.pixel_store_i(name, param)
    }

    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.0.viewport(x, y, width, height)
    }

    fn gen_buffers(&self, n: GLsizei) -> Vec<GLuint> {
        self.0.gen_buffers(n)
    }

    fn gen_framebuffers(&self, n: GLsizei) -> Vec<GLuint> {
        self.0.gen_framebuffers(n)
    }

    fn gen_renderbuffers(&self, n: GLsizei) -> Vec<GLuint> {
        self.0.gen_renderbuffers(n)
    }

    fn gen_textures(&self, n: GLsizei) -> Vec<GLuint> {
        self.0.gen_textures(n)
    }

    fn gen_vertex_arrays(&self, n: GLsizei) -> Vec<GLuint> {
        self.0.gen_vertex_arrays(n)
    }

    fn create_program(&self) -> GLuint {
        self.0.create_program()
    }

    fn create_shader(&self, shader_type: GLenum) -> GLuint {
        self.0.create_shader(shader_type)
    }

    fn delete_buffers(&self, buffers: &[GLuint]) {
        self.0.delete_buffers(buffers)
    }

    fn delete_framebuffers(&self, framebuffers: &[GLuint]) {
        self.0.delete_framebuffers(framebuffers)
    }

    fn delete_renderbuffers(&self, renderbuffers: &[GLuint]) {
        self.0.delete_renderbuffers(renderbuffers)
    }

    fn delete_textures(&self, textures: &[GLuint]) {
        self.0.delete_textures(textures)
    }

    fn delete_vertex_arrays(&self, vertex_arrays: &[GLuint]) {
        self.0.delete_vertex_arrays(vertex_arrays)
    }

    fn delete_program(&self, program: GLuint) {
        self.0.delete_program(program)
    }

    fn delete_shader(&self, shader: GLuint) {
        self.0.delete_shader(shader)
    }

    fn is_buffer(&self, buffer: GLuint) -> GLboolean {
        query_object(self.1.is_buffer, buffer)
    }

    fn is_framebuffer(&self, framebuffer: GLuint) -> GLboolean {
        self.0.is_framebuffer(framebuffer)
    }

    fn is_renderbuffer(&self, renderbuffer: GLuint) -> GLboolean {
        self.0.is_renderbuffer(renderbuffer)
    }

    fn is_texture(&self, texture: GLuint) -> GLboolean {
        self.0.is_texture(texture)
    }

    fn is_vertex_array(&self, vertex_array: GLuint) -> GLboolean {
        query_object(self.1.is_vertex_array, vertex_array)
    }

    fn is_program(&self, program: GLuint) -> GLboolean {
        query_object(self.1.is_program, program)
    }

    fn is_shader(&self, shader: GLuint) -> GLboolean {
        self.0.is_shader(shader)
    }

    fn bind_buffer(&self, target: GLenum, buffer: GLuint) {
        self.0.bind_buffer(target, buffer)
    }

    fn bind_framebuffer(&self, target: GLenum, framebuffer: GLuint) {
        self.0.bind_framebuffer(target, framebuffer)
    }

    fn bind_renderbuffer(&self, target: GLenum, renderbuffer: GLuint) {
        self.0.bind_renderbuffer(target, renderbuffer)
    }

    fn bind_texture(&self, target: GLenum, texture: GLuint) {
        self.0.bind_texture(target, texture)
    }

    fn bind_vertex_array(&self, vao: GLuint) {
        self.0.bind_vertex_array(vao)
    }

    fn active_texture(&self, texture: GLenum) {
        self.0.active_texture(texture)
    }

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
    ) {
        self.0.tex_image_2d(
            target,
            level,
            internal_format,
            width,
            height,
            border,
            format,
            ty,
            opt_data,
        )
    }

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
    ) {
        self.0
            .tex_sub_image_2d(target, level, xoffset, yoffset, width, height, format, ty, data)
    }

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
    ) {
        self.0
            .copy_tex_image_2d(target, level, internal_format, x, y, width, height, border)
    }

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
    ) {
        self.0
            .copy_tex_sub_image_2d(target, level, xoffset, yoffset, x, y, width, height)
    }

    fn generate_mipmap(&self, target: GLenum) {
        self.0.generate_mipmap(target)
    }

    fn framebuffer_texture_2d(
        &self,
        target: GLenum,
        attachment: GLenum,
        textarget: GLenum,
        texture: GLuint,
        level: GLint,
    ) {
        self.0
            .framebuffer_texture_2d(target, attachment, textarget, texture, level)
    }

    fn framebuffer_renderbuffer(
        &self,
        target: GLenum,
        attachment: GLenum,
        renderbuffertarget: GLenum,
        renderbuffer: GLuint,
    ) {
        self.0
            .framebuffer_renderbuffer(target, attachment, renderbuffertarget, renderbuffer)
    }

    fn renderbuffer_storage(
        &self,
        target: GLenum,
        internalformat: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) {
        self.0
            .renderbuffer_storage(target, internalformat, width, height)
    }

    fn get_renderbuffer_parameter_iv(&self, target: GLenum, pname: GLenum) -> GLint {
        self.0.get_renderbuffer_parameter_iv(target, pname)
    }

    fn get_framebuffer_attachment_parameter_iv(
        &self,
        target: GLenum,
        attachment: GLenum,
        pname: GLenum,
    ) -> GLint {
        self.0
            .get_framebuffer_attachment_parameter_iv(target, attachment, pname)
    }

    fn check_frame_buffer_status(&self, target: GLenum) -> GLenum {
        self.0.check_frame_buffer_status(target)
    }

    fn draw_buffers(&self, bufs: &[GLenum]) {
        self.0.draw_buffers(bufs)
    }

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
    ) {
        self.0.blit_framebuffer(
            src_x0, src_y0, src_x1, src_y1, dst_x0, dst_y0, dst_x1, dst_y1, mask, filter,
        )
    }

    fn clear_color(&self, r: GLclampf, g: GLclampf, b: GLclampf, a: GLclampf) {
        self.0.clear_color(r, g, b, a)
    }

    fn clear_depth(&self, depth: GLclampd) {
        self.0.clear_depth(depth)
    }

    fn clear_stencil(&self, s: GLint) {
        self.0.clear_stencil(s)
    }

    fn clear(&self, buffer_mask: GLbitfield) {
        self.0.clear(buffer_mask)
    }

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        self.0.draw_arrays(mode, first, count)
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, element_type: GLenum, indices_offset: GLuint) {
        self.0.draw_elements(mode, count, element_type, indices_offset)
    }

    fn read_pixels(
        &self,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        pixel_type: GLenum,
    ) -> Vec<u8> {
        self.0.read_pixels(x, y, width, height, format, pixel_type)
    }
}
