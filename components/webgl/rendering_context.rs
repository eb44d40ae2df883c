/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::borrow::Cow;
use std::rc::Rc;

use log::trace;
use pixels::{
    TexDataType, TexFormat, UnpackLayout, unpack_pixels, validate_unpack_length, zeroed_image,
};

use crate::context::{ColorSpaceConversion, GLContextData, WebGLContextId};
use crate::device::{Device, Gl};
use crate::error::{InvalidContext, WebGLError, WebGLResult};
use crate::framebuffer::AttachedObject;
use crate::gl::{
    self, GLbitfield, GLclampd, GLclampf, GLenum, GLint, GLsizei, GLuint,
};
use crate::parameters::{self, WebGLParameter};
use crate::registry::ObjectKind;

/// The entry points of one context. Only obtainable through
/// `WebGLSession::context`, which makes the context current first; the
/// mutable borrow of the session keeps it current for the handle's lifetime.
pub struct WebGLRenderingContext<'a, D: Device> {
    id: WebGLContextId,
    data: &'a mut GLContextData<D>,
    gl: Rc<dyn Gl>,
}

impl<'a, D: Device> WebGLRenderingContext<'a, D> {
    pub(crate) fn new(
        id: WebGLContextId,
        data: &'a mut GLContextData<D>,
    ) -> Result<WebGLRenderingContext<'a, D>, InvalidContext> {
        let gl = data.gl.clone().ok_or(InvalidContext)?;
        Ok(WebGLRenderingContext { id, data, gl })
    }

    pub fn id(&self) -> WebGLContextId {
        self.id
    }

    pub fn data(&self) -> &GLContextData<D> {
        &*self.data
    }

    pub fn get_error(&mut self) -> GLenum {
        self.data.get_error()
    }

    pub fn set_error(&mut self, error: GLenum) {
        self.data.set_error(error)
    }

    /// Re-binds framebuffers whose render targets changed since they were
    /// bound, so the driver resolves them again.
    fn refresh_render_targets(&mut self) {
        let rebinding = self.data.render_targets.take_stale_bindings();
        if !rebinding.is_empty() {
            trace!("{:?}: refreshing {:?}", self.id, rebinding);
            rebinding.apply(&*self.gl);
        }
    }

    fn register(&mut self, kind: ObjectKind, id: GLuint) -> Option<GLuint> {
        if id == 0 {
            return None;
        }
        self.data.registry.register(kind, id);
        Some(id)
    }

    pub fn create_buffer(&mut self) -> Option<GLuint> {
        let id = self.gl.gen_buffers(1).first().copied().unwrap_or(0);
        self.register(ObjectKind::Buffer, id)
    }

    pub fn create_framebuffer(&mut self) -> Option<GLuint> {
        let id = self.gl.gen_framebuffers(1).first().copied().unwrap_or(0);
        self.register(ObjectKind::Framebuffer, id)
    }

    pub fn create_renderbuffer(&mut self) -> Option<GLuint> {
        let id = self.gl.gen_renderbuffers(1).first().copied().unwrap_or(0);
        self.register(ObjectKind::Renderbuffer, id)
    }

    pub fn create_texture(&mut self) -> Option<GLuint> {
        let id = self.gl.gen_textures(1).first().copied().unwrap_or(0);
        self.register(ObjectKind::Texture, id)
    }

    pub fn create_vertex_array(&mut self) -> Option<GLuint> {
        let id = self.gl.gen_vertex_arrays(1).first().copied().unwrap_or(0);
        self.register(ObjectKind::VertexArray, id)
    }

    pub fn create_program(&mut self) -> Option<GLuint> {
        let id = self.gl.create_program();
        self.register(ObjectKind::Program, id)
    }

    pub fn create_shader(&mut self, shader_type: GLenum) -> Option<GLuint> {
        let id = self.gl.create_shader(shader_type);
        self.register(ObjectKind::Shader, id)
    }

    pub fn delete_buffer(&mut self, buffer: GLuint) {
        self.data.registry.unregister(ObjectKind::Buffer, buffer);
        self.gl.delete_buffers(&[buffer]);
    }

    pub fn delete_framebuffer(&mut self, framebuffer: GLuint) {
        self.data.registry.unregister(ObjectKind::Framebuffer, framebuffer);
        self.data.render_targets.framebuffer_deleted(framebuffer);
        self.gl.delete_framebuffers(&[framebuffer]);
    }

    pub fn delete_renderbuffer(&mut self, renderbuffer: GLuint) {
        self.data.registry.unregister(ObjectKind::Renderbuffer, renderbuffer);
        self.data.render_targets.renderbuffer_deleted(renderbuffer);
        self.gl.delete_renderbuffers(&[renderbuffer]);
    }

    pub fn delete_texture(&mut self, texture: GLuint) {
        self.data.registry.unregister(ObjectKind::Texture, texture);
        self.data.render_targets.texture_deleted(texture);
        self.gl.delete_textures(&[texture]);
    }

    pub fn delete_vertex_array(&mut self, vertex_array: GLuint) {
        self.data.registry.unregister(ObjectKind::VertexArray, vertex_array);
        self.gl.delete_vertex_arrays(&[vertex_array]);
    }

    pub fn delete_program(&mut self, program: GLuint) {
        self.data.registry.unregister(ObjectKind::Program, program);
        self.gl.delete_program(program);
    }

    pub fn delete_shader(&mut self, shader: GLuint) {
        self.data.registry.unregister(ObjectKind::Shader, shader);
        self.gl.delete_shader(shader);
    }

    pub fn is_buffer(&self, buffer: GLuint) -> bool {
        self.gl.is_buffer(buffer) != gl::FALSE
    }

    pub fn is_framebuffer(&self, framebuffer: GLuint) -> bool {
        self.gl.is_framebuffer(framebuffer) != gl::FALSE
    }

    pub fn is_renderbuffer(&self, renderbuffer: GLuint) -> bool {
        self.gl.is_renderbuffer(renderbuffer) != gl::FALSE
    }

    pub fn is_texture(&self, texture: GLuint) -> bool {
        self.gl.is_texture(texture) != gl::FALSE
    }

    pub fn is_vertex_array(&self, vertex_array: GLuint) -> bool {
        self.gl.is_vertex_array(vertex_array) != gl::FALSE
    }

    pub fn is_program(&self, program: GLuint) -> bool {
        self.gl.is_program(program) != gl::FALSE
    }

    pub fn is_shader(&self, shader: GLuint) -> bool {
        self.gl.is_shader(shader) != gl::FALSE
    }

    pub fn bind_buffer(&mut self, target: GLenum, buffer: GLuint) {
        self.gl.bind_buffer(target, buffer);
    }

    pub fn bind_framebuffer(&mut self, target: GLenum, framebuffer: GLuint) {
        self.gl.bind_framebuffer(target, framebuffer);
        self.data.render_targets.bind_framebuffer(target, framebuffer);
    }

    pub fn bind_renderbuffer(&mut self, target: GLenum, renderbuffer: GLuint) {
        self.gl.bind_renderbuffer(target, renderbuffer);
        self.data.render_targets.bind_renderbuffer(target, renderbuffer);
    }

    pub fn bind_texture(&mut self, target: GLenum, texture: GLuint) {
        self.gl.bind_texture(target, texture);
        if target == gl::TEXTURE_2D || target == gl::TEXTURE_CUBE_MAP {
            self.data.render_targets.bind_texture(target, texture);
        }
    }

    pub fn bind_vertex_array(&mut self, vertex_array: GLuint) {
        self.gl.bind_vertex_array(vertex_array);
    }

    pub fn active_texture(&mut self, texture: GLenum) {
        let mut max_units = [0];
        self.gl
            .get_integer_v(gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS, &mut max_units);
        if texture < gl::TEXTURE0 || texture - gl::TEXTURE0 >= max_units[0] as GLuint {
            return self.data.webgl_error(WebGLError::InvalidEnum);
        }
        self.gl.active_texture(texture);
        self.data.render_targets.active_texture(texture);
    }

    /// Applies the unpack state to client pixels. Returns `None` when the
    /// driver should see the call untransformed, so that it reports the
    /// argument error itself.
    fn unpack<'p>(
        &mut self,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        data_type: GLenum,
        pixels: Option<&'p [u8]>,
    ) -> Result<Option<Cow<'p, [u8]>>, WebGLError> {
        let (Some(format), Some(data_type)) = (
            TexFormat::from_gl_constant(format),
            TexDataType::from_gl_constant(data_type),
        ) else {
            return Ok(None);
        };
        if width < 0 || height < 0 {
            return Ok(None);
        }
        let mut max_size = [0];
        self.gl.get_integer_v(gl::MAX_TEXTURE_SIZE, &mut max_size);
        if width > max_size[0] || height > max_size[0] {
            return Err(WebGLError::InvalidValue);
        }
        let layout = UnpackLayout::new(
            format,
            data_type,
            width as usize,
            height as usize,
            self.data.unpack.alignment,
        )
        .ok_or(WebGLError::InvalidValue)?;
        let Some(pixels) = pixels else {
            return Ok(Some(Cow::Owned(zeroed_image(&layout))));
        };
        if !validate_unpack_length(&layout, pixels.len()) {
            return Err(WebGLError::InvalidOperation);
        }
        let flags = self.data.unpack.flags();
        Ok(Some(unpack_pixels(pixels, format, data_type, &layout, flags).data))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn tex_image_2d(
        &mut self,
        target: GLenum,
        level: GLint,
        internal_format: GLint,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
        format: GLenum,
        data_type: GLenum,
        pixels: Option<&[u8]>,
    ) {
        let data = match self.unpack(width, height, format, data_type, pixels) {
            Ok(data) => data,
            Err(error) => return self.data.webgl_error(error),
        };
        let data = data.as_deref().or(pixels);
        self.gl.tex_image_2d(
            target,
            level,
            internal_format,
            width,
            height,
            border,
            format,
            data_type,
            data,
        );
        let texture = self.data.render_targets.bound_texture(target);
        if texture != 0 {
            self.data.render_targets.texture_respecified(texture);
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn tex_sub_image_2d(
        &mut self,
        target: GLenum,
        level: GLint,
        xoffset: GLint,
        yoffset: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        data_type: GLenum,
        pixels: &[u8],
    ) {
        let data = match self.unpack(width, height, format, data_type, Some(pixels)) {
            Ok(data) => data,
            Err(error) => return self.data.webgl_error(error),
        };
        let data = data.as_deref().unwrap_or(pixels);
        self.gl.tex_sub_image_2d(
            target, level, xoffset, yoffset, width, height, format, data_type, data,
        );
    }

    #[allow(clippy::too_many_arguments)]
    pub fn copy_tex_image_2d(
        &mut self,
        target: GLenum,
        level: GLint,
        internal_format: GLenum,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
    ) {
        self.refresh_render_targets();
        self.gl.copy_tex_image_2d(
            target,
            level,
            internal_format,
            x,
            y,
            width,
            height,
            border,
        );
        let texture = self.data.render_targets.bound_texture(target);
        if texture != 0 {
            self.data.render_targets.texture_respecified(texture);
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn copy_tex_sub_image_2d(
        &mut self,
        target: GLenum,
        level: GLint,
        xoffset: GLint,
        yoffset: GLint,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
    ) {
        self.refresh_render_targets();
        self.gl
            .copy_tex_sub_image_2d(target, level, xoffset, yoffset, x, y, width, height);
    }

    pub fn generate_mipmap(&mut self, target: GLenum) {
        self.gl.generate_mipmap(target);
        let texture = self.data.render_targets.bound_texture(target);
        if texture != 0 {
            self.data.render_targets.texture_respecified(texture);
        }
    }

    pub fn framebuffer_texture_2d(
        &mut self,
        target: GLenum,
        attachment: GLenum,
        textarget: GLenum,
        texture: GLuint,
        level: GLint,
    ) {
        let gl = &*self.gl;
        let attach = |attachment| gl.framebuffer_texture_2d(target, attachment, textarget, texture, level);
        if attachment == gl::DEPTH_STENCIL_ATTACHMENT {
            attach(gl::DEPTH_ATTACHMENT);
            attach(gl::STENCIL_ATTACHMENT);
        } else {
            attach(attachment)
        }
        let object = (texture != 0).then_some(AttachedObject::Texture { id: texture, level });
        self.data.render_targets.attach(target, attachment, object);
    }

    pub fn framebuffer_renderbuffer(
        &mut self,
        target: GLenum,
        attachment: GLenum,
        renderbuffertarget: GLenum,
        renderbuffer: GLuint,
    ) {
        let gl = &*self.gl;
        let attach = |attachment| {
            gl.framebuffer_renderbuffer(target, attachment, renderbuffertarget, renderbuffer)
        };
        if attachment == gl::DEPTH_STENCIL_ATTACHMENT {
            attach(gl::DEPTH_ATTACHMENT);
            attach(gl::STENCIL_ATTACHMENT);
        } else {
            attach(attachment);
        }
        let object = (renderbuffer != 0).then_some(AttachedObject::Renderbuffer(renderbuffer));
        self.data.render_targets.attach(target, attachment, object);
    }

    /// Allocates storage for the bound renderbuffer. The generic WebGL
    /// formats are replaced by the sized formats the driver understands.
    pub fn renderbuffer_storage(
        &mut self,
        target: GLenum,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) {
        let internal_format = match internal_format {
            gl::DEPTH_STENCIL => gl::DEPTH24_STENCIL8,
            gl::DEPTH_COMPONENT32_OES => self.data.preferred_depth_format,
            other => other,
        };
        self.gl
            .renderbuffer_storage(target, internal_format, width, height);
        let renderbuffer = self.data.render_targets.bound_renderbuffer();
        if renderbuffer != 0 {
            self.data.render_targets.renderbuffer_respecified(renderbuffer);
        }
    }

    pub fn get_renderbuffer_parameter(&mut self, target: GLenum, pname: GLenum) -> GLint {
        self.gl.get_renderbuffer_parameter_iv(target, pname)
    }

    /// `DEPTH_STENCIL_ATTACHMENT` is answered from the depth and stencil
    /// points, which must agree.
    pub fn get_framebuffer_attachment_parameter(
        &mut self,
        target: GLenum,
        attachment: GLenum,
        pname: GLenum,
    ) -> GLint {
        if attachment != gl::DEPTH_STENCIL_ATTACHMENT {
            return self
                .gl
                .get_framebuffer_attachment_parameter_iv(target, attachment, pname);
        }
        let depth = self
            .gl
            .get_framebuffer_attachment_parameter_iv(target, gl::DEPTH_ATTACHMENT, pname);
        let stencil = self
            .gl
            .get_framebuffer_attachment_parameter_iv(target, gl::STENCIL_ATTACHMENT, pname);
        if depth != stencil {
            self.data.webgl_error(WebGLError::InvalidOperation);
            return 0;
        }
        depth
    }

    pub fn check_framebuffer_status(&mut self, target: GLenum) -> GLenum {
        self.gl.check_frame_buffer_status(target)
    }

    pub fn draw_buffers(&mut self, buffers: &[GLenum]) {
        self.gl.draw_buffers(buffers);
        self.data.render_targets.draw_buffers_changed();
    }

    pub fn clear_color(&mut self, r: GLclampf, g: GLclampf, b: GLclampf, a: GLclampf) {
        self.gl.clear_color(r, g, b, a);
    }

    pub fn clear_depth(&mut self, depth: GLclampd) {
        self.gl.clear_depth(depth);
    }

    pub fn clear_stencil(&mut self, stencil: GLint) {
        self.gl.clear_stencil(stencil);
    }

    pub fn clear(&mut self, mask: GLbitfield) {
        self.refresh_render_targets();
        self.gl.clear(mask);
    }

    pub fn draw_arrays(&mut self, mode: GLenum, first: GLint, count: GLsizei) {
        self.refresh_render_targets();
        self.gl.draw_arrays(mode, first, count);
    }

    pub fn draw_elements(&mut self, mode: GLenum, count: GLsizei, element_type: GLenum, offset: GLuint) {
        self.refresh_render_targets();
        self.gl.draw_elements(mode, count, element_type, offset);
    }

    pub fn read_pixels(
        &mut self,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        pixel_type: GLenum,
    ) -> Vec<u8> {
        self.refresh_render_targets();
        self.gl.read_pixels(x, y, width, height, format, pixel_type)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn blit_framebuffer(
        &mut self,
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
        self.refresh_render_targets();
        self.gl.blit_framebuffer(
            src_x0, src_y0, src_x1, src_y1, dst_x0, dst_y0, dst_x1, dst_y1, mask, filter,
        );
    }

    pub fn viewport(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.gl.viewport(x, y, width, height);
    }

    pub fn enable(&mut self, cap: GLenum) {
        self.gl.enable(cap);
    }

    pub fn disable(&mut self, cap: GLenum) {
        self.gl.disable(cap);
    }

    pub fn is_enabled(&mut self, cap: GLenum) -> bool {
        self.gl.is_enabled(cap) != gl::FALSE
    }

    /// Sets a pixel storage parameter. The WebGL unpack parameters only
    /// change the unpack state; the alignment is recorded and forwarded.
    pub fn pixel_storei(&mut self, pname: GLenum, param: GLint) {
        match pname {
            gl::UNPACK_FLIP_Y_WEBGL => self.data.unpack.flip_y = param != 0,
            gl::UNPACK_PREMULTIPLY_ALPHA_WEBGL => self.data.unpack.premultiply_alpha = param != 0,
            gl::UNPACK_COLORSPACE_CONVERSION_WEBGL => {
                match ColorSpaceConversion::from_gl_constant(param as GLenum) {
                    Some(color_space) => self.data.unpack.color_space = color_space,
                    None => self.data.webgl_error(WebGLError::InvalidEnum),
                }
            },
            gl::UNPACK_ALIGNMENT => match param {
                1 | 2 | 4 | 8 => {
                    self.data.unpack.alignment = param as u32;
                    self.gl.pixel_store_i(pname, param);
                },
                _ => self.data.webgl_error(WebGLError::InvalidValue),
            },
            _ => self.gl.pixel_store_i(pname, param),
        }
    }

    pub fn get_parameter(&mut self, pname: GLenum) -> WebGLParameter {
        parameters::get_parameter(&*self.gl, &self.data.unpack, pname)
    }

    pub fn supported_extensions(&mut self) -> Vec<String> {
        self.gl
            .get_string(gl::EXTENSIONS)
            .split_whitespace()
            .map(str::to_owned)
            .collect()
    }

    /// Sets a consumer stream attribute. Errors are also recorded for
    /// `get_error`.
    pub fn stream_attrib(&mut self, attribute: GLenum, value: GLint) -> WebGLResult<()> {
        let result = self.data.stream.set(attribute, value);
        if let Err(error) = result {
            self.data.webgl_error(error);
        }
        result
    }

    pub fn get_stream_attrib(&mut self, attribute: GLenum) -> WebGLResult<GLint> {
        let result = self.data.stream.get(attribute);
        if let Err(error) = result {
            self.data.webgl_error(error);
        }
        result
    }
}
