/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! An in-process OpenGL ES 2.0 driver behind the [`Device`] and [`Gl`] seams.
//!
//! It follows EGL current-context rules: GL calls act on whatever context was
//! last made current and are dropped when there is none. Every context has
//! its own object namespaces and a single-slot error queue. Color storage is
//! always RGBA8.
//!
//! Like ANGLE, the driver resolves the render targets of a framebuffer when
//! it is bound, and keeps drawing into those images until the next bind even
//! if attachments or their storage change in the meantime. The draw buffer
//! selection is likewise only picked up by a bind.

use std::cell::RefCell;
use std::cmp;
use std::rc::Rc;

use euclid::default::Size2D;
use fnv::{FnvHashMap, FnvHashSet};
use log::{debug, trace};
use pixels::{TexFormat, row_stride};

use crate::device::{ConfigRequest, Device, Gl};
use crate::framebuffer::texture_binding_target;
use crate::gl::{
    self, GLbitfield, GLboolean, GLclampd, GLclampf, GLenum, GLfloat, GLint, GLsizei, GLuint,
};

/// Extensions reported by a device unless configured otherwise.
pub const DEFAULT_EXTENSIONS: &str = "GL_OES_packed_depth_stencil GL_ANGLE_instanced_arrays \
     GL_OES_depth24 GL_OES_rgb8_rgba8 GL_EXT_draw_buffers GL_OES_vertex_array_object";

const MAX_SIZE: GLint = 4096;
const MAX_COLOR_ATTACHMENTS: GLenum = 4;
const MAX_TEXTURE_UNITS: GLenum = 32;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SoftwareDisplay(u32);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SoftwareConfig(u32);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SoftwareContext(u32);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SoftwareSurface(u32);

type SharedImage = Rc<RefCell<Image>>;

/// RGBA8 pixels, bottom row first.
#[derive(Clone, Debug)]
struct Image {
    width: i32,
    height: i32,
    pixels: Vec<u8>,
}

impl Image {
    fn new(width: i32, height: i32) -> Image {
        let (width, height) = (cmp::max(width, 0), cmp::max(height, 0));
        Image {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
        }
    }

    fn from_pixels(width: i32, height: i32, pixels: Vec<u8>) -> Image {
        let mut image = Image::new(width, height);
        let len = cmp::min(image.pixels.len(), pixels.len());
        image.pixels[..len].copy_from_slice(&pixels[..len]);
        image
    }

    fn shared(image: Image) -> SharedImage {
        Rc::new(RefCell::new(image))
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some(((y * self.width + x) * 4) as usize)
    }

    /// Reads a rectangle. Pixels outside the image read as zero.
    fn read(&self, x: i32, y: i32, width: i32, height: i32) -> Vec<u8> {
        let mut out = vec![0; (cmp::max(width, 0) * cmp::max(height, 0) * 4) as usize];
        for row in 0..height {
            for col in 0..width {
                if let Some(src) = self.offset(x + col, y + row) {
                    let dst = ((row * width + col) * 4) as usize;
                    out[dst..dst + 4].copy_from_slice(&self.pixels[src..src + 4]);
                }
            }
        }
        out
    }

    /// Writes tightly packed RGBA8 rows. Pixels outside the image are dropped.
    fn write(&mut self, x: i32, y: i32, width: i32, height: i32, data: &[u8]) {
        for row in 0..height {
            for col in 0..width {
                let src = ((row * width + col) * 4) as usize;
                if src + 4 > data.len() {
                    return;
                }
                if let Some(dst) = self.offset(x + col, y + row) {
                    self.pixels[dst..dst + 4].copy_from_slice(&data[src..src + 4]);
                }
            }
        }
    }

    fn fill(&mut self, rgba: [u8; 4]) {
        for pixel in self.pixels.chunks_exact_mut(4) {
            pixel.copy_from_slice(&rgba);
        }
    }

    fn downsample(&self) -> Image {
        let width = cmp::max(self.width / 2, 1);
        let height = cmp::max(self.height / 2, 1);
        let mut image = Image::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if let (Some(src), Some(dst)) = (self.offset(x * 2, y * 2), image.offset(x, y)) {
                    image.pixels[dst..dst + 4].copy_from_slice(&self.pixels[src..src + 4]);
                }
            }
        }
        image
    }
}

/// Converts client pixels of an `UNSIGNED_BYTE` upload to RGBA8. Other types
/// are stored as zeros.
fn decode_rgba8(
    format: GLenum,
    ty: GLenum,
    width: i32,
    height: i32,
    data: &[u8],
    alignment: GLint,
) -> Vec<u8> {
    let (width, height) = (cmp::max(width, 0) as usize, cmp::max(height, 0) as usize);
    let mut out = vec![0; width * height * 4];
    let format = match TexFormat::from_gl_constant(format) {
        Some(format) if ty == gl::UNSIGNED_BYTE => format,
        _ => return out,
    };
    let pixel_size = format.components();
    let Some(stride) = row_stride(pixel_size, width, cmp::max(alignment, 1) as usize) else {
        return out;
    };
    for row in 0..height {
        for col in 0..width {
            let src = row * stride + col * pixel_size;
            let Some(p) = data.get(src..src + pixel_size) else {
                continue;
            };
            let rgba = match format {
                TexFormat::Alpha => [0, 0, 0, p[0]],
                TexFormat::Luminance => [p[0], p[0], p[0], 255],
                TexFormat::LuminanceAlpha => [p[0], p[0], p[0], p[1]],
                TexFormat::RGB => [p[0], p[1], p[2], 255],
                TexFormat::RGBA => [p[0], p[1], p[2], p[3]],
            };
            let dst = (row * width + col) * 4;
            out[dst..dst + 4].copy_from_slice(&rgba);
        }
    }
    out
}

fn to_unorm8(value: GLclampf) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn is_texture_image_target(target: GLenum) -> bool {
    matches!(
        target,
        gl::TEXTURE_2D |
            gl::TEXTURE_CUBE_MAP_POSITIVE_X |
            gl::TEXTURE_CUBE_MAP_NEGATIVE_X |
            gl::TEXTURE_CUBE_MAP_POSITIVE_Y |
            gl::TEXTURE_CUBE_MAP_NEGATIVE_Y |
            gl::TEXTURE_CUBE_MAP_POSITIVE_Z |
            gl::TEXTURE_CUBE_MAP_NEGATIVE_Z
    )
}

fn is_framebuffer_target(target: GLenum) -> bool {
    matches!(
        target,
        gl::FRAMEBUFFER | gl::READ_FRAMEBUFFER | gl::DRAW_FRAMEBUFFER
    )
}

fn is_attachment_point(attachment: GLenum) -> bool {
    (gl::COLOR_ATTACHMENT0..gl::COLOR_ATTACHMENT0 + MAX_COLOR_ATTACHMENTS).contains(&attachment) ||
        attachment == gl::DEPTH_ATTACHMENT ||
        attachment == gl::STENCIL_ATTACHMENT
}

fn is_capability(cap: GLenum) -> bool {
    matches!(
        cap,
        gl::BLEND |
            gl::CULL_FACE |
            gl::DEPTH_TEST |
            gl::DITHER |
            gl::POLYGON_OFFSET_FILL |
            gl::SAMPLE_ALPHA_TO_COVERAGE |
            gl::SAMPLE_COVERAGE |
            gl::SCISSOR_TEST |
            gl::STENCIL_TEST
    )
}

/// Bit sizes of a renderbuffer format: red, green, blue, alpha, depth, stencil.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
struct FormatSizes([GLint; 6]);

impl FormatSizes {
    fn is_color(&self) -> bool {
        self.0[0] > 0 || self.0[3] > 0
    }

    fn has_depth(&self) -> bool {
        self.0[4] > 0
    }

    fn has_stencil(&self) -> bool {
        self.0[5] > 0
    }
}

/// Sized renderbuffer formats and the extension each one needs.
fn renderbuffer_format(format: GLenum) -> Option<(FormatSizes, Option<&'static str>)> {
    Some(match format {
        gl::RGBA4 => (FormatSizes([4, 4, 4, 4, 0, 0]), None),
        gl::RGB5_A1 => (FormatSizes([5, 5, 5, 1, 0, 0]), None),
        gl::RGB565 => (FormatSizes([5, 6, 5, 0, 0, 0]), None),
        gl::RGBA8_OES => (FormatSizes([8, 8, 8, 8, 0, 0]), Some("GL_OES_rgb8_rgba8")),
        gl::DEPTH_COMPONENT16 => (FormatSizes([0, 0, 0, 0, 16, 0]), None),
        gl::DEPTH_COMPONENT24_OES => (FormatSizes([0, 0, 0, 0, 24, 0]), Some("GL_OES_depth24")),
        gl::DEPTH_COMPONENT32_OES => (FormatSizes([0, 0, 0, 0, 32, 0]), Some("GL_OES_depth32")),
        gl::STENCIL_INDEX8 => (FormatSizes([0, 0, 0, 0, 0, 8]), None),
        gl::DEPTH24_STENCIL8 => (
            FormatSizes([0, 0, 0, 0, 24, 8]),
            Some("GL_OES_packed_depth_stencil"),
        ),
        _ => return None,
    })
}

#[derive(Default)]
struct Texture {
    images: FnvHashMap<(GLenum, GLint), SharedImage>,
}

struct Renderbuffer {
    internal_format: GLenum,
    storage: SharedImage,
}

impl Default for Renderbuffer {
    fn default() -> Self {
        Renderbuffer {
            internal_format: gl::RGBA4,
            storage: Image::shared(Image::new(0, 0)),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Attachment {
    Texture {
        name: GLuint,
        target: GLenum,
        level: GLint,
    },
    Renderbuffer(GLuint),
}

#[derive(Default)]
struct Framebuffer {
    attachments: FnvHashMap<GLenum, Attachment>,
    draw_buffers: Vec<GLenum>,
}

/// The server-side state of one context.
struct ContextObjects {
    extensions: String,
    next_name: GLuint,
    error: GLenum,
    buffers: FnvHashSet<GLuint>,
    programs: FnvHashSet<GLuint>,
    shaders: FnvHashSet<GLuint>,
    vertex_arrays: FnvHashSet<GLuint>,
    textures: FnvHashMap<GLuint, Texture>,
    renderbuffers: FnvHashMap<GLuint, Renderbuffer>,
    framebuffers: FnvHashMap<GLuint, Framebuffer>,
    default_surface: Option<SharedImage>,
    read_framebuffer: GLuint,
    draw_framebuffer: GLuint,
    read_target: Option<SharedImage>,
    draw_target: Option<SharedImage>,
    renderbuffer: GLuint,
    active_unit: GLenum,
    texture_bindings: FnvHashMap<(GLenum, GLenum), GLuint>,
    element_array_buffer: GLuint,
    vertex_array: GLuint,
    enabled: FnvHashSet<GLenum>,
    clear_color: [GLclampf; 4],
    clear_depth: GLclampd,
    clear_stencil: GLint,
    viewport: [GLint; 4],
    unpack_alignment: GLint,
    pack_alignment: GLint,
    draw_calls: usize,
}

impl ContextObjects {
    fn new(extensions: String) -> ContextObjects {
        let mut enabled = FnvHashSet::default();
        enabled.insert(gl::DITHER);
        ContextObjects {
            extensions,
            next_name: 0,
            error: gl::NO_ERROR,
            buffers: FnvHashSet::default(),
            programs: FnvHashSet::default(),
            shaders: FnvHashSet::default(),
            vertex_arrays: FnvHashSet::default(),
            textures: FnvHashMap::default(),
            renderbuffers: FnvHashMap::default(),
            framebuffers: FnvHashMap::default(),
            default_surface: None,
            read_framebuffer: 0,
            draw_framebuffer: 0,
            read_target: None,
            draw_target: None,
            renderbuffer: 0,
            active_unit: gl::TEXTURE0,
            texture_bindings: FnvHashMap::default(),
            element_array_buffer: 0,
            vertex_array: 0,
            enabled,
            clear_color: [0.0; 4],
            clear_depth: 1.0,
            clear_stencil: 0,
            viewport: [0; 4],
            unpack_alignment: 4,
            pack_alignment: 4,
            draw_calls: 0,
        }
    }

    fn live_objects(&self) -> usize {
        self.buffers.len() +
            self.programs.len() +
            self.shaders.len() +
            self.vertex_arrays.len() +
            self.textures.len() +
            self.renderbuffers.len() +
            self.framebuffers.len()
    }

    fn holds(&self, name: GLuint) -> bool {
        self.buffers.contains(&name) ||
            self.programs.contains(&name) ||
            self.shaders.contains(&name) ||
            self.vertex_arrays.contains(&name) ||
            self.textures.contains_key(&name) ||
            self.renderbuffers.contains_key(&name) ||
            self.framebuffers.contains_key(&name)
    }

    fn record(&mut self, error: GLenum) {
        trace!("software GL error {:#x}", error);
        if self.error == gl::NO_ERROR {
            self.error = error;
        }
    }

    fn take_error(&mut self) -> GLenum {
        std::mem::replace(&mut self.error, gl::NO_ERROR)
    }

    fn has_extension(&self, name: &str) -> bool {
        self.extensions.split_whitespace().any(|extension| extension == name)
    }

    fn gen_names(&mut self, n: GLsizei) -> Vec<GLuint> {
        if n < 0 {
            self.record(gl::INVALID_VALUE);
            return vec![];
        }
        (0..n)
            .map(|_| {
                self.next_name += 1;
                self.next_name
            })
            .collect()
    }

    fn attach_surface(&mut self, surface: SharedImage) {
        self.default_surface = Some(surface);
        if self.read_framebuffer == 0 {
            self.read_target = self.resolve(0);
        }
        if self.draw_framebuffer == 0 {
            self.draw_target = self.resolve(0);
        }
    }

    /// The color image a framebuffer renders into right now.
    fn resolve(&self, framebuffer: GLuint) -> Option<SharedImage> {
        if framebuffer == 0 {
            return self.default_surface.clone();
        }
        let attachment = *self
            .framebuffers
            .get(&framebuffer)?
            .attachments
            .get(&gl::COLOR_ATTACHMENT0)?;
        match attachment {
            Attachment::Texture {
                name,
                target,
                level,
            } => self.textures.get(&name)?.images.get(&(target, level)).cloned(),
            Attachment::Renderbuffer(name) => {
                let renderbuffer = self.renderbuffers.get(&name)?;
                let (sizes, _) = renderbuffer_format(renderbuffer.internal_format)?;
                sizes.is_color().then(|| renderbuffer.storage.clone())
            },
        }
    }

    /// Like `resolve`, but nothing is drawn when draw buffer 0 is `NONE`.
    fn resolve_draw(&self, framebuffer: GLuint) -> Option<SharedImage> {
        let disabled = self
            .framebuffers
            .get(&framebuffer)
            .and_then(|fb| fb.draw_buffers.first())
            .is_some_and(|&buf| buf == gl::NONE);
        if disabled {
            return None;
        }
        self.resolve(framebuffer)
    }

    fn bound_framebuffer(&self, target: GLenum) -> GLuint {
        match target {
            gl::READ_FRAMEBUFFER => self.read_framebuffer,
            _ => self.draw_framebuffer,
        }
    }

    fn bound_texture(&self, target: GLenum) -> GLuint {
        self.texture_bindings
            .get(&(self.active_unit, texture_binding_target(target)))
            .copied()
            .unwrap_or(0)
    }

    fn texture_image(&self, target: GLenum, level: GLint) -> Option<SharedImage> {
        let texture = self.textures.get(&self.bound_texture(target))?;
        texture.images.get(&(target, level)).cloned()
    }

    /// Size and kind of whatever sits at an attachment point.
    fn attachment_info(&self, attachment: Attachment) -> Option<(FormatSizes, i32, i32)> {
        match attachment {
            Attachment::Texture {
                name,
                target,
                level,
            } => {
                let image = self.textures.get(&name)?.images.get(&(target, level))?.clone();
                let image = image.borrow();
                Some((FormatSizes([8, 8, 8, 8, 0, 0]), image.width, image.height))
            },
            Attachment::Renderbuffer(name) => {
                let renderbuffer = self.renderbuffers.get(&name)?;
                let (sizes, _) = renderbuffer_format(renderbuffer.internal_format)?;
                let storage = renderbuffer.storage.borrow();
                Some((sizes, storage.width, storage.height))
            },
        }
    }

    fn framebuffer_status(&self, framebuffer: GLuint) -> GLenum {
        if framebuffer == 0 {
            return gl::FRAMEBUFFER_COMPLETE;
        }
        let Some(fb) = self.framebuffers.get(&framebuffer) else {
            return gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT;
        };
        if fb.attachments.is_empty() {
            return gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT;
        }

        let mut size = None;
        for (&point, &attachment) in &fb.attachments {
            let Some((sizes, width, height)) = self.attachment_info(attachment) else {
                return gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT;
            };
            let renderable = match point {
                gl::DEPTH_ATTACHMENT => sizes.has_depth(),
                gl::STENCIL_ATTACHMENT => sizes.has_stencil(),
                _ => sizes.is_color(),
            };
            if !renderable || width == 0 || height == 0 {
                return gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT;
            }
            match size {
                None => size = Some((width, height)),
                Some(existing) if existing != (width, height) => {
                    return gl::FRAMEBUFFER_INCOMPLETE_DIMENSIONS;
                },
                Some(_) => {},
            }
        }

        let depth = fb.attachments.get(&gl::DEPTH_ATTACHMENT);
        let stencil = fb.attachments.get(&gl::STENCIL_ATTACHMENT);
        if let (Some(depth), Some(stencil)) = (depth, stencil) {
            if depth != stencil {
                return gl::FRAMEBUFFER_UNSUPPORTED;
            }
        }
        gl::FRAMEBUFFER_COMPLETE
    }

    fn check_complete(&mut self, framebuffer: GLuint) -> bool {
        if self.framebuffer_status(framebuffer) != gl::FRAMEBUFFER_COMPLETE {
            self.record(gl::INVALID_FRAMEBUFFER_OPERATION);
            return false;
        }
        true
    }

    fn get_integer(&self, name: GLenum) -> Option<Vec<GLint>> {
        Some(match name {
            gl::FRAMEBUFFER_BINDING => vec![self.draw_framebuffer as GLint],
            gl::RENDERBUFFER_BINDING => vec![self.renderbuffer as GLint],
            gl::TEXTURE_BINDING_2D => vec![self.bound_texture(gl::TEXTURE_2D) as GLint],
            gl::ACTIVE_TEXTURE => vec![self.active_unit as GLint],
            gl::VIEWPORT | gl::SCISSOR_BOX => self.viewport.to_vec(),
            gl::MAX_VIEWPORT_DIMS => vec![MAX_SIZE, MAX_SIZE],
            gl::MAX_TEXTURE_SIZE | gl::MAX_RENDERBUFFER_SIZE => vec![MAX_SIZE],
            gl::MAX_COLOR_ATTACHMENTS | gl::MAX_DRAW_BUFFERS => vec![MAX_COLOR_ATTACHMENTS as GLint],
            gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS => vec![MAX_TEXTURE_UNITS as GLint],
            gl::UNPACK_ALIGNMENT => vec![self.unpack_alignment],
            gl::PACK_ALIGNMENT => vec![self.pack_alignment],
            gl::STENCIL_CLEAR_VALUE => vec![self.clear_stencil],
            _ => return None,
        })
    }

    fn get_float(&self, name: GLenum) -> Option<Vec<GLfloat>> {
        Some(match name {
            gl::COLOR_CLEAR_VALUE => self.clear_color.to_vec(),
            gl::DEPTH_CLEAR_VALUE => vec![self.clear_depth as GLfloat],
            gl::LINE_WIDTH | gl::SAMPLE_COVERAGE_VALUE => vec![1.0],
            gl::POLYGON_OFFSET_FACTOR | gl::POLYGON_OFFSET_UNITS => vec![0.0],
            gl::DEPTH_RANGE => vec![0.0, 1.0],
            gl::ALIASED_LINE_WIDTH_RANGE => vec![1.0, 1.0],
            gl::ALIASED_POINT_SIZE_RANGE => vec![1.0, 64.0],
            gl::BLEND_COLOR => vec![0.0; 4],
            _ => return None,
        })
    }

    fn get_boolean(&self, name: GLenum) -> Option<Vec<GLboolean>> {
        if is_capability(name) {
            return Some(vec![self.enabled.contains(&name) as GLboolean]);
        }
        Some(match name {
            gl::DEPTH_WRITEMASK => vec![gl::TRUE],
            gl::COLOR_WRITEMASK => vec![gl::TRUE; 4],
            gl::SAMPLE_COVERAGE_INVERT => vec![gl::FALSE],
            _ => return None,
        })
    }

    fn bind_framebuffer(&mut self, target: GLenum, framebuffer: GLuint) {
        if !is_framebuffer_target(target) {
            return self.record(gl::INVALID_ENUM);
        }
        if framebuffer != 0 {
            self.framebuffers.entry(framebuffer).or_default();
        }
        if target != gl::DRAW_FRAMEBUFFER {
            self.read_framebuffer = framebuffer;
            self.read_target = self.resolve(framebuffer);
        }
        if target != gl::READ_FRAMEBUFFER {
            self.draw_framebuffer = framebuffer;
            self.draw_target = self.resolve_draw(framebuffer);
        }
    }

    fn delete_textures(&mut self, textures: &[GLuint]) {
        for &texture in textures {
            if self.textures.remove(&texture).is_none() {
                continue;
            }
            self.texture_bindings.retain(|_, bound| *bound != texture);
            self.detach_from_bound(|attachment| {
                matches!(attachment, Attachment::Texture { name, .. } if name == texture)
            });
        }
    }

    fn delete_renderbuffers(&mut self, renderbuffers: &[GLuint]) {
        for &renderbuffer in renderbuffers {
            if self.renderbuffers.remove(&renderbuffer).is_none() {
                continue;
            }
            if self.renderbuffer == renderbuffer {
                self.renderbuffer = 0;
            }
            self.detach_from_bound(|attachment| attachment == Attachment::Renderbuffer(renderbuffer));
        }
    }

    /// Deleting an image detaches it from the bound framebuffers only. Cached
    /// render targets are left alone.
    fn detach_from_bound<F>(&mut self, matches: F)
    where
        F: Fn(Attachment) -> bool,
    {
        for framebuffer in [self.read_framebuffer, self.draw_framebuffer] {
            if let Some(fb) = self.framebuffers.get_mut(&framebuffer) {
                fb.attachments.retain(|_, attachment| !matches(*attachment));
            }
        }
    }

    fn delete_framebuffers(&mut self, framebuffers: &[GLuint]) {
        for &framebuffer in framebuffers {
            if framebuffer == 0 || self.framebuffers.remove(&framebuffer).is_none() {
                continue;
            }
            if self.read_framebuffer == framebuffer {
                self.bind_framebuffer(gl::READ_FRAMEBUFFER, 0);
            }
            if self.draw_framebuffer == framebuffer {
                self.bind_framebuffer(gl::DRAW_FRAMEBUFFER, 0);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn tex_image_2d(
        &mut self,
        target: GLenum,
        level: GLint,
        internal_format: GLint,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
        format: GLenum,
        ty: GLenum,
        data: Option<&[u8]>,
    ) {
        if !is_texture_image_target(target) {
            return self.record(gl::INVALID_ENUM);
        }
        if level < 0 || width < 0 || height < 0 || width > MAX_SIZE || height > MAX_SIZE || border != 0 {
            return self.record(gl::INVALID_VALUE);
        }
        if TexFormat::from_gl_constant(format).is_none() ||
            pixels::TexDataType::from_gl_constant(ty).is_none()
        {
            return self.record(gl::INVALID_ENUM);
        }
        if internal_format as GLenum != format {
            return self.record(gl::INVALID_OPERATION);
        }
        let alignment = self.unpack_alignment;
        let texture = self.bound_texture(target);
        let Some(texture) = self.textures.get_mut(&texture) else {
            return self.record(gl::INVALID_OPERATION);
        };
        let pixels = data
            .map(|data| decode_rgba8(format, ty, width, height, data, alignment))
            .unwrap_or_default();
        texture.images.insert(
            (target, level),
            Image::shared(Image::from_pixels(width, height, pixels)),
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn tex_sub_image_2d(
        &mut self,
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
        if !is_texture_image_target(target) {
            return self.record(gl::INVALID_ENUM);
        }
        let Some(image) = self.texture_image(target, level) else {
            return self.record(gl::INVALID_OPERATION);
        };
        let mut image = image.borrow_mut();
        if xoffset < 0 ||
            yoffset < 0 ||
            width < 0 ||
            height < 0 ||
            xoffset + width > image.width ||
            yoffset + height > image.height
        {
            drop(image);
            return self.record(gl::INVALID_VALUE);
        }
        let pixels = decode_rgba8(format, ty, width, height, data, self.unpack_alignment);
        image.write(xoffset, yoffset, width, height, &pixels);
    }

    /// Reads from the cached read target, which may predate the latest
    /// attachment changes.
    fn read_source(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) -> Vec<u8> {
        match self.read_target {
            Some(ref target) => target.borrow().read(x, y, width, height),
            None => vec![0; (cmp::max(width, 0) * cmp::max(height, 0) * 4) as usize],
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn copy_tex_image_2d(
        &mut self,
        target: GLenum,
        level: GLint,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
    ) {
        if !is_texture_image_target(target) {
            return self.record(gl::INVALID_ENUM);
        }
        if level < 0 || width < 0 || height < 0 || border != 0 {
            return self.record(gl::INVALID_VALUE);
        }
        if !self.check_complete(self.read_framebuffer) {
            return;
        }
        let pixels = self.read_source(x, y, width, height);
        let texture = self.bound_texture(target);
        let Some(texture) = self.textures.get_mut(&texture) else {
            return self.record(gl::INVALID_OPERATION);
        };
        texture.images.insert(
            (target, level),
            Image::shared(Image::from_pixels(width, height, pixels)),
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn copy_tex_sub_image_2d(
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
        if !is_texture_image_target(target) {
            return self.record(gl::INVALID_ENUM);
        }
        if !self.check_complete(self.read_framebuffer) {
            return;
        }
        let Some(image) = self.texture_image(target, level) else {
            return self.record(gl::INVALID_OPERATION);
        };
        let pixels = self.read_source(x, y, width, height);
        image.borrow_mut().write(xoffset, yoffset, width, height, &pixels);
    }

    fn generate_mipmap(&mut self, target: GLenum) {
        let faces: &[GLenum] = match target {
            gl::TEXTURE_2D => &[gl::TEXTURE_2D],
            gl::TEXTURE_CUBE_MAP => &[
                gl::TEXTURE_CUBE_MAP_POSITIVE_X,
                gl::TEXTURE_CUBE_MAP_NEGATIVE_X,
                gl::TEXTURE_CUBE_MAP_POSITIVE_Y,
                gl::TEXTURE_CUBE_MAP_NEGATIVE_Y,
                gl::TEXTURE_CUBE_MAP_POSITIVE_Z,
                gl::TEXTURE_CUBE_MAP_NEGATIVE_Z,
            ],
            _ => return self.record(gl::INVALID_ENUM),
        };
        let texture = self.bound_texture(target);
        let Some(texture) = self.textures.get_mut(&texture) else {
            return self.record(gl::INVALID_OPERATION);
        };
        if faces.iter().any(|face| !texture.images.contains_key(&(*face, 0))) {
            return self.record(gl::INVALID_OPERATION);
        }
        for &face in faces {
            // The whole chain is reallocated, base level included.
            let base = texture.images[&(face, 0)].borrow().clone();
            let mut level = 0;
            let mut image = base;
            loop {
                let next = image.downsample();
                let done = image.width <= 1 && image.height <= 1;
                texture.images.insert((face, level), Image::shared(image));
                if done {
                    break;
                }
                image = next;
                level += 1;
            }
        }
    }

    fn framebuffer_attach(&mut self, target: GLenum, attachment: GLenum, object: Option<Attachment>) {
        if !is_framebuffer_target(target) || !is_attachment_point(attachment) {
            return self.record(gl::INVALID_ENUM);
        }
        let framebuffer = self.bound_framebuffer(target);
        let Some(fb) = self.framebuffers.get_mut(&framebuffer) else {
            return self.record(gl::INVALID_OPERATION);
        };
        match object {
            Some(object) => fb.attachments.insert(attachment, object),
            None => fb.attachments.remove(&attachment),
        };
    }

    fn renderbuffer_storage(&mut self, target: GLenum, internal_format: GLenum, width: GLsizei, height: GLsizei) {
        if target != gl::RENDERBUFFER {
            return self.record(gl::INVALID_ENUM);
        }
        let supported = match renderbuffer_format(internal_format) {
            Some((_, Some(extension))) => self.has_extension(extension),
            Some((_, None)) => true,
            None => false,
        };
        if !supported {
            return self.record(gl::INVALID_ENUM);
        }
        if width < 0 || height < 0 || width > MAX_SIZE || height > MAX_SIZE {
            return self.record(gl::INVALID_VALUE);
        }
        let Some(renderbuffer) = self.renderbuffers.get_mut(&self.renderbuffer) else {
            return self.record(gl::INVALID_OPERATION);
        };
        renderbuffer.internal_format = internal_format;
        renderbuffer.storage = Image::shared(Image::new(width, height));
    }

    fn get_renderbuffer_parameter(&mut self, target: GLenum, pname: GLenum) -> GLint {
        if target != gl::RENDERBUFFER {
            self.record(gl::INVALID_ENUM);
            return 0;
        }
        let Some(renderbuffer) = self.renderbuffers.get(&self.renderbuffer) else {
            self.record(gl::INVALID_OPERATION);
            return 0;
        };
        let sizes = renderbuffer_format(renderbuffer.internal_format)
            .map(|(sizes, _)| sizes)
            .unwrap_or_default();
        let (width, height) = {
            let storage = renderbuffer.storage.borrow();
            (storage.width, storage.height)
        };
        let value = match pname {
            gl::RENDERBUFFER_WIDTH => Some(width),
            gl::RENDERBUFFER_HEIGHT => Some(height),
            gl::RENDERBUFFER_INTERNAL_FORMAT => Some(renderbuffer.internal_format as GLint),
            gl::RENDERBUFFER_RED_SIZE => Some(sizes.0[0]),
            gl::RENDERBUFFER_GREEN_SIZE => Some(sizes.0[1]),
            gl::RENDERBUFFER_BLUE_SIZE => Some(sizes.0[2]),
            gl::RENDERBUFFER_ALPHA_SIZE => Some(sizes.0[3]),
            gl::RENDERBUFFER_DEPTH_SIZE => Some(sizes.0[4]),
            gl::RENDERBUFFER_STENCIL_SIZE => Some(sizes.0[5]),
            _ => None,
        };
        value.unwrap_or_else(|| {
            self.record(gl::INVALID_ENUM);
            0
        })
    }

    fn get_framebuffer_attachment_parameter(&mut self, target: GLenum, attachment: GLenum, pname: GLenum) -> GLint {
        if !is_framebuffer_target(target) || !is_attachment_point(attachment) {
            self.record(gl::INVALID_ENUM);
            return 0;
        }
        let framebuffer = self.bound_framebuffer(target);
        let Some(fb) = self.framebuffers.get(&framebuffer) else {
            self.record(gl::INVALID_OPERATION);
            return 0;
        };
        let attached = fb.attachments.get(&attachment).copied();
        let value = match (pname, attached) {
            (gl::FRAMEBUFFER_ATTACHMENT_OBJECT_TYPE, None) => Some(gl::NONE as GLint),
            (gl::FRAMEBUFFER_ATTACHMENT_OBJECT_TYPE, Some(Attachment::Texture { .. })) => {
                Some(gl::TEXTURE as GLint)
            },
            (gl::FRAMEBUFFER_ATTACHMENT_OBJECT_TYPE, Some(Attachment::Renderbuffer(_))) => {
                Some(gl::RENDERBUFFER as GLint)
            },
            (gl::FRAMEBUFFER_ATTACHMENT_OBJECT_NAME, Some(Attachment::Texture { name, .. })) |
            (gl::FRAMEBUFFER_ATTACHMENT_OBJECT_NAME, Some(Attachment::Renderbuffer(name))) => {
                Some(name as GLint)
            },
            (gl::FRAMEBUFFER_ATTACHMENT_TEXTURE_LEVEL, Some(Attachment::Texture { level, .. })) => {
                Some(level)
            },
            _ => None,
        };
        value.unwrap_or_else(|| {
            self.record(gl::INVALID_ENUM);
            0
        })
    }

    fn draw_buffers(&mut self, bufs: &[GLenum]) {
        if bufs.len() > MAX_COLOR_ATTACHMENTS as usize {
            return self.record(gl::INVALID_VALUE);
        }
        let framebuffer = self.draw_framebuffer;
        let valid = bufs
            .iter()
            .enumerate()
            .all(|(i, &buf)| buf == gl::NONE || buf == gl::COLOR_ATTACHMENT0 + i as GLenum);
        match self.framebuffers.get_mut(&framebuffer) {
            Some(fb) if valid => fb.draw_buffers = bufs.to_vec(),
            _ => self.record(gl::INVALID_OPERATION),
        }
    }

    fn blit_framebuffer(
        &mut self,
        src: [GLint; 4],
        dst: [GLint; 4],
        mask: GLbitfield,
        filter: GLenum,
    ) {
        if filter != gl::NEAREST && filter != gl::LINEAR {
            return self.record(gl::INVALID_ENUM);
        }
        if mask & !(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT | gl::STENCIL_BUFFER_BIT) != 0 {
            return self.record(gl::INVALID_VALUE);
        }
        if !self.check_complete(self.read_framebuffer) || !self.check_complete(self.draw_framebuffer) {
            return;
        }
        if mask & gl::COLOR_BUFFER_BIT == 0 {
            return;
        }
        let (src_x, src_y) = (cmp::min(src[0], src[2]), cmp::min(src[1], src[3]));
        let (src_w, src_h) = ((src[2] - src[0]).abs(), (src[3] - src[1]).abs());
        let (dst_x, dst_y) = (cmp::min(dst[0], dst[2]), cmp::min(dst[1], dst[3]));
        let (dst_w, dst_h) = ((dst[2] - dst[0]).abs(), (dst[3] - dst[1]).abs());
        if src_w == 0 || src_h == 0 || dst_w == 0 || dst_h == 0 {
            return;
        }
        let source = self.read_source(src_x, src_y, src_w, src_h);
        let mut scaled = vec![0; (dst_w * dst_h * 4) as usize];
        for y in 0..dst_h {
            for x in 0..dst_w {
                let (sx, sy) = (x * src_w / dst_w, y * src_h / dst_h);
                let from = ((sy * src_w + sx) * 4) as usize;
                let to = ((y * dst_w + x) * 4) as usize;
                scaled[to..to + 4].copy_from_slice(&source[from..from + 4]);
            }
        }
        if let Some(ref target) = self.draw_target {
            target.borrow_mut().write(dst_x, dst_y, dst_w, dst_h, &scaled);
        }
    }

    fn clear(&mut self, mask: GLbitfield) {
        if mask & !(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT | gl::STENCIL_BUFFER_BIT) != 0 {
            return self.record(gl::INVALID_VALUE);
        }
        if !self.check_complete(self.draw_framebuffer) {
            return;
        }
        if mask & gl::COLOR_BUFFER_BIT == 0 {
            return;
        }
        let rgba = self.clear_color.map(to_unorm8);
        if let Some(ref target) = self.draw_target {
            target.borrow_mut().fill(rgba);
        }
    }

    fn draw(&mut self, mode: GLenum, count: GLsizei) {
        if mode > 0x0006 {
            return self.record(gl::INVALID_ENUM);
        }
        if count < 0 {
            return self.record(gl::INVALID_VALUE);
        }
        if !self.check_complete(self.draw_framebuffer) {
            return;
        }
        self.draw_calls += 1;
    }

    fn read_pixels(
        &mut self,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        pixel_type: GLenum,
    ) -> Vec<u8> {
        if format != gl::RGBA || pixel_type != gl::UNSIGNED_BYTE {
            self.record(gl::INVALID_ENUM);
            return vec![];
        }
        if width < 0 || height < 0 {
            self.record(gl::INVALID_VALUE);
            return vec![];
        }
        if !self.check_complete(self.read_framebuffer) {
            return vec![];
        }
        self.read_source(x, y, width, height)
    }
}

/// Driver-wide state shared by the device and every function table it hands out.
struct SoftwareDriver {
    extensions: String,
    config_count: usize,
    fail_initialize: bool,
    fail_create_surface: bool,
    fail_next_make_current: bool,
    display_initialized: bool,
    initialize_calls: usize,
    next_handle: u32,
    contexts: FnvHashMap<u32, ContextObjects>,
    surfaces: FnvHashMap<u32, SharedImage>,
    destroyed_contexts: Vec<SoftwareContext>,
    destroyed_surfaces: Vec<SoftwareSurface>,
    retired: FnvHashMap<u32, ContextObjects>,
    current: Option<(u32, u32)>,
    make_current_calls: usize,
}

impl SoftwareDriver {
    fn next_handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn current_objects(&mut self) -> Option<&mut ContextObjects> {
        let (_, context) = self.current?;
        self.contexts.get_mut(&context)
    }
}

/// A software [`Device`]. Clones share the same driver state, so a test can
/// keep a handle for inspection while a session owns another.
#[derive(Clone)]
pub struct SoftwareDevice {
    driver: Rc<RefCell<SoftwareDriver>>,
}

impl Default for SoftwareDevice {
    fn default() -> Self {
        SoftwareDevice::new()
    }
}

impl SoftwareDevice {
    pub fn new() -> SoftwareDevice {
        SoftwareDevice::with_extensions(DEFAULT_EXTENSIONS)
    }

    pub fn with_extensions(extensions: &str) -> SoftwareDevice {
        SoftwareDevice {
            driver: Rc::new(RefCell::new(SoftwareDriver {
                extensions: extensions.to_owned(),
                config_count: 1,
                fail_initialize: false,
                fail_create_surface: false,
                fail_next_make_current: false,
                display_initialized: false,
                initialize_calls: 0,
                next_handle: 0,
                contexts: FnvHashMap::default(),
                surfaces: FnvHashMap::default(),
                destroyed_contexts: vec![],
                destroyed_surfaces: vec![],
                retired: FnvHashMap::default(),
                current: None,
                make_current_calls: 0,
            })),
        }
    }

    /// How many configs match any request.
    pub fn set_config_count(&self, count: usize) {
        self.driver.borrow_mut().config_count = count;
    }

    pub fn set_fail_initialize(&self, fail: bool) {
        self.driver.borrow_mut().fail_initialize = fail;
    }

    pub fn set_fail_create_surface(&self, fail: bool) {
        self.driver.borrow_mut().fail_create_surface = fail;
    }

    /// Rejects the next `make_current` call.
    pub fn fail_next_make_current(&self) {
        self.driver.borrow_mut().fail_next_make_current = true;
    }

    pub fn display_initialized(&self) -> bool {
        self.driver.borrow().display_initialized
    }

    pub fn initialize_calls(&self) -> usize {
        self.driver.borrow().initialize_calls
    }

    pub fn make_current_calls(&self) -> usize {
        self.driver.borrow().make_current_calls
    }

    pub fn current_context(&self) -> Option<SoftwareContext> {
        self.driver
            .borrow()
            .current
            .map(|(_, context)| SoftwareContext(context))
    }

    pub fn live_contexts(&self) -> usize {
        self.driver.borrow().contexts.len()
    }

    pub fn live_surfaces(&self) -> usize {
        self.driver.borrow().surfaces.len()
    }

    pub fn destroyed_contexts(&self) -> Vec<SoftwareContext> {
        self.driver.borrow().destroyed_contexts.clone()
    }

    pub fn destroyed_surfaces(&self) -> Vec<SoftwareSurface> {
        self.driver.borrow().destroyed_surfaces.clone()
    }

    /// Objects that were still alive when their context was destroyed.
    pub fn leaked_objects(&self) -> usize {
        self.driver.borrow().retired.values().map(ContextObjects::live_objects).sum()
    }

    /// Whether `name` is a live object of `context`. Destroyed contexts keep
    /// answering with the namespaces they had when they were destroyed.
    pub fn is_object(&self, context: SoftwareContext, name: GLuint) -> bool {
        let driver = self.driver.borrow();
        driver
            .contexts
            .get(&context.0)
            .or_else(|| driver.retired.get(&context.0))
            .is_some_and(|objects| objects.holds(name))
    }

    /// Objects alive in the namespaces of `context`.
    pub fn live_objects(&self, context: SoftwareContext) -> usize {
        self.driver
            .borrow()
            .contexts
            .get(&context.0)
            .map_or(0, ContextObjects::live_objects)
    }

    pub fn draw_calls(&self, context: SoftwareContext) -> usize {
        self.driver
            .borrow()
            .contexts
            .get(&context.0)
            .map_or(0, |objects| objects.draw_calls)
    }

    /// Queues `error` on `context` as if a driver call had raised it.
    pub fn inject_error(&self, context: SoftwareContext, error: GLenum) {
        if let Some(objects) = self.driver.borrow_mut().contexts.get_mut(&context.0) {
            objects.record(error);
        }
    }

    /// The error queued on `context`, without consuming it.
    pub fn pending_error(&self, context: SoftwareContext) -> GLenum {
        self.driver
            .borrow()
            .contexts
            .get(&context.0)
            .map_or(gl::NO_ERROR, |objects| objects.error)
    }
}

impl Device for SoftwareDevice {
    type Display = SoftwareDisplay;
    type Config = SoftwareConfig;
    type Context = SoftwareContext;
    type Surface = SoftwareSurface;

    fn get_display(&self) -> Option<SoftwareDisplay> {
        Some(SoftwareDisplay(1))
    }

    fn initialize(&self, _display: SoftwareDisplay) -> bool {
        let mut driver = self.driver.borrow_mut();
        driver.initialize_calls += 1;
        if driver.fail_initialize {
            return false;
        }
        driver.display_initialized = true;
        true
    }

    fn terminate(&self, _display: SoftwareDisplay) {
        let mut driver = self.driver.borrow_mut();
        debug!(
            "Terminating software display with {} contexts and {} surfaces left",
            driver.contexts.len(),
            driver.surfaces.len()
        );
        driver.display_initialized = false;
        driver.current = None;
        driver.contexts.clear();
        driver.surfaces.clear();
    }

    fn choose_config(
        &self,
        _display: SoftwareDisplay,
        request: &ConfigRequest,
        max: usize,
    ) -> Vec<SoftwareConfig> {
        let driver = self.driver.borrow();
        let satisfiable = request.red_size <= 8 &&
            request.green_size <= 8 &&
            request.blue_size <= 8 &&
            request.alpha_size <= 8 &&
            request.depth_size <= 24 &&
            request.stencil_size <= 8;
        if !driver.display_initialized || !satisfiable {
            return vec![];
        }
        (0..cmp::min(driver.config_count, max))
            .map(|index| SoftwareConfig(index as u32 + 1))
            .collect()
    }

    fn create_context(
        &self,
        _display: SoftwareDisplay,
        _config: SoftwareConfig,
        client_version: i32,
    ) -> Option<SoftwareContext> {
        let mut driver = self.driver.borrow_mut();
        if !driver.display_initialized || client_version != 2 {
            return None;
        }
        let handle = driver.next_handle();
        let objects = ContextObjects::new(driver.extensions.clone());
        driver.contexts.insert(handle, objects);
        Some(SoftwareContext(handle))
    }

    fn create_pbuffer_surface(
        &self,
        _display: SoftwareDisplay,
        _config: SoftwareConfig,
        size: Size2D<i32>,
    ) -> Option<SoftwareSurface> {
        let mut driver = self.driver.borrow_mut();
        if driver.fail_create_surface || size.width < 0 || size.height < 0 {
            return None;
        }
        let handle = driver.next_handle();
        driver
            .surfaces
            .insert(handle, Image::shared(Image::new(size.width, size.height)));
        Some(SoftwareSurface(handle))
    }

    fn make_current(
        &self,
        _display: SoftwareDisplay,
        target: Option<(SoftwareSurface, SoftwareContext)>,
    ) -> bool {
        let mut driver = self.driver.borrow_mut();
        driver.make_current_calls += 1;
        if std::mem::take(&mut driver.fail_next_make_current) {
            return false;
        }
        let Some((surface, context)) = target else {
            driver.current = None;
            return true;
        };
        let Some(image) = driver.surfaces.get(&surface.0).cloned() else {
            return false;
        };
        let Some(objects) = driver.contexts.get_mut(&context.0) else {
            return false;
        };
        objects.attach_surface(image);
        driver.current = Some((surface.0, context.0));
        true
    }

    fn destroy_context(&self, _display: SoftwareDisplay, context: SoftwareContext) {
        let mut driver = self.driver.borrow_mut();
        if let Some(objects) = driver.contexts.remove(&context.0) {
            driver.retired.insert(context.0, objects);
            driver.destroyed_contexts.push(context);
        }
    }

    fn destroy_surface(&self, _display: SoftwareDisplay, surface: SoftwareSurface) {
        let mut driver = self.driver.borrow_mut();
        if driver.surfaces.remove(&surface.0).is_some() {
            driver.destroyed_surfaces.push(surface);
        }
    }

    fn load_gl(&self, _display: SoftwareDisplay, _context: SoftwareContext) -> Option<Rc<dyn Gl>> {
        Some(Rc::new(SoftwareGl {
            driver: self.driver.clone(),
        }))
    }
}

/// The function table of a [`SoftwareDevice`].
pub struct SoftwareGl {
    driver: Rc<RefCell<SoftwareDriver>>,
}

impl SoftwareGl {
    fn with_current<R, F>(&self, f: F) -> R
    where
        R: Default,
        F: FnOnce(&mut ContextObjects) -> R,
    {
        let mut driver = self.driver.borrow_mut();
        match driver.current_objects() {
            Some(objects) => f(objects),
            None => R::default(),
        }
    }
}

fn write_result<T: Copy>(result: &mut [T], values: &[T]) {
    let len = cmp::min(result.len(), values.len());
    result[..len].copy_from_slice(&values[..len]);
}

impl Gl for SoftwareGl {
    fn get_error(&self) -> GLenum {
        self.with_current(|c| c.take_error())
    }

    fn get_string(&self, which: GLenum) -> String {
        self.with_current(|c| match which {
            gl::VENDOR => "Headless WebGL".to_owned(),
            gl::RENDERER => "Software Rasterizer".to_owned(),
            gl::VERSION => "OpenGL ES 2.0 (software)".to_owned(),
            gl::SHADING_LANGUAGE_VERSION => "OpenGL ES GLSL ES 1.00".to_owned(),
            gl::EXTENSIONS => c.extensions.clone(),
            _ => {
                c.record(gl::INVALID_ENUM);
                String::new()
            },
        })
    }

    fn get_integer_v(&self, name: GLenum, result: &mut [GLint]) {
        self.with_current(|c| match c.get_integer(name) {
            Some(values) => write_result(result, &values),
            None => c.record(gl::INVALID_ENUM),
        })
    }

    fn get_float_v(&self, name: GLenum, result: &mut [GLfloat]) {
        self.with_current(|c| match c.get_float(name) {
            Some(values) => write_result(result, &values),
            None => c.record(gl::INVALID_ENUM),
        })
    }

    fn get_boolean_v(&self, name: GLenum, result: &mut [GLboolean]) {
        self.with_current(|c| match c.get_boolean(name) {
            Some(values) => write_result(result, &values),
            None => c.record(gl::INVALID_ENUM),
        })
    }

    fn enable(&self, cap: GLenum) {
        self.with_current(|c| {
            if is_capability(cap) {
                c.enabled.insert(cap);
            } else {
                c.record(gl::INVALID_ENUM);
            }
        })
    }

    fn disable(&self, cap: GLenum) {
        self.with_current(|c| {
            if is_capability(cap) {
                c.enabled.remove(&cap);
            } else {
                c.record(gl::INVALID_ENUM);
            }
        })
    }

    fn is_enabled(&self, cap: GLenum) -> GLboolean {
        self.with_current(|c| {
            if is_capability(cap) {
                c.enabled.contains(&cap) as GLboolean
            } else {
                c.record(gl::INVALID_ENUM);
                gl::FALSE
            }
        })
    }

    fn pixel_store_i(&self, name: GLenum, param: GLint) {
        self.with_current(|c| {
            let slot = match name {
                gl::UNPACK_ALIGNMENT => &mut c.unpack_alignment,
                gl::PACK_ALIGNMENT => &mut c.pack_alignment,
                _ => return c.record(gl::INVALID_ENUM),
            };
            if matches!(param, 1 | 2 | 4 | 8) {
                *slot = param;
            } else {
                c.record(gl::INVALID_VALUE);
            }
        })
    }

    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.with_current(|c| {
            if width < 0 || height < 0 {
                return c.record(gl::INVALID_VALUE);
            }
            c.viewport = [x, y, width, height];
        })
    }

    fn gen_buffers(&self, n: GLsizei) -> Vec<GLuint> {
        self.with_current(|c| {
            let names = c.gen_names(n);
            c.buffers.extend(&names);
            names
        })
    }

    fn gen_framebuffers(&self, n: GLsizei) -> Vec<GLuint> {
        self.with_current(|c| {
            let names = c.gen_names(n);
            for &name in &names {
                c.framebuffers.insert(name, Framebuffer::default());
            }
            names
        })
    }

    fn gen_renderbuffers(&self, n: GLsizei) -> Vec<GLuint> {
        self.with_current(|c| {
            let names = c.gen_names(n);
            for &name in &names {
                c.renderbuffers.insert(name, Renderbuffer::default());
            }
            names
        })
    }

    fn gen_textures(&self, n: GLsizei) -> Vec<GLuint> {
        self.with_current(|c| {
            let names = c.gen_names(n);
            for &name in &names {
                c.textures.insert(name, Texture::default());
            }
            names
        })
    }

    fn gen_vertex_arrays(&self, n: GLsizei) -> Vec<GLuint> {
        self.with_current(|c| {
            let names = c.gen_names(n);
            c.vertex_arrays.extend(&names);
            names
        })
    }

    fn create_program(&self) -> GLuint {
        self.with_current(|c| {
            let name = c.gen_names(1)[0];
            c.programs.insert(name);
            name
        })
    }

    fn create_shader(&self, shader_type: GLenum) -> GLuint {
        self.with_current(|c| {
            if shader_type != gl::VERTEX_SHADER && shader_type != gl::FRAGMENT_SHADER {
                c.record(gl::INVALID_ENUM);
                return 0;
            }
            let name = c.gen_names(1)[0];
            c.shaders.insert(name);
            name
        })
    }

    fn delete_buffers(&self, buffers: &[GLuint]) {
        self.with_current(|c| {
            for buffer in buffers {
                c.buffers.remove(buffer);
                if c.element_array_buffer == *buffer {
                    c.element_array_buffer = 0;
                }
            }
        })
    }

    fn delete_framebuffers(&self, framebuffers: &[GLuint]) {
        self.with_current(|c| c.delete_framebuffers(framebuffers))
    }

    fn delete_renderbuffers(&self, renderbuffers: &[GLuint]) {
        self.with_current(|c| c.delete_renderbuffers(renderbuffers))
    }

    fn delete_textures(&self, textures: &[GLuint]) {
        self.with_current(|c| c.delete_textures(textures))
    }

    fn delete_vertex_arrays(&self, vertex_arrays: &[GLuint]) {
        self.with_current(|c| {
            for vao in vertex_arrays {
                c.vertex_arrays.remove(vao);
                if c.vertex_array == *vao {
                    c.vertex_array = 0;
                }
            }
        })
    }

    fn delete_program(&self, program: GLuint) {
        self.with_current(|c| {
            c.programs.remove(&program);
        })
    }

    fn delete_shader(&self, shader: GLuint) {
        self.with_current(|c| {
            c.shaders.remove(&shader);
        })
    }

    fn is_buffer(&self, buffer: GLuint) -> GLboolean {
        self.with_current(|c| c.buffers.contains(&buffer) as GLboolean)
    }

    fn is_framebuffer(&self, framebuffer: GLuint) -> GLboolean {
        self.with_current(|c| c.framebuffers.contains_key(&framebuffer) as GLboolean)
    }

    fn is_renderbuffer(&self, renderbuffer: GLuint) -> GLboolean {
        self.with_current(|c| c.renderbuffers.contains_key(&renderbuffer) as GLboolean)
    }

    fn is_texture(&self, texture: GLuint) -> GLboolean {
        self.with_current(|c| c.textures.contains_key(&texture) as GLboolean)
    }

    fn is_vertex_array(&self, vertex_array: GLuint) -> GLboolean {
        self.with_current(|c| c.vertex_arrays.contains(&vertex_array) as GLboolean)
    }

    fn is_program(&self, program: GLuint) -> GLboolean {
        self.with_current(|c| c.programs.contains(&program) as GLboolean)
    }

    fn is_shader(&self, shader: GLuint) -> GLboolean {
        self.with_current(|c| c.shaders.contains(&shader) as GLboolean)
    }

    fn bind_buffer(&self, target: GLenum, buffer: GLuint) {
        self.with_current(|c| {
            if target != gl::ARRAY_BUFFER && target != gl::ELEMENT_ARRAY_BUFFER {
                return c.record(gl::INVALID_ENUM);
            }
            if buffer != 0 {
                c.buffers.insert(buffer);
            }
            if target == gl::ELEMENT_ARRAY_BUFFER {
                c.element_array_buffer = buffer;
            }
        })
    }

    fn bind_framebuffer(&self, target: GLenum, framebuffer: GLuint) {
        self.with_current(|c| c.bind_framebuffer(target, framebuffer))
    }

    fn bind_renderbuffer(&self, target: GLenum, renderbuffer: GLuint) {
        self.with_current(|c| {
            if target != gl::RENDERBUFFER {
                return c.record(gl::INVALID_ENUM);
            }
            if renderbuffer != 0 {
                c.renderbuffers.entry(renderbuffer).or_default();
            }
            c.renderbuffer = renderbuffer;
        })
    }

    fn bind_texture(&self, target: GLenum, texture: GLuint) {
        self.with_current(|c| {
            if target != gl::TEXTURE_2D && target != gl::TEXTURE_CUBE_MAP {
                return c.record(gl::INVALID_ENUM);
            }
            let unit = c.active_unit;
            if texture == 0 {
                c.texture_bindings.remove(&(unit, target));
            } else {
                c.textures.entry(texture).or_default();
                c.texture_bindings.insert((unit, target), texture);
            }
        })
    }

    fn bind_vertex_array(&self, vao: GLuint) {
        self.with_current(|c| {
            if vao != 0 && !c.vertex_arrays.contains(&vao) {
                return c.record(gl::INVALID_OPERATION);
            }
            c.vertex_array = vao;
        })
    }

    fn active_texture(&self, texture: GLenum) {
        self.with_current(|c| {
            if !(gl::TEXTURE0..gl::TEXTURE0 + MAX_TEXTURE_UNITS).contains(&texture) {
                return c.record(gl::INVALID_ENUM);
            }
            c.active_unit = texture;
        })
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
        self.with_current(|c| {
            c.tex_image_2d(
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
        })
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
        self.with_current(|c| {
            c.tex_sub_image_2d(target, level, xoffset, yoffset, width, height, format, ty, data)
        })
    }

    fn copy_tex_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        _internal_format: GLenum,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
    ) {
        self.with_current(|c| c.copy_tex_image_2d(target, level, x, y, width, height, border))
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
        self.with_current(|c| {
            c.copy_tex_sub_image_2d(target, level, xoffset, yoffset, x, y, width, height)
        })
    }

    fn generate_mipmap(&self, target: GLenum) {
        self.with_current(|c| c.generate_mipmap(target))
    }

    fn framebuffer_texture_2d(
        &self,
        target: GLenum,
        attachment: GLenum,
        textarget: GLenum,
        texture: GLuint,
        level: GLint,
    ) {
        self.with_current(|c| {
            if texture == 0 {
                return c.framebuffer_attach(target, attachment, None);
            }
            if !is_texture_image_target(textarget) {
                return c.record(gl::INVALID_ENUM);
            }
            if level != 0 {
                return c.record(gl::INVALID_VALUE);
            }
            if !c.textures.contains_key(&texture) {
                return c.record(gl::INVALID_OPERATION);
            }
            let object = Attachment::Texture {
                name: texture,
                target: textarget,
                level,
            };
            c.framebuffer_attach(target, attachment, Some(object))
        })
    }

    fn framebuffer_renderbuffer(
        &self,
        target: GLenum,
        attachment: GLenum,
        renderbuffertarget: GLenum,
        renderbuffer: GLuint,
    ) {
        self.with_current(|c| {
            if renderbuffertarget != gl::RENDERBUFFER {
                return c.record(gl::INVALID_ENUM);
            }
            if renderbuffer == 0 {
                return c.framebuffer_attach(target, attachment, None);
            }
            if !c.renderbuffers.contains_key(&renderbuffer) {
                return c.record(gl::INVALID_OPERATION);
            }
            c.framebuffer_attach(target, attachment, Some(Attachment::Renderbuffer(renderbuffer)))
        })
    }

    fn renderbuffer_storage(
        &self,
        target: GLenum,
        internalformat: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) {
        self.with_current(|c| c.renderbuffer_storage(target, internalformat, width, height))
    }

    fn get_renderbuffer_parameter_iv(&self, target: GLenum, pname: GLenum) -> GLint {
        self.with_current(|c| c.get_renderbuffer_parameter(target, pname))
    }

    fn get_framebuffer_attachment_parameter_iv(
        &self,
        target: GLenum,
        attachment: GLenum,
        pname: GLenum,
    ) -> GLint {
        self.with_current(|c| c.get_framebuffer_attachment_parameter(target, attachment, pname))
    }

    fn check_frame_buffer_status(&self, target: GLenum) -> GLenum {
        self.with_current(|c| {
            if !is_framebuffer_target(target) {
                c.record(gl::INVALID_ENUM);
                return 0;
            }
            c.framebuffer_status(c.bound_framebuffer(target))
        })
    }

    fn draw_buffers(&self, bufs: &[GLenum]) {
        self.with_current(|c| c.draw_buffers(bufs))
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
        self.with_current(|c| {
            c.blit_framebuffer(
                [src_x0, src_y0, src_x1, src_y1],
                [dst_x0, dst_y0, dst_x1, dst_y1],
                mask,
                filter,
            )
        })
    }

    fn clear_color(&self, r: GLclampf, g: GLclampf, b: GLclampf, a: GLclampf) {
        self.with_current(|c| c.clear_color = [r, g, b, a])
    }

    fn clear_depth(&self, depth: GLclampd) {
        self.with_current(|c| c.clear_depth = depth.clamp(0.0, 1.0))
    }

    fn clear_stencil(&self, s: GLint) {
        self.with_current(|c| c.clear_stencil = s)
    }

    fn clear(&self, buffer_mask: GLbitfield) {
        self.with_current(|c| c.clear(buffer_mask))
    }

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        self.with_current(|c| {
            if first < 0 {
                return c.record(gl::INVALID_VALUE);
            }
            c.draw(mode, count)
        })
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, element_type: GLenum, _indices_offset: GLuint) {
        self.with_current(|c| {
            if element_type != gl::UNSIGNED_BYTE && element_type != gl::UNSIGNED_SHORT {
                return c.record(gl::INVALID_ENUM);
            }
            if c.element_array_buffer == 0 {
                return c.record(gl::INVALID_OPERATION);
            }
            c.draw(mode, count)
        })
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
        self.with_current(|c| c.read_pixels(x, y, width, height, format, pixel_type))
    }
}
