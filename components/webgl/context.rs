/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::rc::Rc;

use euclid::default::Size2D;
use log::warn;
use pixels::{DEFAULT_UNPACK_ALIGNMENT, UnpackFlags};
use serde::{Deserialize, Serialize};

use crate::device::{Device, Gl};
use crate::error::{ContextFailure, WebGLError};
use crate::framebuffer::RenderTargetTracker;
use crate::gl::{self, GLenum};
use crate::registry::ObjectRegistry;
use crate::stream::StreamAttributes;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct WebGLContextId(pub usize);

/// The attributes a context is created with. Only the size, `alpha`,
/// `depth` and `stencil` shape native config selection.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct GLContextAttributes {
    pub width: i32,
    pub height: i32,
    pub alpha: bool,
    pub depth: bool,
    pub stencil: bool,
    pub antialias: bool,
    pub premultiplied_alpha: bool,
    pub preserve_drawing_buffer: bool,
    pub prefer_low_power_to_high_performance: bool,
    pub fail_if_major_performance_caveat: bool,
}

impl GLContextAttributes {
    /// The WebGL default attributes for a drawing buffer of `size`.
    pub fn new(size: Size2D<i32>) -> GLContextAttributes {
        GLContextAttributes {
            width: size.width,
            height: size.height,
            alpha: true,
            depth: true,
            stencil: false,
            antialias: true,
            premultiplied_alpha: true,
            preserve_drawing_buffer: false,
            prefer_low_power_to_high_performance: false,
            fail_if_major_performance_caveat: false,
        }
    }

    pub fn size(&self) -> Size2D<i32> {
        Size2D::new(self.width, self.height)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ContextState {
    Initializing,
    Ready,
    Destroyed,
    Error(ContextFailure),
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ColorSpaceConversion {
    None,
    BrowserDefault,
}

impl ColorSpaceConversion {
    pub fn from_gl_constant(constant: GLenum) -> Option<Self> {
        match constant {
            gl::NONE => Some(ColorSpaceConversion::None),
            gl::BROWSER_DEFAULT_WEBGL => Some(ColorSpaceConversion::BrowserDefault),
            _ => None,
        }
    }

    pub fn as_gl_constant(&self) -> GLenum {
        match *self {
            ColorSpaceConversion::None => gl::NONE,
            ColorSpaceConversion::BrowserDefault => gl::BROWSER_DEFAULT_WEBGL,
        }
    }
}

/// Pixel storage parameters that are applied by the binding instead of the
/// driver, plus the unpack alignment needed to size uploads.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UnpackState {
    pub flip_y: bool,
    pub premultiply_alpha: bool,
    pub color_space: ColorSpaceConversion,
    pub alignment: u32,
}

impl Default for UnpackState {
    fn default() -> Self {
        UnpackState {
            flip_y: false,
            premultiply_alpha: false,
            color_space: ColorSpaceConversion::BrowserDefault,
            alignment: DEFAULT_UNPACK_ALIGNMENT,
        }
    }
}

impl UnpackState {
    pub fn flags(&self) -> UnpackFlags {
        let mut flags = UnpackFlags::empty();
        flags.set(UnpackFlags::FLIP_Y_AXIS, self.flip_y);
        flags.set(UnpackFlags::PREMULTIPLY_ALPHA, self.premultiply_alpha);
        flags
    }
}

/// Native handles owned by one context.
pub(crate) struct NativeHandles<D: Device> {
    pub config: D::Config,
    pub context: D::Context,
    pub surface: D::Surface,
}

/// Picks the deepest depth renderbuffer format the extensions allow.
pub fn preferred_depth_format(extensions: &str) -> GLenum {
    if has_extension(extensions, "GL_OES_depth32") {
        gl::DEPTH_COMPONENT32_OES
    } else if has_extension(extensions, "GL_OES_depth24") {
        gl::DEPTH_COMPONENT24_OES
    } else {
        gl::DEPTH_COMPONENT16
    }
}

/// Whether `name` is one of the whitespace separated tokens of `extensions`.
pub fn has_extension(extensions: &str, name: &str) -> bool {
    extensions.split_whitespace().any(|extension| extension == name)
}

/// Everything the session knows about one WebGL context.
pub struct GLContextData<D: Device> {
    pub(crate) native: Option<NativeHandles<D>>,
    pub(crate) gl: Option<Rc<dyn Gl>>,
    state: ContextState,
    pub(crate) attributes: GLContextAttributes,
    pub(crate) unpack: UnpackState,
    last_error: GLenum,
    pub(crate) preferred_depth_format: GLenum,
    pub(crate) registry: ObjectRegistry,
    pub(crate) render_targets: RenderTargetTracker,
    pub(crate) stream: StreamAttributes,
}

impl<D: Device> GLContextData<D> {
    pub(crate) fn new(attributes: GLContextAttributes) -> GLContextData<D> {
        GLContextData {
            native: None,
            gl: None,
            state: ContextState::Initializing,
            attributes,
            unpack: UnpackState::default(),
            last_error: gl::NO_ERROR,
            preferred_depth_format: gl::DEPTH_COMPONENT16,
            registry: ObjectRegistry::new(),
            render_targets: RenderTargetTracker::new(),
            stream: StreamAttributes::default(),
        }
    }

    pub fn state(&self) -> &ContextState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ContextState::Ready
    }

    pub fn attributes(&self) -> &GLContextAttributes {
        &self.attributes
    }

    pub fn unpack_state(&self) -> &UnpackState {
        &self.unpack
    }

    pub fn preferred_depth_format(&self) -> GLenum {
        self.preferred_depth_format
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn stream_attributes(&self) -> &StreamAttributes {
        &self.stream
    }

    pub(crate) fn set_state(&mut self, state: ContextState) {
        self.state = state;
    }

    pub(crate) fn fail(&mut self, failure: ContextFailure) {
        self.state = ContextState::Error(failure);
    }

    /// Records `error` for the next `get_error`, without clobbering an error
    /// that is already pending in the shadow or in the driver.
    ///
    /// The driver queue is consulted once. If it held an error, that error
    /// takes the shadow slot and `error` is dropped, since querying consumed
    /// it natively.
    pub fn set_error(&mut self, error: GLenum) {
        if error == gl::NO_ERROR || self.last_error != gl::NO_ERROR {
            return;
        }
        let Some(gl) = self.gl.as_ref() else {
            return;
        };
        let pending = gl.get_error();
        self.last_error = if pending != gl::NO_ERROR { pending } else { error };
    }

    pub(crate) fn webgl_error(&mut self, error: WebGLError) {
        warn!("WebGL error: {}", error);
        self.set_error(error.as_gl_constant());
    }

    /// Returns and clears one pending error, preferring the shadow slot.
    pub fn get_error(&mut self) -> GLenum {
        if self.last_error != gl::NO_ERROR {
            return std::mem::replace(&mut self.last_error, gl::NO_ERROR);
        }
        match self.gl.as_ref() {
            Some(gl) => gl.get_error(),
            None => gl::NO_ERROR,
        }
    }
}
