/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::gl::{self, GLenum};

/// A GL error that the binding synthesizes on behalf of a context.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum WebGLError {
    InvalidEnum,
    InvalidFramebufferOperation,
    InvalidOperation,
    InvalidValue,
    OutOfMemory,
    ContextLost,
}

impl WebGLError {
    pub fn as_gl_constant(&self) -> GLenum {
        match *self {
            WebGLError::InvalidEnum => gl::INVALID_ENUM,
            WebGLError::InvalidFramebufferOperation => gl::INVALID_FRAMEBUFFER_OPERATION,
            WebGLError::InvalidOperation => gl::INVALID_OPERATION,
            WebGLError::InvalidValue => gl::INVALID_VALUE,
            WebGLError::OutOfMemory => gl::OUT_OF_MEMORY,
            WebGLError::ContextLost => gl::CONTEXT_LOST_WEBGL,
        }
    }

    pub fn from_gl_constant(constant: GLenum) -> Option<Self> {
        Some(match constant {
            gl::INVALID_ENUM => WebGLError::InvalidEnum,
            gl::INVALID_FRAMEBUFFER_OPERATION => WebGLError::InvalidFramebufferOperation,
            gl::INVALID_OPERATION => WebGLError::InvalidOperation,
            gl::INVALID_VALUE => WebGLError::InvalidValue,
            gl::OUT_OF_MEMORY => WebGLError::OutOfMemory,
            gl::CONTEXT_LOST_WEBGL => WebGLError::ContextLost,
            _ => return None,
        })
    }
}

impl std::error::Error for WebGLError {}

impl fmt::Display for WebGLError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let description = match *self {
            WebGLError::InvalidEnum => "INVALID_ENUM",
            WebGLError::InvalidFramebufferOperation => "INVALID_FRAMEBUFFER_OPERATION",
            WebGLError::InvalidOperation => "INVALID_OPERATION",
            WebGLError::InvalidValue => "INVALID_VALUE",
            WebGLError::OutOfMemory => "OUT_OF_MEMORY",
            WebGLError::ContextLost => "CONTEXT_LOST_WEBGL",
        };
        write!(f, "WebGLError({})", description)
    }
}

pub type WebGLResult<T> = Result<T, WebGLError>;

/// The construction step that left a context unusable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ContextFailure {
    /// The platform has no default display.
    NoDisplay,
    /// The display exists but could not be initialized.
    DisplayInitialization,
    /// Config selection did not yield exactly one config.
    ChooseConfig(usize),
    CreateContext,
    CreateSurface,
    /// The context could not be made current, either during construction or
    /// on a later switch.
    MakeCurrent,
    LoadFunctions,
    /// A required extension is absent from `GL_EXTENSIONS`.
    MissingExtension(String),
}

impl std::error::Error for ContextFailure {}

impl fmt::Display for ContextFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ContextFailure::NoDisplay => write!(f, "No display available"),
            ContextFailure::DisplayInitialization => write!(f, "Failed to initialize the display"),
            ContextFailure::ChooseConfig(found) => {
                write!(f, "Expected exactly one matching config, found {}", found)
            },
            ContextFailure::CreateContext => write!(f, "Failed to create the native context"),
            ContextFailure::CreateSurface => write!(f, "Failed to create the pbuffer surface"),
            ContextFailure::MakeCurrent => write!(f, "Failed to make the context current"),
            ContextFailure::LoadFunctions => write!(f, "Failed to load GL functions"),
            ContextFailure::MissingExtension(ref name) => {
                write!(f, "Missing required extension {}", name)
            },
        }
    }
}

/// Context construction failed. The cause is logged, not exposed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WebGLCreateContextError;

impl std::error::Error for WebGLCreateContextError {}

impl fmt::Display for WebGLCreateContextError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Error creating WebGLContext")
    }
}

/// The context is unknown, disposed, failed, or could not be made current.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InvalidContext;

impl std::error::Error for InvalidContext {}

impl fmt::Display for InvalidContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Invalid GL context")
    }
}
