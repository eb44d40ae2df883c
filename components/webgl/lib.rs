/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

#![deny(unsafe_code)]

pub mod active;
pub mod context;
pub mod device;
#[cfg(feature = "egl")]
#[allow(unsafe_code)]
pub mod egl;
pub mod error;
pub mod framebuffer;
pub mod gl;
pub mod options;
pub mod parameters;
pub mod registry;
pub mod rendering_context;
pub mod session;
#[cfg(feature = "software")]
pub mod software;
pub mod stream;

pub use crate::context::{ContextState, GLContextAttributes, WebGLContextId};
pub use crate::error::{InvalidContext, WebGLCreateContextError, WebGLError, WebGLResult};
pub use crate::options::SessionOptions;
pub use crate::rendering_context::WebGLRenderingContext;
pub use crate::session::WebGLSession;
