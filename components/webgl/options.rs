/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Configuration options for a WebGL session. Created in code or loaded from
//! a JSON document.

use std::default::Default;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Extensions every context must expose before it is handed out.
pub const REQUIRED_EXTENSIONS: [&str; 2] = ["GL_OES_packed_depth_stencil", "GL_ANGLE_instanced_arrays"];

/// Session-wide flags for native context creation and teardown.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Extensions that must appear as whole tokens of `GL_EXTENSIONS`.
    pub required_extensions: Vec<String>,

    /// `EGL_CONTEXT_CLIENT_VERSION` requested for every context.
    pub context_client_version: i32,

    /// Bits per color channel requested from config selection.
    pub color_bits: i32,

    pub depth_bits: i32,

    pub stencil_bits: i32,

    /// Destroy a context's pbuffer surface as soon as the context is disposed.
    /// When false, surfaces are kept until the display is terminated.
    pub destroy_surface_on_dispose: bool,

    /// Path of the EGL library to load. `None` searches the platform's
    /// default library names.
    pub egl_library: Option<PathBuf>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            required_extensions: REQUIRED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            context_client_version: 2,
            color_bits: 8,
            depth_bits: 24,
            stencil_bits: 8,
            destroy_surface_on_dispose: false,
            egl_library: None,
        }
    }
}

impl SessionOptions {
    /// Parses options from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<SessionOptions, OptionsError> {
        let options: SessionOptions = serde_json::from_str(json).map_err(OptionsError::Parse)?;
        options.validate()?;
        Ok(options)
    }

    fn validate(&self) -> Result<(), OptionsError> {
        if self.context_client_version < 1 {
            return Err(OptionsError::InvalidValue(
                "context_client_version",
                self.context_client_version,
            ));
        }
        for (name, bits) in [
            ("color_bits", self.color_bits),
            ("depth_bits", self.depth_bits),
            ("stencil_bits", self.stencil_bits),
        ] {
            if bits < 0 {
                return Err(OptionsError::InvalidValue(name, bits));
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum OptionsError {
    Parse(serde_json::Error),
    InvalidValue(&'static str, i32),
}

impl std::error::Error for OptionsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            OptionsError::Parse(ref error) => Some(error),
            OptionsError::InvalidValue(..) => None,
        }
    }
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            OptionsError::Parse(ref error) => write!(f, "Invalid session options: {}", error),
            OptionsError::InvalidValue(name, value) => {
                write!(f, "Invalid value {} for option {}", value, name)
            },
        }
    }
}
