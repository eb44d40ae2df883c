/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use serde::{Deserialize, Serialize};

use crate::context::UnpackState;
use crate::device::Gl;
use crate::error::{WebGLError, WebGLResult};
use crate::gl::{self, GLenum};

/// The value of a `get_parameter` query.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum WebGLParameter {
    Bool(bool),
    Int(i32),
    Float(f32),
    String(String),
    IntArray(Vec<i32>),
    FloatArray(Vec<f32>),
    BoolArray(Vec<bool>),
}

macro_rules! parameters {
    ($name:ident { $(
        $variant:ident($kind:ident { $(
            $param:ident = gl::$value:ident,
        )+ }),
    )+ }) => {
        #[derive(Clone, Copy, Debug, Deserialize, Serialize)]
        pub enum $name { $(
            $variant($kind),
        )+}

        $(
            #[derive(Clone, Copy, Debug, Deserialize, Serialize)]
            #[repr(u32)]
            pub enum $kind { $(
                $param = gl::$value,
            )+}
        )+

        impl $name {
            pub fn from_u32(value: u32) -> WebGLResult<Self> {
                match value {
                    $($(gl::$value => Ok($name::$variant($kind::$param)),)+)+
                    _ => Err(WebGLError::InvalidEnum)
                }
            }
        }
    }
}

// Integer parameters are absent on purpose: anything not listed here is
// answered by `get_integer_v`.
parameters! {
    Parameter {
        Bool(ParameterBool {
            Blend = gl::BLEND,
            CullFace = gl::CULL_FACE,
            DepthTest = gl::DEPTH_TEST,
            DepthWritemask = gl::DEPTH_WRITEMASK,
            Dither = gl::DITHER,
            PolygonOffsetFill = gl::POLYGON_OFFSET_FILL,
            SampleCoverageInvert = gl::SAMPLE_COVERAGE_INVERT,
            ScissorTest = gl::SCISSOR_TEST,
            StencilTest = gl::STENCIL_TEST,
        }),
        Bool4(ParameterBool4 {
            ColorWritemask = gl::COLOR_WRITEMASK,
        }),
        String(ParameterString {
            Extensions = gl::EXTENSIONS,
            Renderer = gl::RENDERER,
            ShadingLanguageVersion = gl::SHADING_LANGUAGE_VERSION,
            Vendor = gl::VENDOR,
            Version = gl::VERSION,
        }),
        Int2(ParameterInt2 {
            MaxViewportDims = gl::MAX_VIEWPORT_DIMS,
        }),
        Int4(ParameterInt4 {
            ScissorBox = gl::SCISSOR_BOX,
            Viewport = gl::VIEWPORT,
        }),
        Float(ParameterFloat {
            DepthClearValue = gl::DEPTH_CLEAR_VALUE,
            LineWidth = gl::LINE_WIDTH,
            MaxTextureMaxAnisotropyExt = gl::MAX_TEXTURE_MAX_ANISOTROPY_EXT,
            PolygonOffsetFactor = gl::POLYGON_OFFSET_FACTOR,
            PolygonOffsetUnits = gl::POLYGON_OFFSET_UNITS,
            SampleCoverageValue = gl::SAMPLE_COVERAGE_VALUE,
        }),
        Float2(ParameterFloat2 {
            AliasedPointSizeRange = gl::ALIASED_POINT_SIZE_RANGE,
            AliasedLineWidthRange = gl::ALIASED_LINE_WIDTH_RANGE,
            DepthRange = gl::DEPTH_RANGE,
        }),
        Float4(ParameterFloat4 {
            BlendColor = gl::BLEND_COLOR,
            ColorClearValue = gl::COLOR_CLEAR_VALUE,
        }),
    }
}

fn get_bools<const N: usize>(gl: &dyn Gl, name: GLenum) -> [bool; N] {
    let mut value = [gl::FALSE; N];
    gl.get_boolean_v(name, &mut value);
    value.map(|flag| flag != gl::FALSE)
}

fn get_ints<const N: usize>(gl: &dyn Gl, name: GLenum) -> [i32; N] {
    let mut value = [0; N];
    gl.get_integer_v(name, &mut value);
    value
}

fn get_floats<const N: usize>(gl: &dyn Gl, name: GLenum) -> [f32; N] {
    let mut value = [0.; N];
    gl.get_float_v(name, &mut value);
    value
}

/// Answers a parameter query. The WebGL unpack parameters come from
/// `unpack`, since they are never forwarded to the driver.
pub fn get_parameter(gl: &dyn Gl, unpack: &UnpackState, name: GLenum) -> WebGLParameter {
    match name {
        gl::UNPACK_FLIP_Y_WEBGL => return WebGLParameter::Bool(unpack.flip_y),
        gl::UNPACK_PREMULTIPLY_ALPHA_WEBGL => {
            return WebGLParameter::Bool(unpack.premultiply_alpha);
        },
        gl::UNPACK_COLORSPACE_CONVERSION_WEBGL => {
            return WebGLParameter::Int(unpack.color_space.as_gl_constant() as i32);
        },
        _ => {},
    }

    match Parameter::from_u32(name) {
        Ok(Parameter::Bool(param)) => {
            let [value] = get_bools::<1>(gl, param as GLenum);
            WebGLParameter::Bool(value)
        },
        Ok(Parameter::Bool4(param)) => {
            WebGLParameter::BoolArray(get_bools::<4>(gl, param as GLenum).to_vec())
        },
        Ok(Parameter::String(param)) => WebGLParameter::String(gl.get_string(param as GLenum)),
        Ok(Parameter::Int2(param)) => {
            WebGLParameter::IntArray(get_ints::<2>(gl, param as GLenum).to_vec())
        },
        Ok(Parameter::Int4(param)) => {
            WebGLParameter::IntArray(get_ints::<4>(gl, param as GLenum).to_vec())
        },
        Ok(Parameter::Float(param)) => {
            let [value] = get_floats::<1>(gl, param as GLenum);
            WebGLParameter::Float(value)
        },
        Ok(Parameter::Float2(param)) => {
            WebGLParameter::FloatArray(get_floats::<2>(gl, param as GLenum).to_vec())
        },
        Ok(Parameter::Float4(param)) => {
            WebGLParameter::FloatArray(get_floats::<4>(gl, param as GLenum).to_vec())
        },
        Err(_) => {
            let [value] = get_ints::<1>(gl, name);
            WebGLParameter::Int(value)
        },
    }
}
