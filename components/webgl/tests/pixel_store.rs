/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use webgl::WebGLRenderingContext;
use webgl::context::ColorSpaceConversion;
use webgl::gl::{self, GLenum, GLsizei};
use webgl::parameters::WebGLParameter;
use webgl::software::SoftwareDevice;

use crate::init_context;

/// Uploads `pixels` into a fresh texture attached to a fresh framebuffer, so
/// the result can be read back.
fn upload(
    context: &mut WebGLRenderingContext<'_, SoftwareDevice>,
    width: GLsizei,
    height: GLsizei,
    format: GLenum,
    pixels: &[u8],
) {
    let texture = context.create_texture().unwrap();
    context.bind_texture(gl::TEXTURE_2D, texture);
    context.tex_image_2d(
        gl::TEXTURE_2D,
        0,
        format as i32,
        width,
        height,
        0,
        format,
        gl::UNSIGNED_BYTE,
        Some(pixels),
    );
    let framebuffer = context.create_framebuffer().unwrap();
    context.bind_framebuffer(gl::FRAMEBUFFER, framebuffer);
    context.framebuffer_texture_2d(
        gl::FRAMEBUFFER,
        gl::COLOR_ATTACHMENT0,
        gl::TEXTURE_2D,
        texture,
        0,
    );
}

#[test]
fn webgl_unpack_parameters_stay_out_of_the_driver() {
    let (_device, mut session, id) = init_context(4, 4);
    let mut context = session.context(id).unwrap();

    context.pixel_storei(gl::UNPACK_FLIP_Y_WEBGL, 1);
    context.pixel_storei(gl::UNPACK_PREMULTIPLY_ALPHA_WEBGL, 1);
    context.pixel_storei(gl::UNPACK_COLORSPACE_CONVERSION_WEBGL, gl::NONE as i32);
    // The driver would have flagged any of these as an unknown parameter.
    assert_eq!(context.get_error(), gl::NO_ERROR);

    let unpack = *context.data().unpack_state();
    assert!(unpack.flip_y);
    assert!(unpack.premultiply_alpha);
    assert_eq!(unpack.color_space, ColorSpaceConversion::None);

    assert_eq!(
        context.get_parameter(gl::UNPACK_FLIP_Y_WEBGL),
        WebGLParameter::Bool(true)
    );
    assert_eq!(
        context.get_parameter(gl::UNPACK_PREMULTIPLY_ALPHA_WEBGL),
        WebGLParameter::Bool(true)
    );
    assert_eq!(
        context.get_parameter(gl::UNPACK_COLORSPACE_CONVERSION_WEBGL),
        WebGLParameter::Int(gl::NONE as i32)
    );
    assert_eq!(context.get_error(), gl::NO_ERROR);
}

#[test]
fn unknown_colorspace_conversion() {
    let (_device, mut session, id) = init_context(4, 4);
    let mut context = session.context(id).unwrap();
    context.pixel_storei(gl::UNPACK_COLORSPACE_CONVERSION_WEBGL, 0x1234);
    assert_eq!(context.get_error(), gl::INVALID_ENUM);
    assert_eq!(
        context.data().unpack_state().color_space,
        ColorSpaceConversion::BrowserDefault
    );
}

#[test]
fn unpack_alignment_is_recorded_and_forwarded() {
    let (_device, mut session, id) = init_context(4, 4);
    let mut context = session.context(id).unwrap();

    context.pixel_storei(gl::UNPACK_ALIGNMENT, 1);
    assert_eq!(context.data().unpack_state().alignment, 1);
    assert_eq!(
        context.get_parameter(gl::UNPACK_ALIGNMENT),
        WebGLParameter::Int(1)
    );

    context.pixel_storei(gl::UNPACK_ALIGNMENT, 3);
    assert_eq!(context.get_error(), gl::INVALID_VALUE);
    assert_eq!(context.data().unpack_state().alignment, 1);
    assert_eq!(
        context.get_parameter(gl::UNPACK_ALIGNMENT),
        WebGLParameter::Int(1)
    );
}

#[test]
fn upload_length_follows_alignment() {
    let (_device, mut session, id) = init_context(4, 4);
    let mut context = session.context(id).unwrap();
    let pixels = [255, 0, 0, 0, 255, 0];

    // Two RGB rows of one pixel need 4 + 3 bytes at the default alignment.
    upload(&mut context, 1, 2, gl::RGB, &pixels);
    assert_eq!(context.get_error(), gl::INVALID_OPERATION);

    context.pixel_storei(gl::UNPACK_ALIGNMENT, 1);
    upload(&mut context, 1, 2, gl::RGB, &pixels);
    assert_eq!(context.get_error(), gl::NO_ERROR);
    assert_eq!(
        context.read_pixels(0, 0, 1, 2, gl::RGBA, gl::UNSIGNED_BYTE),
        vec![255, 0, 0, 255, 0, 255, 0, 255]
    );
}

#[test]
fn short_upload_is_rejected() {
    let (_device, mut session, id) = init_context(4, 4);
    let mut context = session.context(id).unwrap();
    upload(&mut context, 2, 2, gl::RGBA, &[0; 8]);
    assert_eq!(context.get_error(), gl::INVALID_OPERATION);
    // Nothing reached the driver, so the texture has no image.
    assert_eq!(
        context.check_framebuffer_status(gl::FRAMEBUFFER),
        gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT
    );
}

#[test]
fn oversized_uploads_are_rejected_before_allocating() {
    let (_device, mut session, id) = init_context(4, 4);
    let mut context = session.context(id).unwrap();
    let texture = context.create_texture().unwrap();
    context.bind_texture(gl::TEXTURE_2D, texture);
    context.tex_image_2d(gl::TEXTURE_2D, 0, gl::RGBA as i32, 2, 2, 0, gl::RGBA, gl::UNSIGNED_BYTE, None);
    assert_eq!(context.get_error(), gl::NO_ERROR);

    context.tex_sub_image_2d(
        gl::TEXTURE_2D,
        0,
        0,
        0,
        i32::MAX,
        i32::MAX,
        gl::RGBA,
        gl::FLOAT,
        &[0u8; 4],
    );
    assert_eq!(context.get_error(), gl::INVALID_VALUE);

    context.tex_image_2d(
        gl::TEXTURE_2D,
        0,
        gl::RGBA as i32,
        i32::MAX,
        i32::MAX,
        0,
        gl::RGBA,
        gl::UNSIGNED_BYTE,
        None,
    );
    assert_eq!(context.get_error(), gl::INVALID_VALUE);

    // One past the driver limit is refused without a source buffer as well.
    context.tex_image_2d(gl::TEXTURE_2D, 0, gl::RGBA as i32, 4097, 1, 0, gl::RGBA, gl::UNSIGNED_BYTE, None);
    assert_eq!(context.get_error(), gl::INVALID_VALUE);
    assert_eq!(context.get_error(), gl::NO_ERROR);
}

#[test]
fn flip_y_upload() {
    let (_device, mut session, id) = init_context(4, 4);
    let mut context = session.context(id).unwrap();
    context.pixel_storei(gl::UNPACK_FLIP_Y_WEBGL, 1);
    upload(&mut context, 1, 2, gl::RGBA, &[255, 0, 0, 255, 0, 255, 0, 255]);
    assert_eq!(context.get_error(), gl::NO_ERROR);
    assert_eq!(
        context.read_pixels(0, 0, 1, 2, gl::RGBA, gl::UNSIGNED_BYTE),
        vec![0, 255, 0, 255, 255, 0, 0, 255]
    );
}

#[test]
fn premultiplied_upload() {
    let (_device, mut session, id) = init_context(4, 4);
    let mut context = session.context(id).unwrap();
    context.pixel_storei(gl::UNPACK_PREMULTIPLY_ALPHA_WEBGL, 1);
    upload(&mut context, 1, 1, gl::RGBA, &[254, 100, 50, 128]);
    assert_eq!(
        context.read_pixels(0, 0, 1, 1, gl::RGBA, gl::UNSIGNED_BYTE),
        vec![127, 50, 25, 128]
    );
}

#[test]
fn other_parameters_go_to_the_driver() {
    let (_device, mut session, id) = init_context(4, 4);
    let mut context = session.context(id).unwrap();
    context.pixel_storei(gl::PACK_ALIGNMENT, 2);
    assert_eq!(context.get_error(), gl::NO_ERROR);
    assert_eq!(context.get_parameter(gl::PACK_ALIGNMENT), WebGLParameter::Int(2));
    context.pixel_storei(0x1234, 1);
    assert_eq!(context.get_error(), gl::INVALID_ENUM);
}

#[test]
fn parameter_queries() {
    let (_device, mut session, id) = init_context(4, 4);
    let mut context = session.context(id).unwrap();

    assert_eq!(context.get_parameter(gl::DITHER), WebGLParameter::Bool(true));
    assert_eq!(context.get_parameter(gl::BLEND), WebGLParameter::Bool(false));
    context.enable(gl::BLEND);
    assert_eq!(context.get_parameter(gl::BLEND), WebGLParameter::Bool(true));
    assert!(context.is_enabled(gl::BLEND));
    context.disable(gl::BLEND);
    assert!(!context.is_enabled(gl::BLEND));

    context.viewport(0, 0, 4, 4);
    assert_eq!(
        context.get_parameter(gl::VIEWPORT),
        WebGLParameter::IntArray(vec![0, 0, 4, 4])
    );
    assert_eq!(
        context.get_parameter(gl::MAX_VIEWPORT_DIMS),
        WebGLParameter::IntArray(vec![4096, 4096])
    );
    assert_eq!(
        context.get_parameter(gl::DEPTH_RANGE),
        WebGLParameter::FloatArray(vec![0., 1.])
    );
    context.clear_color(0., 0.5, 1., 1.);
    assert_eq!(
        context.get_parameter(gl::COLOR_CLEAR_VALUE),
        WebGLParameter::FloatArray(vec![0., 0.5, 1., 1.])
    );
    assert_eq!(
        context.get_parameter(gl::COLOR_WRITEMASK),
        WebGLParameter::BoolArray(vec![true; 4])
    );
    assert_eq!(
        context.get_parameter(gl::MAX_TEXTURE_SIZE),
        WebGLParameter::Int(4096)
    );
    assert!(matches!(context.get_parameter(gl::VENDOR), WebGLParameter::String(_)));
    assert!(
        context
            .supported_extensions()
            .iter()
            .any(|extension| extension == "GL_OES_depth24")
    );
    assert_eq!(context.get_error(), gl::NO_ERROR);
}

#[test]
fn active_texture_range() {
    let (_device, mut session, id) = init_context(4, 4);
    let mut context = session.context(id).unwrap();
    context.active_texture(gl::TEXTURE0 + 31);
    assert_eq!(context.get_error(), gl::NO_ERROR);
    context.active_texture(gl::TEXTURE0 + 32);
    assert_eq!(context.get_error(), gl::INVALID_ENUM);
}
