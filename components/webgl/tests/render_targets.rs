/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use webgl::gl::{self, GLuint};
use webgl::parameters::WebGLParameter;
use webgl::software::SoftwareDevice;
use webgl::{SessionOptions, WebGLRenderingContext};

use crate::{attributes, init_context, init_with};

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];

fn filled(color: [u8; 4], pixels: usize) -> Vec<u8> {
    color.repeat(pixels)
}

fn create_color_texture(context: &mut WebGLRenderingContext<'_, SoftwareDevice>, size: i32) -> GLuint {
    let texture = context.create_texture().unwrap();
    context.bind_texture(gl::TEXTURE_2D, texture);
    context.tex_image_2d(
        gl::TEXTURE_2D,
        0,
        gl::RGBA as i32,
        size,
        size,
        0,
        gl::RGBA,
        gl::UNSIGNED_BYTE,
        None,
    );
    texture
}

fn attach_texture(context: &mut WebGLRenderingContext<'_, SoftwareDevice>, texture: GLuint) {
    context.framebuffer_texture_2d(
        gl::FRAMEBUFFER,
        gl::COLOR_ATTACHMENT0,
        gl::TEXTURE_2D,
        texture,
        0,
    );
}

fn clear_to(context: &mut WebGLRenderingContext<'_, SoftwareDevice>, color: [u8; 4]) {
    let [r, g, b, a] = color.map(|channel| channel as f32 / 255.);
    context.clear_color(r, g, b, a);
    context.clear(gl::COLOR_BUFFER_BIT);
}

#[test]
fn default_framebuffer_is_the_surface() {
    let (_device, mut session, id) = init_context(2, 2);
    let mut context = session.context(id).unwrap();
    clear_to(&mut context, RED);
    assert_eq!(
        context.read_pixels(0, 0, 2, 2, gl::RGBA, gl::UNSIGNED_BYTE),
        filled(RED, 4)
    );
    assert_eq!(context.get_error(), gl::NO_ERROR);
}

#[test]
fn attachment_changes_reach_later_operations() {
    let (_device, mut session, id) = init_context(4, 4);
    let mut context = session.context(id).unwrap();

    let a = create_color_texture(&mut context, 4);
    let b = create_color_texture(&mut context, 4);
    let framebuffer = context.create_framebuffer().unwrap();
    context.bind_framebuffer(gl::FRAMEBUFFER, framebuffer);

    attach_texture(&mut context, a);
    clear_to(&mut context, RED);
    attach_texture(&mut context, b);
    clear_to(&mut context, GREEN);

    // Copy A into B.
    attach_texture(&mut context, a);
    context.bind_texture(gl::TEXTURE_2D, b);
    context.copy_tex_sub_image_2d(gl::TEXTURE_2D, 0, 0, 0, 0, 0, 4, 4);

    attach_texture(&mut context, b);
    assert_eq!(
        context.read_pixels(0, 0, 4, 4, gl::RGBA, gl::UNSIGNED_BYTE),
        filled(RED, 16)
    );
    attach_texture(&mut context, a);
    assert_eq!(
        context.read_pixels(0, 0, 4, 4, gl::RGBA, gl::UNSIGNED_BYTE),
        filled(RED, 16)
    );
    assert_eq!(context.get_error(), gl::NO_ERROR);
}

#[test]
fn respecified_texture_is_picked_up() {
    let (_device, mut session, id) = init_context(4, 4);
    let mut context = session.context(id).unwrap();

    let texture = create_color_texture(&mut context, 4);
    let framebuffer = context.create_framebuffer().unwrap();
    context.bind_framebuffer(gl::FRAMEBUFFER, framebuffer);
    attach_texture(&mut context, texture);
    clear_to(&mut context, RED);

    // New storage starts out zeroed.
    context.tex_image_2d(
        gl::TEXTURE_2D,
        0,
        gl::RGBA as i32,
        4,
        4,
        0,
        gl::RGBA,
        gl::UNSIGNED_BYTE,
        None,
    );
    assert_eq!(
        context.read_pixels(0, 0, 4, 4, gl::RGBA, gl::UNSIGNED_BYTE),
        vec![0; 64]
    );
    clear_to(&mut context, GREEN);
    assert_eq!(
        context.read_pixels(0, 0, 4, 4, gl::RGBA, gl::UNSIGNED_BYTE),
        filled(GREEN, 16)
    );
    assert_eq!(context.get_error(), gl::NO_ERROR);
}

#[test]
fn regenerated_mipmaps_are_picked_up() {
    let (_device, mut session, id) = init_context(4, 4);
    let mut context = session.context(id).unwrap();

    let texture = create_color_texture(&mut context, 4);
    let observer = context.create_framebuffer().unwrap();
    context.bind_framebuffer(gl::FRAMEBUFFER, observer);
    attach_texture(&mut context, texture);
    let framebuffer = context.create_framebuffer().unwrap();
    context.bind_framebuffer(gl::FRAMEBUFFER, framebuffer);
    attach_texture(&mut context, texture);
    clear_to(&mut context, RED);

    // Regeneration replaces the base level; the next clear has to reach it.
    context.generate_mipmap(gl::TEXTURE_2D);
    clear_to(&mut context, GREEN);
    assert_eq!(context.get_error(), gl::NO_ERROR);

    context.bind_framebuffer(gl::FRAMEBUFFER, observer);
    assert_eq!(
        context.read_pixels(0, 0, 4, 4, gl::RGBA, gl::UNSIGNED_BYTE),
        filled(GREEN, 16)
    );
}

#[test]
fn respecified_renderbuffer_is_picked_up() {
    let (_device, mut session, id) = init_context(4, 4);
    let mut context = session.context(id).unwrap();

    let renderbuffer = context.create_renderbuffer().unwrap();
    context.bind_renderbuffer(gl::RENDERBUFFER, renderbuffer);
    context.renderbuffer_storage(gl::RENDERBUFFER, gl::RGBA4, 4, 4);
    let framebuffer = context.create_framebuffer().unwrap();
    context.bind_framebuffer(gl::FRAMEBUFFER, framebuffer);
    context.framebuffer_renderbuffer(
        gl::FRAMEBUFFER,
        gl::COLOR_ATTACHMENT0,
        gl::RENDERBUFFER,
        renderbuffer,
    );
    clear_to(&mut context, RED);
    assert_eq!(
        context.read_pixels(0, 0, 4, 4, gl::RGBA, gl::UNSIGNED_BYTE),
        filled(RED, 16)
    );

    context.renderbuffer_storage(gl::RENDERBUFFER, gl::RGBA4, 4, 4);
    assert_eq!(
        context.read_pixels(0, 0, 4, 4, gl::RGBA, gl::UNSIGNED_BYTE),
        vec![0; 64]
    );
    clear_to(&mut context, GREEN);
    assert_eq!(
        context.read_pixels(0, 0, 4, 4, gl::RGBA, gl::UNSIGNED_BYTE),
        filled(GREEN, 16)
    );
    assert_eq!(context.get_error(), gl::NO_ERROR);
}

#[test]
fn draw_buffer_changes_are_picked_up() {
    let (_device, mut session, id) = init_context(4, 4);
    let mut context = session.context(id).unwrap();

    let texture = create_color_texture(&mut context, 4);
    let framebuffer = context.create_framebuffer().unwrap();
    context.bind_framebuffer(gl::FRAMEBUFFER, framebuffer);
    attach_texture(&mut context, texture);
    clear_to(&mut context, RED);

    context.draw_buffers(&[gl::NONE]);
    clear_to(&mut context, GREEN);
    assert_eq!(
        context.read_pixels(0, 0, 4, 4, gl::RGBA, gl::UNSIGNED_BYTE),
        filled(RED, 16)
    );

    context.draw_buffers(&[gl::COLOR_ATTACHMENT0]);
    clear_to(&mut context, GREEN);
    assert_eq!(
        context.read_pixels(0, 0, 4, 4, gl::RGBA, gl::UNSIGNED_BYTE),
        filled(GREEN, 16)
    );
    assert_eq!(context.get_error(), gl::NO_ERROR);
}

#[test]
fn deleted_attachment_leaves_framebuffer_incomplete() {
    let (_device, mut session, id) = init_context(4, 4);
    let mut context = session.context(id).unwrap();

    let texture = create_color_texture(&mut context, 4);
    let framebuffer = context.create_framebuffer().unwrap();
    context.bind_framebuffer(gl::FRAMEBUFFER, framebuffer);
    attach_texture(&mut context, texture);
    assert_eq!(
        context.check_framebuffer_status(gl::FRAMEBUFFER),
        gl::FRAMEBUFFER_COMPLETE
    );

    context.delete_texture(texture);
    assert_eq!(
        context.check_framebuffer_status(gl::FRAMEBUFFER),
        gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT
    );
    context.clear(gl::COLOR_BUFFER_BIT);
    assert_eq!(context.get_error(), gl::INVALID_FRAMEBUFFER_OPERATION);
}

#[test]
fn blit_into_default_framebuffer() {
    let (_device, mut session, id) = init_context(4, 4);
    let mut context = session.context(id).unwrap();

    let texture = create_color_texture(&mut context, 4);
    let framebuffer = context.create_framebuffer().unwrap();
    context.bind_framebuffer(gl::FRAMEBUFFER, framebuffer);
    attach_texture(&mut context, texture);
    clear_to(&mut context, RED);

    context.bind_framebuffer(gl::DRAW_FRAMEBUFFER, 0);
    context.blit_framebuffer(0, 0, 4, 4, 0, 0, 4, 4, gl::COLOR_BUFFER_BIT, gl::NEAREST);
    context.bind_framebuffer(gl::FRAMEBUFFER, 0);
    assert_eq!(
        context.read_pixels(0, 0, 4, 4, gl::RGBA, gl::UNSIGNED_BYTE),
        filled(RED, 16)
    );
    assert_eq!(context.get_error(), gl::NO_ERROR);
}

#[test]
fn draws_go_through_the_current_context() {
    let (device, mut session, id) = init_context(4, 4);
    let native = session.native_context(id).unwrap();
    let mut context = session.context(id).unwrap();
    context.draw_arrays(gl::TRIANGLES, 0, 3);
    context.draw_arrays(gl::POINTS, 0, 1);
    assert_eq!(device.draw_calls(native), 2);
}

#[test]
fn depth_stencil_renderbuffer() {
    let (_device, mut session, id) = init_context(16, 16);
    let mut context = session.context(id).unwrap();

    let renderbuffer = context.create_renderbuffer().unwrap();
    context.bind_renderbuffer(gl::RENDERBUFFER, renderbuffer);
    context.renderbuffer_storage(gl::RENDERBUFFER, gl::DEPTH_STENCIL, 16, 16);
    assert_eq!(context.get_error(), gl::NO_ERROR);
    assert_eq!(
        context.get_renderbuffer_parameter(gl::RENDERBUFFER, gl::RENDERBUFFER_INTERNAL_FORMAT),
        gl::DEPTH24_STENCIL8 as i32
    );
    assert_eq!(
        context.get_renderbuffer_parameter(gl::RENDERBUFFER, gl::RENDERBUFFER_DEPTH_SIZE),
        24
    );
    assert_eq!(
        context.get_renderbuffer_parameter(gl::RENDERBUFFER, gl::RENDERBUFFER_STENCIL_SIZE),
        8
    );

    let color = create_color_texture(&mut context, 16);
    let framebuffer = context.create_framebuffer().unwrap();
    context.bind_framebuffer(gl::FRAMEBUFFER, framebuffer);
    attach_texture(&mut context, color);
    context.framebuffer_renderbuffer(
        gl::FRAMEBUFFER,
        gl::DEPTH_STENCIL_ATTACHMENT,
        gl::RENDERBUFFER,
        renderbuffer,
    );
    assert_eq!(context.get_error(), gl::NO_ERROR);
    assert_eq!(
        context.check_framebuffer_status(gl::FRAMEBUFFER),
        gl::FRAMEBUFFER_COMPLETE
    );
    assert_eq!(
        context.get_framebuffer_attachment_parameter(
            gl::FRAMEBUFFER,
            gl::DEPTH_STENCIL_ATTACHMENT,
            gl::FRAMEBUFFER_ATTACHMENT_OBJECT_NAME,
        ),
        renderbuffer as i32
    );
    assert_eq!(
        context.get_framebuffer_attachment_parameter(
            gl::FRAMEBUFFER,
            gl::STENCIL_ATTACHMENT,
            gl::FRAMEBUFFER_ATTACHMENT_OBJECT_TYPE,
        ),
        gl::RENDERBUFFER as i32
    );
    assert_eq!(context.get_error(), gl::NO_ERROR);

    // Both tests can be switched on and cleared against the packed buffer.
    context.enable(gl::DEPTH_TEST);
    context.enable(gl::STENCIL_TEST);
    assert!(context.is_enabled(gl::DEPTH_TEST));
    assert!(context.is_enabled(gl::STENCIL_TEST));
    context.clear_depth(0.5);
    context.clear_stencil(3);
    assert_eq!(
        context.get_parameter(gl::DEPTH_CLEAR_VALUE),
        WebGLParameter::Float(0.5)
    );
    assert_eq!(
        context.get_parameter(gl::STENCIL_CLEAR_VALUE),
        WebGLParameter::Int(3)
    );
    context.clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT | gl::STENCIL_BUFFER_BIT);
    context.draw_arrays(gl::TRIANGLES, 0, 3);
    assert_eq!(context.get_error(), gl::NO_ERROR);
}

#[test]
fn mismatched_depth_and_stencil_attachments() {
    let (_device, mut session, id) = init_context(8, 8);
    let mut context = session.context(id).unwrap();

    let depth = context.create_renderbuffer().unwrap();
    let stencil = context.create_renderbuffer().unwrap();
    let framebuffer = context.create_framebuffer().unwrap();
    context.bind_framebuffer(gl::FRAMEBUFFER, framebuffer);
    context.framebuffer_renderbuffer(gl::FRAMEBUFFER, gl::DEPTH_ATTACHMENT, gl::RENDERBUFFER, depth);
    context.framebuffer_renderbuffer(
        gl::FRAMEBUFFER,
        gl::STENCIL_ATTACHMENT,
        gl::RENDERBUFFER,
        stencil,
    );
    assert_eq!(context.get_error(), gl::NO_ERROR);

    assert_eq!(
        context.get_framebuffer_attachment_parameter(
            gl::FRAMEBUFFER,
            gl::DEPTH_STENCIL_ATTACHMENT,
            gl::FRAMEBUFFER_ATTACHMENT_OBJECT_NAME,
        ),
        0
    );
    assert_eq!(context.get_error(), gl::INVALID_OPERATION);
}

#[test]
fn deep_depth_request_uses_preferred_format() {
    let (_device, mut session, id) = init_context(8, 8);
    assert_eq!(
        session.context_data(id).unwrap().preferred_depth_format(),
        gl::DEPTH_COMPONENT24_OES
    );
    let mut context = session.context(id).unwrap();
    let renderbuffer = context.create_renderbuffer().unwrap();
    context.bind_renderbuffer(gl::RENDERBUFFER, renderbuffer);
    context.renderbuffer_storage(gl::RENDERBUFFER, gl::DEPTH_COMPONENT32_OES, 8, 8);
    assert_eq!(context.get_error(), gl::NO_ERROR);
    assert_eq!(
        context.get_renderbuffer_parameter(gl::RENDERBUFFER, gl::RENDERBUFFER_INTERNAL_FORMAT),
        gl::DEPTH_COMPONENT24_OES as i32
    );
}

#[test]
fn deep_depth_request_without_depth24() {
    let device = SoftwareDevice::with_extensions(
        "GL_OES_packed_depth_stencil GL_ANGLE_instanced_arrays",
    );
    let (_device, mut session) = init_with(device, SessionOptions::default());
    let id = session.create_context(attributes(8, 8)).unwrap();
    let mut context = session.context(id).unwrap();
    let renderbuffer = context.create_renderbuffer().unwrap();
    context.bind_renderbuffer(gl::RENDERBUFFER, renderbuffer);
    context.renderbuffer_storage(gl::RENDERBUFFER, gl::DEPTH_COMPONENT32_OES, 8, 8);
    assert_eq!(context.get_error(), gl::NO_ERROR);
    assert_eq!(
        context.get_renderbuffer_parameter(gl::RENDERBUFFER, gl::RENDERBUFFER_DEPTH_SIZE),
        16
    );
}
