/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Upload-time pixel transforms that WebGL requires but OpenGL ES does not
//! perform: row flipping, alpha premultiplication and unpack-alignment aware
//! sizing.

use std::borrow::Cow;
use std::cmp;

use bitflags::bitflags;
use byteorder::{ByteOrder, NativeEndian};
use serde::{Deserialize, Serialize};

pub mod gl {
    pub const ALPHA: u32 = 0x1906;
    pub const RGB: u32 = 0x1907;
    pub const RGBA: u32 = 0x1908;
    pub const LUMINANCE: u32 = 0x1909;
    pub const LUMINANCE_ALPHA: u32 = 0x190A;

    pub const UNSIGNED_BYTE: u32 = 0x1401;
    pub const FLOAT: u32 = 0x1406;
    pub const UNSIGNED_SHORT_4_4_4_4: u32 = 0x8033;
    pub const UNSIGNED_SHORT_5_5_5_1: u32 = 0x8034;
    pub const UNSIGNED_SHORT_5_6_5: u32 = 0x8363;
    pub const HALF_FLOAT_OES: u32 = 0x8D61;
}

/// The default value of `UNPACK_ALIGNMENT`.
pub const DEFAULT_UNPACK_ALIGNMENT: u32 = 4;

macro_rules! gl_enums {
    ($(pub enum $name:ident { $($variant:ident = $mod:ident::$constant:ident,)+ })*) => {
        $(
            #[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
            #[repr(u32)]
            pub enum $name { $($variant = $mod::$constant,)+ }

            impl $name {
                pub fn from_gl_constant(constant: u32) -> Option<Self> {
                    Some(match constant {
                        $($mod::$constant => $name::$variant, )+
                        _ => return None,
                    })
                }

                #[inline]
                pub fn as_gl_constant(&self) -> u32 {
                    *self as u32
                }
            }
        )*
    }
}

gl_enums! {
    pub enum TexFormat {
        Alpha = gl::ALPHA,
        RGB = gl::RGB,
        RGBA = gl::RGBA,
        Luminance = gl::LUMINANCE,
        LuminanceAlpha = gl::LUMINANCE_ALPHA,
    }

    pub enum TexDataType {
        UnsignedByte = gl::UNSIGNED_BYTE,
        UnsignedShort4444 = gl::UNSIGNED_SHORT_4_4_4_4,
        UnsignedShort5551 = gl::UNSIGNED_SHORT_5_5_5_1,
        UnsignedShort565 = gl::UNSIGNED_SHORT_5_6_5,
        Float = gl::FLOAT,
        HalfFloat = gl::HALF_FLOAT_OES,
    }
}

impl TexFormat {
    /// Returns how many components does this format need. For example, RGBA
    /// needs 4 components, while RGB requires 3.
    pub fn components(&self) -> usize {
        match *self {
            TexFormat::Alpha | TexFormat::Luminance => 1,
            TexFormat::LuminanceAlpha => 2,
            TexFormat::RGB => 3,
            TexFormat::RGBA => 4,
        }
    }
}

impl TexDataType {
    /// Whether a single 16-bit element holds every channel of a pixel.
    pub fn is_packed(&self) -> bool {
        matches!(
            *self,
            TexDataType::UnsignedShort4444 |
                TexDataType::UnsignedShort5551 |
                TexDataType::UnsignedShort565
        )
    }

    /// Returns the size in bytes of one channel, for non-packed types.
    pub fn channel_size(&self) -> usize {
        match *self {
            TexDataType::UnsignedByte => 1,
            TexDataType::HalfFloat => 2,
            TexDataType::Float => 4,
            TexDataType::UnsignedShort4444 |
            TexDataType::UnsignedShort5551 |
            TexDataType::UnsignedShort565 => 2,
        }
    }
}

bitflags! {
    /// The WebGL-only unpack parameters that change the bytes handed to the driver.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct UnpackFlags: u8 {
        const FLIP_Y_AXIS = 0x01;
        const PREMULTIPLY_ALPHA = 0x02;
    }
}

/// Bytes needed for one pixel of the given format and type.
pub fn pixel_size(format: TexFormat, data_type: TexDataType) -> usize {
    if data_type.is_packed() {
        return 2;
    }
    format.components() * data_type.channel_size()
}

/// Length of one image row once padded to `alignment`, or `None` if it does
/// not fit in memory.
pub fn row_stride(pixel_size: usize, width: usize, alignment: usize) -> Option<usize> {
    debug_assert!(alignment > 0);
    let unpadded = pixel_size.checked_mul(width)?;
    let remainder = unpadded % alignment;
    if remainder == 0 {
        Some(unpadded)
    } else {
        unpadded.checked_add(alignment - remainder)
    }
}

/// The memory layout of an image as the driver will read it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UnpackLayout {
    pub pixel_size: usize,
    pub width: usize,
    pub height: usize,
    pub stride: usize,
}

impl UnpackLayout {
    /// Returns `None` when the padded image would not be addressable.
    pub fn new(
        format: TexFormat,
        data_type: TexDataType,
        width: usize,
        height: usize,
        alignment: u32,
    ) -> Option<UnpackLayout> {
        let pixel_size = pixel_size(format, data_type);
        let stride = row_stride(pixel_size, width, cmp::max(alignment, 1) as usize)?;
        stride.checked_mul(height)?;
        Some(UnpackLayout {
            pixel_size,
            width,
            height,
            stride,
        })
    }

    /// Size of the buffer uploads are performed with.
    pub fn image_size(&self) -> usize {
        self.stride * self.height
    }

    /// The shortest source buffer that still covers every pixel. The last row
    /// does not need to carry its alignment padding.
    pub fn minimum_source_len(&self) -> usize {
        if self.height == 0 {
            return 0;
        }
        self.stride * (self.height - 1) + self.width * self.pixel_size
    }
}

/// Whether a source buffer of `len` bytes holds enough data for `layout`.
pub fn validate_unpack_length(layout: &UnpackLayout, len: usize) -> bool {
    len >= layout.minimum_source_len()
}

/// Result of unpacking: the bytes to upload and the stride they were laid out with.
#[derive(Debug)]
pub struct UnpackedPixels<'a> {
    pub data: Cow<'a, [u8]>,
    pub stride: usize,
}

/// A zero-filled image, used when an upload does not supply any data.
pub fn zeroed_image(layout: &UnpackLayout) -> Vec<u8> {
    vec![0; layout.image_size()]
}

/// Produces the bytes to hand to the driver for an upload. Returns the input
/// untouched when no transform is requested and it already has the exact
/// upload size. Flipping always allocates; premultiplication runs on the
/// flipped copy.
pub fn unpack_pixels<'a>(
    pixels: &'a [u8],
    format: TexFormat,
    data_type: TexDataType,
    layout: &UnpackLayout,
    flags: UnpackFlags,
) -> UnpackedPixels<'a> {
    let image_size = layout.image_size();

    let mut data: Cow<[u8]> = if flags.contains(UnpackFlags::FLIP_Y_AXIS) {
        flip_pixels_y(pixels, layout.stride, layout.height).into()
    } else if pixels.len() == image_size {
        Cow::Borrowed(pixels)
    } else {
        let mut padded = vec![0; image_size];
        let len = cmp::min(image_size, pixels.len());
        padded[..len].copy_from_slice(&pixels[..len]);
        padded.into()
    };

    if flags.contains(UnpackFlags::PREMULTIPLY_ALPHA) && has_premultipliable_alpha(format) {
        premultiply_inplace(format, data_type, layout, data.to_mut());
    }

    UnpackedPixels {
        data,
        stride: layout.stride,
    }
}

fn has_premultipliable_alpha(format: TexFormat) -> bool {
    matches!(format, TexFormat::RGBA | TexFormat::LuminanceAlpha)
}

/// Flips the image on the Y axis, a whole stride at a time. A source that
/// stops short of the final row padding is tolerated; missing bytes are zero.
pub fn flip_pixels_y(pixels: &[u8], stride: usize, height: usize) -> Vec<u8> {
    let mut flipped = vec![0u8; stride * height];
    if stride == 0 {
        return flipped;
    }

    for (y, row) in flipped.chunks_exact_mut(stride).enumerate() {
        let start = (height - 1 - y) * stride;
        if start >= pixels.len() {
            continue;
        }
        let end = cmp::min(start + stride, pixels.len());
        row[..end - start].copy_from_slice(&pixels[start..end]);
    }

    flipped
}

/// Scales the color channels of every pixel by its alpha. Scaling truncates.
pub fn premultiply_inplace(
    format: TexFormat,
    data_type: TexDataType,
    layout: &UnpackLayout,
    pixels: &mut [u8],
) {
    if layout.stride == 0 {
        return;
    }
    let row_len = layout.width * layout.pixel_size;

    for row in pixels.chunks_mut(layout.stride).take(layout.height) {
        let len = cmp::min(row_len, row.len());
        let row = &mut row[..len];
        match (format, data_type) {
            (TexFormat::RGBA, TexDataType::UnsignedByte) => {
                for rgba in row.chunks_exact_mut(4) {
                    let scale = rgba[3] as f32 / 255.0;
                    rgba[0] = (rgba[0] as f32 * scale) as u8;
                    rgba[1] = (rgba[1] as f32 * scale) as u8;
                    rgba[2] = (rgba[2] as f32 * scale) as u8;
                }
            },
            (TexFormat::LuminanceAlpha, TexDataType::UnsignedByte) => {
                for la in row.chunks_exact_mut(2) {
                    la[0] = (la[0] as f64 * (la[1] as f64 / 255.0)) as u8;
                }
            },
            (TexFormat::RGBA, TexDataType::UnsignedShort4444) => {
                // Byte 0 holds G:R and byte 1 holds A:B, high nibble first.
                for rgba in row.chunks_exact_mut(2) {
                    let (r, g) = (rgba[0] & 0x0f, rgba[0] >> 4);
                    let (b, a) = (rgba[1] & 0x0f, rgba[1] >> 4);
                    let scale = a as f32 / 15.0;
                    let scaled = |c: u8| (c as f32 * scale) as u8;
                    rgba[0] = (scaled(g) << 4) | scaled(r);
                    rgba[1] = (a << 4) | scaled(b);
                }
            },
            (TexFormat::RGBA, TexDataType::UnsignedShort5551) => {
                // A cleared alpha bit forces the pixel to the 0x0001 sentinel
                // rather than to transparent black.
                for rgba in row.chunks_exact_mut(2) {
                    if NativeEndian::read_u16(rgba) & 1 == 0 {
                        NativeEndian::write_u16(rgba, 0x0001);
                    }
                }
            },
            // Other formats don't have alpha, so return their data untouched.
            _ => {},
        }
    }
}
