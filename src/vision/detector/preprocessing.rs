// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for YOLO detection models

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use ndarray::Array4;

/// Model stride; input sizes are rounded up to a multiple of this
pub const STRIDE: u32 = 32;

/// Gray value used for letterbox padding
pub const PAD_VALUE: u8 = 114;

/// Round an input size up to the next multiple of [`STRIDE`]
pub fn align_to_stride(size: u32) -> u32 {
    size.div_ceil(STRIDE).max(1) * STRIDE
}

/// Geometry of a letterbox transform, kept so boxes can be mapped back
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Resize factor applied to the original image
    pub scale: f32,
    /// Left padding in model input pixels
    pub pad_x: u32,
    /// Top padding in model input pixels
    pub pad_y: u32,
    pub orig_width: u32,
    pub orig_height: u32,
    /// Side of the square model input
    pub target_size: u32,
}

impl Letterbox {
    /// Compute the transform that fits `orig_width` x `orig_height` into a
    /// `target_size` square while preserving aspect ratio.
    pub fn new(orig_width: u32, orig_height: u32, target_size: u32) -> Self {
        if orig_width == 0 || orig_height == 0 {
            return Self {
                scale: 1.0,
                pad_x: 0,
                pad_y: 0,
                orig_width,
                orig_height,
                target_size,
            };
        }

        let scale = (target_size as f32 / orig_width as f32)
            .min(target_size as f32 / orig_height as f32);

        let (new_w, new_h) = Self::scaled_dims(orig_width, orig_height, scale, target_size);

        Self {
            scale,
            pad_x: (target_size - new_w) / 2,
            pad_y: (target_size - new_h) / 2,
            orig_width,
            orig_height,
            target_size,
        }
    }

    fn scaled_dims(orig_width: u32, orig_height: u32, scale: f32, target_size: u32) -> (u32, u32) {
        let new_w = ((orig_width as f32 * scale).round() as u32).clamp(1, target_size);
        let new_h = ((orig_height as f32 * scale).round() as u32).clamp(1, target_size);
        (new_w, new_h)
    }

    /// Size of the resized (unpadded) image inside the model input
    pub fn resized_dims(&self) -> (u32, u32) {
        Self::scaled_dims(self.orig_width, self.orig_height, self.scale, self.target_size)
    }

    /// Map an `[x1, y1, x2, y2]` box from model input space back to the
    /// original image, clipped to its bounds.
    pub fn to_original(&self, xyxy: [f32; 4]) -> [f32; 4] {
        let max_x = self.orig_width as f32;
        let max_y = self.orig_height as f32;
        let unmap_x = |v: f32| ((v - self.pad_x as f32) / self.scale).clamp(0.0, max_x);
        let unmap_y = |v: f32| ((v - self.pad_y as f32) / self.scale).clamp(0.0, max_y);

        let (x1, x2) = (unmap_x(xyxy[0]), unmap_x(xyxy[2]));
        let (y1, y2) = (unmap_y(xyxy[1]), unmap_y(xyxy[3]));

        [x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2)]
    }
}

/// Resize with aspect ratio preservation and center the result on a
/// `target_size` square filled with [`PAD_VALUE`].
pub fn letterbox(image: &RgbImage, target_size: u32) -> (RgbImage, Letterbox) {
    let geometry = Letterbox::new(image.width(), image.height(), target_size);
    let mut canvas = RgbImage::from_pixel(target_size, target_size, Rgb([PAD_VALUE; 3]));

    if image.width() == 0 || image.height() == 0 {
        return (canvas, geometry);
    }

    let (new_w, new_h) = geometry.resized_dims();
    let resized = imageops::resize(image, new_w, new_h, FilterType::Triangle);
    imageops::overlay(
        &mut canvas,
        &resized,
        geometry.pad_x as i64,
        geometry.pad_y as i64,
    );

    (canvas, geometry)
}

/// Convert an RGB image to an NCHW `[1, 3, H, W]` tensor scaled to [0, 1]
pub fn to_nchw_tensor(image: &RgbImage) -> Array4<f32> {
    let (width, height) = image.dimensions();
    let mut tensor = Array4::zeros((1, 3, height as usize, width as usize));

    for (x, y, pixel) in image.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    tensor
}

/// Letterbox an image to the stride-aligned `image_size` and build the
/// model input tensor.
pub fn preprocess_for_detection(image: &RgbImage, image_size: u32) -> (Array4<f32>, Letterbox) {
    let target = align_to_stride(image_size);
    let (boxed, geometry) = letterbox(image, target);
    (to_nchw_tensor(&boxed), geometry)
}
