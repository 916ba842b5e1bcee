use crate::frame::Frame;
use crate::image_classifier::interface::ClassifyError;
use image::{imageops, DynamicImage, RgbImage};
use tract_onnx::prelude::*;

/// Fits the image inside `width`x`height`, centred on black padding when the aspect
/// ratios differ.
pub fn resize_image(image: &DynamicImage, width: u32, height: u32) -> RgbImage {
    let (w, h) = (image.width() as f32, image.height() as f32);
    if (w / h - width as f32 / height as f32).abs() < f32::EPSILON {
        return image
            .resize_exact(width, height, imageops::FilterType::Triangle)
            .to_rgb8();
    }

    let scale = (width as f32 / w).min(height as f32 / h);
    let new_w = ((w * scale) as u32).clamp(1, width);
    let new_h = ((h * scale) as u32).clamp(1, height);

    let scaled = image
        .resize_exact(new_w, new_h, imageops::FilterType::Triangle)
        .to_rgb8();

    let mut padded = RgbImage::new(width, height);
    imageops::overlay(
        &mut padded,
        &scaled,
        ((width - new_w) / 2) as i64,
        ((height - new_h) / 2) as i64,
    );
    padded
}

/// NCHW float tensor with channels scaled to [0, 1].
pub fn image_to_tensor(rgb: &RgbImage) -> Tensor {
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);
    tract_ndarray::Array4::from_shape_fn((1, 3, height, width), |(_, c, y, x)| {
        rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
    })
    .into_tensor()
}

pub fn frame_to_tensor(frame: &Frame, width: u32, height: u32) -> Result<Tensor, ClassifyError> {
    let image = frame.to_image()?;
    Ok(image_to_tensor(&resize_image(&image, width, height)))
}
