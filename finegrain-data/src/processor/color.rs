//! Pixel-level color operations shared by augmentation steps.

use crate::common::*;
use imageproc::geometric_transformations::{
    rotate_about_center, warp, Interpolation as WarpInterpolation, Projection,
};

/// The ITU-R 601-2 luma of a pixel.
pub fn luma(pixel: &Rgb<u8>) -> f32 {
    let [r, g, b] = pixel.0;
    r as f32 * 0.299 + g as f32 * 0.587 + b as f32 * 0.114
}

/// Interpolate between a degenerate image and the image.
///
/// `factor` 0 yields the degenerate image, 1 the original, and greater
/// values extrapolate.
pub fn blend(image: &RgbImage, degenerate: &RgbImage, factor: f32) -> RgbImage {
    debug_assert_eq!(image.dimensions(), degenerate.dimensions());
    let mut output = image.clone();
    output
        .pixels_mut()
        .zip(degenerate.pixels())
        .for_each(|(pixel, degen)| {
            pixel.0.iter_mut().zip(degen.0).for_each(|(value, degen)| {
                let degen = degen as f32;
                *value = clamp_u8(degen + factor * (*value as f32 - degen));
            });
        });
    output
}

/// Adjust brightness by blending with black.
pub fn adjust_brightness(image: &RgbImage, factor: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    let black = RgbImage::new(width, height);
    blend(image, &black, factor)
}

/// Adjust contrast by blending with the mean gray level.
pub fn adjust_contrast(image: &RgbImage, factor: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    let num_pixels = (width as f64 * height as f64).max(1.0);
    let mean = image.pixels().map(|pixel| luma(pixel) as f64).sum::<f64>() / num_pixels;
    let mean = (mean + 0.5) as u8;
    let gray = RgbImage::from_pixel(width, height, Rgb([mean, mean, mean]));
    blend(image, &gray, factor)
}

/// Adjust saturation by blending with the grayscale image.
pub fn adjust_saturation(image: &RgbImage, factor: f32) -> RgbImage {
    blend(image, &grayscale(image), factor)
}

/// Adjust sharpness by blending with a smoothed image.
pub fn adjust_sharpness(image: &RgbImage, factor: f32) -> RgbImage {
    blend(image, &smooth(image), factor)
}

/// Convert to grayscale while keeping three channels.
pub fn grayscale(image: &RgbImage) -> RgbImage {
    let mut output = image.clone();
    output.pixels_mut().for_each(|pixel| {
        let gray = clamp_u8(luma(pixel));
        *pixel = Rgb([gray, gray, gray]);
    });
    output
}

/// Apply the 3x3 smoothing kernel, keeping border pixels.
pub fn smooth(image: &RgbImage) -> RgbImage {
    const KERNEL: [[f32; 3]; 3] = [[1.0, 1.0, 1.0], [1.0, 5.0, 1.0], [1.0, 1.0, 1.0]];
    const KERNEL_SUM: f32 = 13.0;

    let (width, height) = image.dimensions();
    let mut output = image.clone();
    if width < 3 || height < 3 {
        return output;
    }

    for y in 1..(height - 1) {
        for x in 1..(width - 1) {
            let mut acc = [0f32; 3];
            for (dy, row) in KERNEL.iter().enumerate() {
                for (dx, weight) in row.iter().enumerate() {
                    let pixel = image.get_pixel(x + dx as u32 - 1, y + dy as u32 - 1);
                    acc.iter_mut()
                        .zip(pixel.0)
                        .for_each(|(acc, value)| *acc += weight * value as f32);
                }
            }
            let [r, g, b] = acc;
            output.put_pixel(
                x,
                y,
                Rgb([
                    clamp_u8(r / KERNEL_SUM),
                    clamp_u8(g / KERNEL_SUM),
                    clamp_u8(b / KERNEL_SUM),
                ]),
            );
        }
    }

    output
}

/// Stretch each channel to the full range.
pub fn autocontrast(image: &RgbImage) -> RgbImage {
    let mut output = image.clone();
    for channel in 0..3 {
        let (lo, hi) = image
            .pixels()
            .map(|pixel| pixel.0[channel])
            .minmax()
            .into_option()
            .unwrap_or((0, 255));
        if hi <= lo {
            continue;
        }
        let scale = 255.0 / (hi - lo) as f32;
        let offset = -(lo as f32) * scale;
        output.pixels_mut().for_each(|pixel| {
            let value = &mut pixel.0[channel];
            *value = clamp_u8(*value as f32 * scale + offset);
        });
    }
    output
}

/// Equalize the histogram of each channel.
pub fn equalize(image: &RgbImage) -> RgbImage {
    let mut output = image.clone();
    for channel in 0..3 {
        let mut histogram = [0usize; 256];
        image
            .pixels()
            .for_each(|pixel| histogram[pixel.0[channel] as usize] += 1);

        let last_nonzero = histogram.iter().rev().find(|&&count| count > 0).copied();
        let total: usize = histogram.iter().sum();
        let step = match last_nonzero {
            Some(last) => (total - last) / 255,
            None => 0,
        };
        if step == 0 {
            continue;
        }

        let mut lut = [0u8; 256];
        let mut acc = step / 2;
        for (entry, count) in lut.iter_mut().zip(histogram) {
            *entry = cmp::min(acc / step, 255) as u8;
            acc += count;
        }

        output
            .pixels_mut()
            .for_each(|pixel| pixel.0[channel] = lut[pixel.0[channel] as usize]);
    }
    output
}

pub fn invert(image: &RgbImage) -> RgbImage {
    map_values(image, |value| 255 - value)
}

/// Keep the `bits` most significant bits of every value.
pub fn posterize(image: &RgbImage, bits: u8) -> RgbImage {
    if bits >= 8 {
        return image.clone();
    }
    let mask = !(((1u16 << (8 - bits)) - 1) as u8);
    map_values(image, |value| value & mask)
}

/// Invert every value at or above the threshold.
pub fn solarize(image: &RgbImage, threshold: u16) -> RgbImage {
    map_values(image, |value| {
        if value as u16 >= threshold {
            255 - value
        } else {
            value
        }
    })
}

/// Add to every value below 128, saturating at 255.
pub fn solarize_add(image: &RgbImage, addition: u8) -> RgbImage {
    map_values(image, |value| {
        if value < 128 {
            value.saturating_add(addition)
        } else {
            value
        }
    })
}

/// Resample with the inverse affine map
/// `(x, y) -> (a x + b y + c, d x + e y + f)`, filling uncovered pixels.
///
/// A singular map leaves the image unchanged.
pub fn affine(
    image: &RgbImage,
    [a, b, c, d, e, f]: [f64; 6],
    interpolation: WarpInterpolation,
    fill: Rgb<u8>,
) -> RgbImage {
    let inverse = Projection::from_matrix([
        a as f32, b as f32, c as f32, d as f32, e as f32, f as f32, 0.0, 0.0, 1.0,
    ]);
    match inverse {
        Some(inverse) => warp(image, &inverse.invert(), interpolation, fill),
        None => image.clone(),
    }
}

/// Rotate counter-clockwise by `degrees` around the image center.
pub fn rotate(
    image: &RgbImage,
    degrees: f64,
    interpolation: WarpInterpolation,
    fill: Rgb<u8>,
) -> RgbImage {
    // positive angles turn clockwise in image coordinates
    rotate_about_center(image, -degrees.to_radians() as f32, interpolation, fill)
}

fn map_values<F>(image: &RgbImage, f: F) -> RgbImage
where
    F: Fn(u8) -> u8,
{
    let mut output = image.clone();
    output
        .pixels_mut()
        .for_each(|pixel| pixel.0.iter_mut().for_each(|value| *value = f(*value)));
    output
}

pub fn clamp_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_factors() {
        let image = RgbImage::from_pixel(2, 2, Rgb([100, 200, 50]));
        assert_eq!(adjust_brightness(&image, 0.0).get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(adjust_brightness(&image, 1.0), image);
        assert_eq!(
            adjust_brightness(&image, 2.0).get_pixel(1, 1),
            &Rgb([200, 255, 100])
        );
    }

    #[test]
    fn autocontrast_stretches_range() {
        let image = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgb([50, 10, 7])
            } else {
                Rgb([150, 20, 7])
            }
        });
        let output = autocontrast(&image);
        assert_eq!(output.get_pixel(0, 0), &Rgb([0, 0, 7]));
        assert_eq!(output.get_pixel(1, 0), &Rgb([255, 255, 7]));
    }

    #[test]
    fn posterize_and_solarize() {
        let image = RgbImage::from_pixel(1, 1, Rgb([0b1011_0111, 100, 200]));
        assert_eq!(posterize(&image, 2).get_pixel(0, 0), &Rgb([0b1000_0000, 64, 192]));
        assert_eq!(solarize(&image, 128).get_pixel(0, 0), &Rgb([72, 100, 55]));
        assert_eq!(solarize_add(&image, 30).get_pixel(0, 0), &Rgb([183, 130, 200]));
    }

    #[test]
    fn zero_rotation_is_identity() {
        let image = RgbImage::from_fn(5, 4, |x, y| Rgb([x as u8, y as u8, 9]));
        assert_eq!(
            rotate(&image, 0.0, WarpInterpolation::Nearest, Rgb([0, 0, 0])),
            image
        );
    }

    #[test]
    fn translate_fills_uncovered_pixels() {
        let image = RgbImage::from_fn(6, 4, |x, y| Rgb([x as u8 * 10, y as u8 * 10, 9]));
        let fill = Rgb([1, 2, 3]);
        // sample from two pixels to the right
        let output = affine(
            &image,
            [1.0, 0.0, 2.0, 0.0, 1.0, 0.0],
            WarpInterpolation::Nearest,
            fill,
        );
        assert_eq!(output.dimensions(), (6, 4));
        assert_eq!(output.get_pixel(0, 1), &Rgb([20, 10, 9]));
        assert_eq!(output.get_pixel(5, 1), &fill);
    }

    #[test]
    fn smooth_interpolation_blends_shifted_pixels() {
        let image = RgbImage::from_fn(8, 8, |x, _| Rgb([if x < 4 { 0 } else { 200 }, 0, 0]));
        let shifted = |interpolation| {
            affine(
                &image,
                [1.0, 0.0, 0.5, 0.0, 1.0, 0.0],
                interpolation,
                Rgb([0, 0, 0]),
            )
        };
        let nearest = shifted(WarpInterpolation::Nearest);
        let bilinear = shifted(WarpInterpolation::Bilinear);
        let value = bilinear.get_pixel(3, 4).0[0];
        assert!(value > 0 && value < 200, "got {}", value);
        assert!([0, 200].contains(&nearest.get_pixel(3, 4).0[0]));
    }

    #[test]
    fn equalize_keeps_dimensions() {
        let image = RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 4) as u8, (y * 2) as u8, 3]));
        let output = equalize(&image);
        assert_eq!(output.dimensions(), (16, 16));
        assert_eq!(output.get_pixel(0, 0).0[2], 3);
    }
}
