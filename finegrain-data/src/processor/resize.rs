//! Geometric steps: resizing, cropping and flipping.

use super::Interpolation;
use crate::common::*;
use image::imageops;

/// The target size of [Resize].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeSize {
    /// Warp to exactly this height and width.
    Exact { height: u32, width: u32 },
    /// Scale the shorter side to this length, keeping the aspect ratio.
    ShorterSide(u32),
}

/// Deterministic resize.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resize {
    pub size: ResizeSize,
    pub interpolation: Interpolation,
}

impl Resize {
    pub fn forward<R>(&self, image: RgbImage, rng: &mut R) -> Result<RgbImage>
    where
        R: Rng + ?Sized,
    {
        let (width, height) = image.dimensions();
        let (out_w, out_h) = match self.size {
            ResizeSize::Exact { height, width } => (width, height),
            ResizeSize::ShorterSide(size) => shorter_side_size(width, height, size),
        };
        ensure!(out_w > 0 && out_h > 0, "resize to an empty image");

        if (out_w, out_h) == (width, height) {
            return Ok(image);
        }

        let filter = self.interpolation.filter(rng);
        Ok(imageops::resize(&image, out_w, out_h, filter))
    }
}

impl Display for Resize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.size {
            ResizeSize::Exact { height, width } => write!(
                f,
                "Resize(size=({}, {}), interpolation={})",
                height, width, self.interpolation
            ),
            ResizeSize::ShorterSide(size) => write!(
                f,
                "Resize(size={}, interpolation={})",
                size, self.interpolation
            ),
        }
    }
}

/// Compute the output (width, height) when the shorter side becomes `size`.
pub fn shorter_side_size(width: u32, height: u32, size: u32) -> (u32, u32) {
    if width <= height {
        let out_h = (size as u64 * height as u64 / width.max(1) as u64) as u32;
        (size, out_h)
    } else {
        let out_w = (size as u64 * width as u64 / height.max(1) as u64) as u32;
        (out_w, size)
    }
}

/// Crop the center region, padding with black if the image is smaller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CenterCrop {
    pub size: u32,
}

impl CenterCrop {
    pub fn forward(&self, image: RgbImage) -> Result<RgbImage> {
        let size = self.size;
        ensure!(size > 0, "crop size must be positive");

        let image = {
            let (width, height) = image.dimensions();
            if width < size || height < size {
                let pad_w = size.saturating_sub(width);
                let pad_h = size.saturating_sub(height);
                pad(
                    &image,
                    [pad_w / 2, pad_h / 2, (pad_w + 1) / 2, (pad_h + 1) / 2],
                    Rgb([0, 0, 0]),
                )
            } else {
                image
            }
        };

        let (width, height) = image.dimensions();
        let top = half_round_even(height - size);
        let left = half_round_even(width - size);
        Ok(imageops::crop_imm(&image, left, top, size, size).to_image())
    }
}

impl Display for CenterCrop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CenterCrop(size=({}, {}))", self.size, self.size)
    }
}

/// Crop a random region with random area and aspect ratio, then resize it
/// to a square.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomResizedCrop {
    pub size: u32,
    pub scale: (f64, f64),
    pub ratio: (f64, f64),
    pub interpolation: Interpolation,
}

impl RandomResizedCrop {
    pub const MAX_ATTEMPTS: usize = 10;

    pub fn new(size: u32, interpolation: Interpolation) -> Self {
        Self {
            size,
            scale: (0.08, 1.0),
            ratio: (3.0 / 4.0, 4.0 / 3.0),
            interpolation,
        }
    }

    pub fn forward<R>(&self, image: RgbImage, rng: &mut R) -> Result<RgbImage>
    where
        R: Rng + ?Sized,
    {
        ensure!(self.size > 0, "crop size must be positive");
        let (left, top, crop_w, crop_h) = self.sample_region(image.dimensions(), rng);
        let cropped = imageops::crop_imm(&image, left, top, crop_w, crop_h).to_image();
        let filter = self.interpolation.filter(rng);
        Ok(imageops::resize(&cropped, self.size, self.size, filter))
    }

    /// Draw the crop region as (left, top, width, height).
    pub fn sample_region<R>(&self, (width, height): (u32, u32), rng: &mut R) -> (u32, u32, u32, u32)
    where
        R: Rng + ?Sized,
    {
        let area = width as f64 * height as f64;
        let (min_scale, max_scale) = self.scale;
        let (min_ratio, max_ratio) = self.ratio;
        let log_ratio = (min_ratio.ln(), max_ratio.ln());

        for _ in 0..Self::MAX_ATTEMPTS {
            let target_area = area * rng.gen_range(min_scale..=max_scale);
            let aspect_ratio = rng.gen_range(log_ratio.0..=log_ratio.1).exp();

            let crop_w = (target_area * aspect_ratio).sqrt().round() as u32;
            let crop_h = (target_area / aspect_ratio).sqrt().round() as u32;

            if crop_w > 0 && crop_h > 0 && crop_w <= width && crop_h <= height {
                let top = rng.gen_range(0..=(height - crop_h));
                let left = rng.gen_range(0..=(width - crop_w));
                return (left, top, crop_w, crop_h);
            }
        }

        // fallback to central crop
        let in_ratio = width as f64 / height.max(1) as f64;
        let (crop_w, crop_h) = if in_ratio < min_ratio {
            (width, (width as f64 / min_ratio).round() as u32)
        } else if in_ratio > max_ratio {
            ((height as f64 * max_ratio).round() as u32, height)
        } else {
            (width, height)
        };
        let crop_w = crop_w.clamp(1, width.max(1));
        let crop_h = crop_h.clamp(1, height.max(1));
        let top = height.saturating_sub(crop_h) / 2;
        let left = width.saturating_sub(crop_w) / 2;
        (left, top, crop_w, crop_h)
    }
}

impl Display for RandomResizedCrop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RandomResizedCrop(size=({}, {}), scale=({:.4}, {:.4}), ratio=({:.4}, {:.4}), interpolation={})",
            self.size,
            self.size,
            self.scale.0,
            self.scale.1,
            self.ratio.0,
            self.ratio.1,
            self.interpolation
        )
    }
}

/// Pad every side with black, then crop a random square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RandomCrop {
    pub size: u32,
    pub padding: u32,
}

impl RandomCrop {
    pub fn forward<R>(&self, image: RgbImage, rng: &mut R) -> Result<RgbImage>
    where
        R: Rng + ?Sized,
    {
        let Self { size, padding } = *self;
        let image = if padding > 0 {
            pad(&image, [padding; 4], Rgb([0, 0, 0]))
        } else {
            image
        };

        let (width, height) = image.dimensions();
        ensure!(
            width >= size && height >= size,
            "the padded image size {}x{} is smaller than the crop size {}",
            width,
            height,
            size
        );

        let top = rng.gen_range(0..=(height - size));
        let left = rng.gen_range(0..=(width - size));
        Ok(imageops::crop_imm(&image, left, top, size, size).to_image())
    }
}

impl Display for RandomCrop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RandomCrop(size=({}, {}), padding={})",
            self.size, self.size, self.padding
        )
    }
}

/// Mirror the image left to right with a probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomHorizontalFlip {
    pub prob: f64,
}

impl RandomHorizontalFlip {
    pub fn forward<R>(&self, image: RgbImage, rng: &mut R) -> RgbImage
    where
        R: Rng + ?Sized,
    {
        if rng.gen_bool(self.prob) {
            imageops::flip_horizontal(&image)
        } else {
            image
        }
    }
}

impl Display for RandomHorizontalFlip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RandomHorizontalFlip(p={})", self.prob)
    }
}

/// Pad by [left, top, right, bottom] pixels.
pub fn pad(image: &RgbImage, [left, top, right, bottom]: [u32; 4], fill: Rgb<u8>) -> RgbImage {
    let (width, height) = image.dimensions();
    RgbImage::from_fn(width + left + right, height + top + bottom, |x, y| {
        let inside = (left..(left + width)).contains(&x) && (top..(top + height)).contains(&y);
        if inside {
            *image.get_pixel(x - left, y - top)
        } else {
            fill
        }
    })
}

/// Halve a length, rounding half to even.
fn half_round_even(len: u32) -> u32 {
    let half = len / 2;
    if len % 2 == 1 && half % 2 == 1 {
        half + 1
    } else {
        half
    }
}
