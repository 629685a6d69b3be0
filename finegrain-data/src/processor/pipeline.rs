use super::*;
use crate::common::*;

/// A step that operates on decoded images.
#[derive(Debug, Clone)]
pub enum ImageStep {
    Resize(Resize),
    CenterCrop(CenterCrop),
    RandomResizedCrop(RandomResizedCrop),
    RandomCrop(RandomCrop),
    RandomHorizontalFlip(RandomHorizontalFlip),
    ColorJitter(ColorJitter),
    RandAugment(RandAugment),
}

impl ImageStep {
    pub fn forward<R>(&self, image: RgbImage, rng: &mut R) -> Result<RgbImage>
    where
        R: Rng + ?Sized,
    {
        let output = match self {
            Self::Resize(step) => step.forward(image, rng)?,
            Self::CenterCrop(step) => step.forward(image)?,
            Self::RandomResizedCrop(step) => step.forward(image, rng)?,
            Self::RandomCrop(step) => step.forward(image, rng)?,
            Self::RandomHorizontalFlip(step) => step.forward(image, rng),
            Self::ColorJitter(step) => step.forward(image, rng),
            Self::RandAugment(step) => step.forward(image, rng),
        };
        Ok(output)
    }
}

impl Display for ImageStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resize(step) => Display::fmt(step, f),
            Self::CenterCrop(step) => Display::fmt(step, f),
            Self::RandomResizedCrop(step) => Display::fmt(step, f),
            Self::RandomCrop(step) => Display::fmt(step, f),
            Self::RandomHorizontalFlip(step) => Display::fmt(step, f),
            Self::ColorJitter(step) => Display::fmt(step, f),
            Self::RandAugment(step) => Display::fmt(step, f),
        }
    }
}

/// A step that operates on channel-first tensors.
#[derive(Debug, Clone)]
pub enum TensorStep {
    Normalize(Normalize),
    RandomErasing(RandomErasing),
}

impl TensorStep {
    pub fn forward<R>(&self, tensor: Array3<f32>, rng: &mut R) -> Array3<f32>
    where
        R: Rng + ?Sized,
    {
        match self {
            Self::Normalize(step) => step.forward(tensor),
            Self::RandomErasing(step) => step.forward(tensor, rng),
        }
    }
}

impl Display for TensorStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normalize(step) => Display::fmt(step, f),
            Self::RandomErasing(step) => Display::fmt(step, f),
        }
    }
}

/// An ordered preprocessing pipeline.
///
/// Image steps run first, then the image is converted to a `[3, H, W]`
/// tensor in `[0, 1]`, and finally the tensor steps run. The pipeline holds
/// no mutable state, so it can be shared across threads.
#[derive(Debug, Clone)]
pub struct TransformPipeline {
    image_steps: Vec<ImageStep>,
    tensor_steps: Vec<TensorStep>,
}

impl TransformPipeline {
    pub fn new(image_steps: Vec<ImageStep>, tensor_steps: Vec<TensorStep>) -> Self {
        Self {
            image_steps,
            tensor_steps,
        }
    }

    pub fn image_steps(&self) -> &[ImageStep] {
        &self.image_steps
    }

    pub fn tensor_steps(&self) -> &[TensorStep] {
        &self.tensor_steps
    }

    /// Transform an image with a freshly seeded random generator.
    pub fn forward(&self, image: RgbImage) -> Result<Array3<f32>> {
        let mut rng = StdRng::from_entropy();
        self.forward_with_rng(image, &mut rng)
    }

    pub fn forward_with_rng<R>(&self, image: RgbImage, rng: &mut R) -> Result<Array3<f32>>
    where
        R: Rng + ?Sized,
    {
        let image = self
            .image_steps
            .iter()
            .try_fold(image, |image, step| step.forward(image, rng))?;
        let tensor = to_tensor(&image);
        let tensor = self
            .tensor_steps
            .iter()
            .fold(tensor, |tensor, step| step.forward(tensor, rng));
        Ok(tensor)
    }

    /// Decode an image file and transform it.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Array3<f32>> {
        let path = path.as_ref();
        let image = image::open(path)
            .with_context(|| format!("unable to decode image '{}'", path.display()))?
            .to_rgb8();
        self.forward(image)
            .with_context(|| format!("unable to transform image '{}'", path.display()))
    }
}

impl Display for TransformPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Compose(")?;
        for step in &self.image_steps {
            writeln!(f, "    {}", step)?;
        }
        writeln!(f, "    ToTensor()")?;
        for step in &self.tensor_steps {
            writeln!(f, "    {}", step)?;
        }
        write!(f, ")")
    }
}
