use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use webp::Encoder;

use crate::error::ConvertError;

/// Lossy WebP quality on libwebp's 0-100 scale.
pub const WEBP_QUALITY: f32 = 90.0;

/// Largest width or height a WebP bitstream can carry.
pub const MAX_WEBP_DIMENSION: u32 = 16383;

/// Extension given to every converted file.
pub const OUTPUT_EXTENSION: &str = "webp";

/// A single-file conversion step the batch orchestrator can drive.
pub trait FileConverter: Send + Sync {
    /// Convert `input` and return the path of the written output.
    fn convert_one(&self, input: &Path, short_edge_size: i32) -> Result<PathBuf, ConvertError>;
}

/// Decodes, resizes and re-encodes images as WebP.
#[derive(Debug, Clone, Default)]
pub struct ImageConverter;

impl ImageConverter {
    pub fn new() -> Self {
        Self
    }

    /// Load an image, detecting its format from the content rather than the extension.
    pub fn decode(&self, path: &Path) -> Result<DynamicImage, ConvertError> {
        log::info!("Loading image: {}", path.display());

        let image = ImageReader::open(path)
            .map_err(image::ImageError::from)?
            .with_guessed_format()
            .map_err(image::ImageError::from)?
            .decode()?;

        let (width, height) = image.dimensions();
        log::debug!("Image loaded: {} ({}x{})", path.display(), width, height);
        Ok(image)
    }

    /// Scale `image` so its shorter side equals `short_edge_size`.
    ///
    /// A size of zero or less leaves the image untouched and borrows it back.
    pub fn resize<'a>(&self, image: &'a DynamicImage, short_edge_size: i32) -> Cow<'a, DynamicImage> {
        let Some(short_edge) = positive_size(short_edge_size) else {
            log::debug!("No resizing needed, keeping original dimensions");
            return Cow::Borrowed(image);
        };

        let (width, height) = image.dimensions();
        let (new_width, new_height) = short_edge_dimensions(width, height, short_edge);

        log::info!(
            "Resizing image from {}x{} to {}x{}",
            width, height, new_width, new_height
        );

        Cow::Owned(image.resize_exact(new_width, new_height, FilterType::CatmullRom))
    }

    /// Encode `image` as lossy WebP at [`WEBP_QUALITY`] and write it to `output_path`.
    ///
    /// Missing parent directories are created. Returns the number of bytes written.
    /// A failed write may leave a partial file behind.
    pub fn encode(&self, image: &DynamicImage, output_path: &Path) -> Result<u64, ConvertError> {
        let (width, height) = image.dimensions();
        check_webp_limits(width, height)?;

        log::info!("Saving image as WebP: {}", output_path.display());

        // libwebp only takes 8-bit RGB or RGBA buffers
        let pixels = match image {
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => Cow::Borrowed(image),
            other if other.color().has_alpha() => {
                Cow::Owned(DynamicImage::ImageRgba8(other.to_rgba8()))
            }
            other => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
        };

        let encoder = Encoder::from_image(&pixels)
            .map_err(|e| ConvertError::EncoderUnavailable(e.to_string()))?;
        let webp_data = encoder
            .encode_simple(false, WEBP_QUALITY)
            .map_err(|e| ConvertError::Encode(format!("{e:?}")))?;

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConvertError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        std::fs::write(output_path, &*webp_data).map_err(|source| ConvertError::Write {
            path: output_path.to_path_buf(),
            source,
        })?;

        log::info!(
            "Saved WebP image: {} ({} bytes)",
            output_path.display(),
            webp_data.len()
        );
        Ok(webp_data.len() as u64)
    }
}

impl FileConverter for ImageConverter {
    fn convert_one(&self, input: &Path, short_edge_size: i32) -> Result<PathBuf, ConvertError> {
        log::info!("Starting conversion: {}", input.display());

        let output_path = output_path_for(input)?;
        let image = self.decode(input)?;

        if let Some(short_edge) = positive_size(short_edge_size) {
            let (width, height) = image.dimensions();
            let (new_width, new_height) = short_edge_dimensions(width, height, short_edge);
            check_webp_limits(new_width, new_height)?;
        }

        let resized = self.resize(&image, short_edge_size);
        self.encode(&resized, &output_path)?;

        log::info!(
            "Conversion completed: {} -> {}",
            input.display(),
            output_path.display()
        );
        Ok(output_path)
    }
}

/// Output file for `input`: its absolute path with the last extension replaced by `.webp`.
pub fn output_path_for(input: &Path) -> Result<PathBuf, ConvertError> {
    let absolute = std::path::absolute(input).map_err(|source| ConvertError::Write {
        path: input.to_path_buf(),
        source,
    })?;

    if absolute.extension().is_none() {
        return Err(ConvertError::NoExtension(absolute));
    }

    Ok(absolute.with_extension(OUTPUT_EXTENSION))
}

/// Dimensions after scaling the shorter side of `width`x`height` to `short_edge`.
///
/// The longer side keeps the aspect ratio and is rounded half away from zero.
/// Square images scale on height, which gives the same result.
pub fn short_edge_dimensions(width: u32, height: u32, short_edge: u32) -> (u32, u32) {
    if width < height {
        let new_height = (height as f64 * short_edge as f64 / width as f64).round() as u32;
        (short_edge, new_height)
    } else {
        let new_width = (width as f64 * short_edge as f64 / height as f64).round() as u32;
        (new_width, short_edge)
    }
}

fn positive_size(short_edge_size: i32) -> Option<u32> {
    u32::try_from(short_edge_size).ok().filter(|&size| size > 0)
}

fn check_webp_limits(width: u32, height: u32) -> Result<(), ConvertError> {
    if width > MAX_WEBP_DIMENSION || height > MAX_WEBP_DIMENSION {
        return Err(ConvertError::TooLarge {
            width,
            height,
            max: MAX_WEBP_DIMENSION,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, Rgba};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    #[test]
    fn portrait_scales_width_to_short_edge() {
        assert_eq!(short_edge_dimensions(400, 800, 200), (200, 400));
    }

    #[test]
    fn landscape_scales_height_to_short_edge() {
        assert_eq!(short_edge_dimensions(800, 400, 200), (400, 200));
    }

    #[test]
    fn square_scales_both_edges() {
        assert_eq!(short_edge_dimensions(500, 500, 120), (120, 120));
    }

    #[test]
    fn long_edge_rounds_half_up() {
        // 3 * 3 / 2 = 4.5
        assert_eq!(short_edge_dimensions(2, 3, 3), (3, 5));
        // 1000 * 1 / 3 = 333.33..
        assert_eq!(short_edge_dimensions(1000, 3, 1), (333, 1));
    }

    #[test]
    fn upscaling_is_allowed() {
        assert_eq!(short_edge_dimensions(40, 30, 300), (400, 300));
    }

    #[test]
    fn non_positive_size_keeps_original() {
        let converter = ImageConverter::new();
        let image = gradient(64, 48);

        for size in [0, -1, i32::MIN] {
            let resized = converter.resize(&image, size);
            assert!(matches!(resized, Cow::Borrowed(_)));
            assert_eq!(resized.dimensions(), (64, 48));
        }
    }

    #[test]
    fn resize_produces_short_edge_dimensions() {
        let converter = ImageConverter::new();

        let portrait = gradient(40, 80);
        assert_eq!(converter.resize(&portrait, 20).dimensions(), (20, 40));

        let landscape = gradient(80, 40);
        assert_eq!(converter.resize(&landscape, 20).dimensions(), (40, 20));

        // source untouched
        assert_eq!(portrait.dimensions(), (40, 80));
    }

    #[test]
    fn output_path_replaces_extension() {
        let output = output_path_for(Path::new("photos/holiday.jpeg")).unwrap();
        let expected = std::env::current_dir().unwrap().join("photos/holiday.webp");
        assert_eq!(output, expected);
    }

    #[cfg(unix)]
    #[test]
    fn output_path_ignores_extension_case() {
        assert_eq!(
            output_path_for(Path::new("/a/b/photo.JPG")).unwrap(),
            PathBuf::from("/a/b/photo.webp")
        );
        assert_eq!(
            output_path_for(Path::new("/a/b/archive.tar.png")).unwrap(),
            PathBuf::from("/a/b/archive.tar.webp")
        );
    }

    #[test]
    fn output_path_requires_extension() {
        let err = output_path_for(Path::new("photos/README")).unwrap_err();
        assert!(matches!(err, ConvertError::NoExtension(_)));
    }

    #[test]
    fn decode_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let err = ImageConverter::new().decode(&path).unwrap_err();
        assert!(matches!(err, ConvertError::Decode(_)));
    }

    #[test]
    fn decode_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageConverter::new()
            .decode(&dir.path().join("missing.jpg"))
            .unwrap_err();
        assert!(matches!(err, ConvertError::Decode(_)));
    }

    #[test]
    fn decode_trusts_content_over_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actually_png.jpg");
        gradient(10, 6)
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();

        let image = ImageConverter::new().decode(&path).unwrap();
        assert_eq!(image.dimensions(), (10, 6));
    }

    #[test]
    fn encode_writes_webp_and_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested/deeper/out.webp");

        let written = ImageConverter::new().encode(&gradient(32, 16), &output).unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(written, bytes.len() as u64);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }

    #[test]
    fn encode_accepts_alpha_and_grayscale() {
        let dir = tempfile::tempdir().unwrap();
        let converter = ImageConverter::new();

        let rgba = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(8, 8, Rgba([10, 20, 30, 40])));
        converter.encode(&rgba, &dir.path().join("alpha.webp")).unwrap();

        let gray = DynamicImage::new_luma8(8, 8);
        converter.encode(&gray, &dir.path().join("gray.webp")).unwrap();
    }

    #[test]
    fn encode_rejects_oversized_images() {
        let err = check_webp_limits(MAX_WEBP_DIMENSION + 1, 10).unwrap_err();
        assert!(matches!(err, ConvertError::TooLarge { .. }));
        assert!(check_webp_limits(MAX_WEBP_DIMENSION, MAX_WEBP_DIMENSION).is_ok());
    }

    #[test]
    fn convert_one_writes_sibling_webp() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("portrait.png");
        gradient(40, 80).save(&input).unwrap();

        let output = ImageConverter::new().convert_one(&input, 20).unwrap();

        assert_eq!(output, dir.path().join("portrait.webp"));
        let written = image::open(&output).unwrap();
        assert_eq!(written.dimensions(), (20, 40));
        // originals are never touched
        assert!(input.exists());
    }

    #[test]
    fn convert_one_rejects_resize_beyond_webp_limits() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("strip.png");
        gradient(20, 2).save(&input).unwrap();

        // 20 * 2000 / 2 = 20000 on the long edge
        let err = ImageConverter::new().convert_one(&input, 2000).unwrap_err();
        assert!(matches!(err, ConvertError::TooLarge { .. }));
        assert!(!dir.path().join("strip.webp").exists());
    }

    #[test]
    fn convert_one_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scene.bmp");
        gradient(90, 60).save(&input).unwrap();
        let converter = ImageConverter::new();

        let first = converter.convert_one(&input, 30).unwrap();
        let first_dims = image::open(&first).unwrap().dimensions();
        let second = converter.convert_one(&input, 30).unwrap();
        let second_dims = image::open(&second).unwrap().dimensions();

        assert_eq!(first, second);
        assert_eq!(first_dims, (45, 30));
        assert_eq!(first_dims, second_dims);
    }
}
