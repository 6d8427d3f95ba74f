use crate::{
    config::{OutputFormat, OutputSpec},
    error::{GenerationError, Result},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ImageEncoder, Rgb, RgbImage, RgbaImage};

pub fn decode_payload(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(BASE64.decode(cleaned)?)
}

/// Decodes, flattens onto the background, contain-fits onto the canvas and re-encodes.
pub fn normalize_image(bytes: &[u8], spec: &OutputSpec) -> Result<Vec<u8>> {
    if spec.width == 0 || spec.height == 0 {
        return Err(GenerationError::ImageError(
            "target canvas must be non-empty".into(),
        ));
    }

    let decoded = image::load_from_memory(bytes)?;
    let flattened = flatten_alpha(&decoded.to_rgba8(), spec.background);
    let canvas = contain_fit(&flattened, spec);
    encode(&canvas, spec)
}

fn flatten_alpha(rgba: &RgbaImage, background: [u8; 3]) -> RgbImage {
    let mut flat = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = u16::from(pixel[3]);
        let blend = |channel: u8, bg: u8| -> u8 {
            ((u16::from(channel) * alpha + u16::from(bg) * (255 - alpha)) / 255) as u8
        };
        flat.put_pixel(
            x,
            y,
            Rgb([
                blend(pixel[0], background[0]),
                blend(pixel[1], background[1]),
                blend(pixel[2], background[2]),
            ]),
        );
    }
    flat
}

fn contain_fit(image: &RgbImage, spec: &OutputSpec) -> RgbImage {
    let (src_w, src_h) = (image.width().max(1), image.height().max(1));
    let scale = f64::min(
        f64::from(spec.width) / f64::from(src_w),
        f64::from(spec.height) / f64::from(src_h),
    );
    let fit_w = ((f64::from(src_w) * scale).round() as u32).clamp(1, spec.width);
    let fit_h = ((f64::from(src_h) * scale).round() as u32).clamp(1, spec.height);

    let resized = imageops::resize(image, fit_w, fit_h, FilterType::Lanczos3);

    let mut canvas = RgbImage::from_pixel(spec.width, spec.height, Rgb(spec.background));
    let x = i64::from((spec.width - fit_w) / 2);
    let y = i64::from((spec.height - fit_h) / 2);
    imageops::overlay(&mut canvas, &resized, x, y);
    canvas
}

fn encode(canvas: &RgbImage, spec: &OutputSpec) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    match spec.format {
        OutputFormat::Jpeg => {
            let mut encoder = JpegEncoder::new_with_quality(&mut bytes, spec.quality);
            encoder.encode_image(canvas)?;
        }
        OutputFormat::Png => {
            PngEncoder::new(&mut bytes).write_image(
                canvas.as_raw(),
                canvas.width(),
                canvas.height(),
                image::ExtendedColorType::Rgb8,
            )?;
        }
    }
    Ok(bytes)
}
