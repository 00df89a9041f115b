use std::{io::Cursor, path::Path};

use anyhow::Context as _;
use image::ImageEncoder as _;

use crate::{
    compose::Preview,
    error::{PostcraftError, PostcraftResult},
    model::LayoutPreset,
};

const JPEG_QUALITY: u8 = 70;
const JPEG_DOWNSCALE: u32 = 2;

/// Download filename: `my-postcard.png`, or `my-postcard-<preset>.png` when
/// a preset is named.
pub fn suggested_filename(preset: Option<LayoutPreset>) -> String {
    match preset {
        None => "my-postcard.png".to_string(),
        Some(preset) => format!("my-postcard-{}.png", preset.name()),
    }
}

/// Encode the preview as PNG. Previews are fully opaque, so premultiplied
/// and straight RGBA8 coincide.
pub fn png_bytes(preview: &Preview) -> PostcraftResult<Vec<u8>> {
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(Cursor::new(&mut buf))
        .write_image(
            &preview.data,
            preview.width,
            preview.height,
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| PostcraftError::export(format!("encode png: {e}")))?;
    Ok(buf)
}

/// Size-reduction path: downscale by half and encode JPEG at reduced
/// quality.
pub fn jpeg_bytes(preview: &Preview) -> PostcraftResult<Vec<u8>> {
    let rgba = image::RgbaImage::from_raw(preview.width, preview.height, preview.data.clone())
        .ok_or_else(|| {
            PostcraftError::export("preview buffer does not match its dimensions")
        })?;

    let w = (preview.width / JPEG_DOWNSCALE).max(1);
    let h = (preview.height / JPEG_DOWNSCALE).max(1);
    let small = image::imageops::resize(&rgba, w, h, image::imageops::FilterType::Triangle);
    let rgb = image::DynamicImage::ImageRgba8(small).to_rgb8();

    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut buf), JPEG_QUALITY)
        .write_image(rgb.as_raw(), w, h, image::ExtendedColorType::Rgb8)
        .map_err(|e| PostcraftError::export(format!("encode jpeg: {e}")))?;
    Ok(buf)
}

pub fn write_png(preview: &Preview, path: &Path) -> PostcraftResult<()> {
    let bytes = png_bytes(preview)?;
    std::fs::write(path, bytes).with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_preview() -> Preview {
        Preview {
            preset: LayoutPreset::Square,
            width: 9,
            height: 5,
            data: vec![255; 9 * 5 * 4],
        }
    }

    #[test]
    fn filenames_follow_the_download_convention() {
        assert_eq!(suggested_filename(None), "my-postcard.png");
        assert_eq!(
            suggested_filename(Some(LayoutPreset::Horizontal)),
            "my-postcard-horizontal.png"
        );
        assert_eq!(
            suggested_filename(Some(LayoutPreset::RotatedBackground)),
            "my-postcard-rotated-with-background.png"
        );
    }

    #[test]
    fn png_roundtrips_dimensions_and_pixels() {
        let preview = tiny_preview();
        let bytes = png_bytes(&preview).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (9, 5));
        assert_eq!(decoded.as_raw(), &preview.data);
    }

    #[test]
    fn jpeg_downscales_by_half() {
        let bytes = jpeg_bytes(&tiny_preview()).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(image::GenericImageView::dimensions(&decoded), (4, 2));
    }

    #[test]
    fn jpeg_rejects_mismatched_buffers() {
        let mut preview = tiny_preview();
        preview.data.truncate(7);
        assert!(jpeg_bytes(&preview).is_err());
    }
}
