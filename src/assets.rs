use std::{
    path::{Path, PathBuf},
    sync::Arc,
    thread,
};

use futures::channel::oneshot;

use crate::{
    error::{PostcraftError, PostcraftResult},
    surface::premul_bytes_to_paint,
};

/// Decoded raster image in premultiplied RGBA8 form.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    pub fn from_premul_bytes(width: u32, height: u32, bytes: Vec<u8>) -> PostcraftResult<Self> {
        if bytes.len() != width as usize * height as usize * 4 {
            return Err(PostcraftError::validation(
                "image byte length does not match width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(bytes),
        })
    }
}

/// Decode an encoded image (PNG, JPEG, ...) and premultiply its alpha.
pub fn decode_image(bytes: &[u8]) -> PostcraftResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| PostcraftError::load(format!("decode image: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Read and decode an image from disk.
pub fn load_image_file(path: &Path) -> PostcraftResult<PreparedImage> {
    let bytes = std::fs::read(path)
        .map_err(|e| PostcraftError::load(format!("read image '{}': {e}", path.display())))?;
    decode_image(&bytes)
}

/// Snapshot a prepared image as a paint for drawing onto a surface.
pub fn image_paint(img: &PreparedImage) -> PostcraftResult<vello_cpu::Image> {
    premul_bytes_to_paint(img.rgba8_premul.as_slice(), img.width, img.height)
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

/// One-shot handle for an image that is still loading.
///
/// Image loading is the pipeline's only asynchronous boundary: the uploader
/// (or a decode thread) completes the handle exactly once, and the preview
/// compositor awaits it before drawing anything. A handle whose delivery is
/// dropped resolves to a load error rather than hanging.
pub struct PendingImage {
    rx: oneshot::Receiver<PostcraftResult<PreparedImage>>,
}

/// Completion side of a [`PendingImage`].
pub struct ImageDelivery {
    tx: oneshot::Sender<PostcraftResult<PreparedImage>>,
}

impl ImageDelivery {
    /// Complete the pending image with a decoded result or a load failure.
    pub fn supply(self, result: PostcraftResult<PreparedImage>) {
        let _ = self.tx.send(result);
    }
}

impl PendingImage {
    /// A handle that resolves immediately with an already-decoded image.
    pub fn ready(image: PreparedImage) -> Self {
        let (delivery, pending) = Self::channel();
        delivery.supply(Ok(image));
        pending
    }

    /// A handle plus its completion side, for upload wiring to finish later.
    pub fn channel() -> (ImageDelivery, PendingImage) {
        let (tx, rx) = oneshot::channel();
        (ImageDelivery { tx }, PendingImage { rx })
    }

    /// Await the one-shot completion.
    pub async fn wait(self) -> PostcraftResult<PreparedImage> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(PostcraftError::load(
                "image source was dropped before loading completed",
            )),
        }
    }
}

/// Decode image bytes off-thread, delivering through a one-shot completion.
pub fn fetch_image_bytes(bytes: Vec<u8>) -> PendingImage {
    let (delivery, pending) = PendingImage::channel();
    thread::spawn(move || delivery.supply(decode_image(&bytes)));
    pending
}

/// Read and decode an image file off-thread, delivering through a one-shot
/// completion.
pub fn fetch_image_file(path: impl Into<PathBuf>) -> PendingImage {
    let path = path.into();
    let (delivery, pending) = PendingImage::channel();
    thread::spawn(move || delivery.supply(load_image_file(&path)));
    pending
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn png_1x1() -> Vec<u8> {
        let img = image::RgbaImage::from_raw(1, 1, vec![100u8, 50u8, 200u8, 128u8]).unwrap();
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decode_image_premultiplies_alpha() {
        let prepared = decode_image(&png_1x1()).unwrap();
        assert_eq!(prepared.width, 1);
        assert_eq!(prepared.height, 1);
        assert_eq!(
            prepared.rgba8_premul.as_slice(),
            &[
                ((100u16 * 128 + 127) / 255) as u8,
                ((50u16 * 128 + 127) / 255) as u8,
                ((200u16 * 128 + 127) / 255) as u8,
                128u8
            ]
        );
    }

    #[test]
    fn decode_image_surfaces_load_errors() {
        let err = decode_image(&[0x00, 0x01, 0x02]).unwrap_err();
        assert!(matches!(err, PostcraftError::Load(_)));
    }

    #[test]
    fn fetch_image_bytes_resolves_through_the_one_shot() {
        let prepared = futures::executor::block_on(fetch_image_bytes(png_1x1()).wait()).unwrap();
        assert_eq!((prepared.width, prepared.height), (1, 1));
    }

    #[test]
    fn dropped_delivery_resolves_to_a_load_error() {
        let (delivery, pending) = PendingImage::channel();
        drop(delivery);
        let err = futures::executor::block_on(pending.wait()).unwrap_err();
        assert!(matches!(err, PostcraftError::Load(_)));
    }

    #[test]
    fn ready_resolves_immediately() {
        let img = PreparedImage::from_premul_bytes(1, 1, vec![0, 0, 0, 0]).unwrap();
        let got = futures::executor::block_on(PendingImage::ready(img).wait()).unwrap();
        assert_eq!(got.width, 1);
    }
}
