use std::sync::Arc;

use crate::{
    color::Rgba8,
    error::{PostcraftError, PostcraftResult},
};

/// Fixed-size raster buffer in premultiplied RGBA8.
///
/// A surface is owned by the component that created it, is mutated in place,
/// and is never resized. Vector draws go through a per-call
/// [`vello_cpu::RenderContext`] that composites onto the existing pixels, so
/// freehand strokes accumulate incrementally. Draws outside the buffer are
/// clipped by the rasterizer.
pub struct Surface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> PostcraftResult<Self> {
        if width == 0 || height == 0 {
            return Err(PostcraftError::validation(
                "surface width/height must be > 0",
            ));
        }
        let width_u16: u16 = width
            .try_into()
            .map_err(|_| PostcraftError::validation("surface width exceeds u16"))?;
        let height_u16: u16 = height
            .try_into()
            .map_err(|_| PostcraftError::validation("surface height exceeds u16"))?;
        Ok(Self {
            width: width_u16,
            height: height_u16,
            pixmap: vello_cpu::Pixmap::new(width_u16, height_u16),
        })
    }

    pub fn width(&self) -> u32 {
        u32::from(self.width)
    }

    pub fn height(&self) -> u32 {
        u32::from(self.height)
    }

    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        self.pixmap.data_as_u8_slice_mut()
    }

    /// Premultiplied RGBA8 value at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let data = self.pixmap.data_as_u8_slice();
        [data[idx], data[idx + 1], data[idx + 2], data[idx + 3]]
    }

    /// Wipe the whole surface to full transparency.
    pub fn clear(&mut self) {
        for px in self.pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
            px.copy_from_slice(&[0, 0, 0, 0]);
        }
    }

    /// Clear an axis-aligned rectangle to full transparency, clamped to the
    /// surface bounds.
    pub fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let x0 = (x.round().max(0.0) as usize).min(self.width as usize);
        let y0 = (y.round().max(0.0) as usize).min(self.height as usize);
        let x1 = ((x + w).round().max(0.0) as usize).min(self.width as usize);
        let y1 = ((y + h).round().max(0.0) as usize).min(self.height as usize);

        let stride = self.width as usize * 4;
        let data = self.pixmap.data_as_u8_slice_mut();
        for row in y0..y1 {
            let start = row * stride + x0 * 4;
            let end = row * stride + x1 * 4;
            data[start..end].fill(0);
        }
    }

    /// Fill a path with a solid color under the given transform.
    pub fn fill_path(&mut self, path: &kurbo::BezPath, transform: kurbo::Affine, color: Rgba8) {
        self.draw(|ctx| {
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_transform(affine_to_cpu(transform));
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                color.r, color.g, color.b, color.a,
            ));
            ctx.fill_path(&bezpath_to_cpu(path));
        });
    }

    /// Fill an axis-aligned rectangle with a solid color under the given
    /// transform.
    pub fn fill_rect(&mut self, rect: kurbo::Rect, transform: kurbo::Affine, color: Rgba8) {
        self.draw(|ctx| {
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_transform(affine_to_cpu(transform));
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                color.r, color.g, color.b, color.a,
            ));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                rect.x0, rect.y0, rect.x1, rect.y1,
            ));
        });
    }

    /// Draw an image paint: the transform maps the image's pixel rect
    /// `(0, 0, w, h)` onto this surface.
    pub fn draw_image(
        &mut self,
        paint: &vello_cpu::Image,
        transform: kurbo::Affine,
        w: f64,
        h: f64,
    ) {
        self.draw(|ctx| {
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_transform(affine_to_cpu(transform));
            ctx.set_paint(paint.clone());
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
        });
    }

    /// Run raw draw ops against a fresh render context and composite the
    /// result onto this surface.
    pub fn draw(&mut self, f: impl FnOnce(&mut vello_cpu::RenderContext)) {
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        f(&mut ctx);
        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);
    }

    /// Snapshot this surface as an image paint for compositing onto another
    /// surface.
    pub fn as_paint(&self) -> PostcraftResult<vello_cpu::Image> {
        premul_bytes_to_paint(self.data(), self.width(), self.height())
    }
}

impl Clone for Surface {
    fn clone(&self) -> Self {
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        pixmap
            .data_as_u8_slice_mut()
            .copy_from_slice(self.pixmap.data_as_u8_slice());
        Self {
            width: self.width,
            height: self.height,
            pixmap,
        }
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Build an image paint from premultiplied RGBA8 bytes.
pub(crate) fn premul_bytes_to_paint(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> PostcraftResult<vello_cpu::Image> {
    let w: u16 = width
        .try_into()
        .map_err(|_| PostcraftError::validation("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| PostcraftError::validation("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(PostcraftError::validation(
            "image byte length does not match width*height*4",
        ));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(
            vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, may_have_opacities),
        )),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

pub(crate) fn affine_to_cpu(a: kurbo::Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub(crate) fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

pub(crate) fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_zero_and_oversize_dimensions() {
        assert!(Surface::new(0, 10).is_err());
        assert!(Surface::new(10, 0).is_err());
        assert!(Surface::new(70_000, 10).is_err());
    }

    #[test]
    fn clear_leaves_surface_fully_transparent() {
        let mut s = Surface::new(8, 8).unwrap();
        s.fill_rect(
            kurbo::Rect::new(0.0, 0.0, 8.0, 8.0),
            kurbo::Affine::IDENTITY,
            Rgba8::BLACK,
        );
        assert!(s.data().iter().any(|&b| b != 0));
        s.clear();
        assert!(s.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn clear_rect_clamps_to_bounds() {
        let mut s = Surface::new(8, 8).unwrap();
        s.fill_rect(
            kurbo::Rect::new(0.0, 0.0, 8.0, 8.0),
            kurbo::Affine::IDENTITY,
            Rgba8::BLACK,
        );
        s.clear_rect(-4.0, -4.0, 8.0, 8.0);
        assert_eq!(s.pixel(0, 0), [0, 0, 0, 0]);
        assert_eq!(s.pixel(3, 3), [0, 0, 0, 0]);
        assert_eq!(s.pixel(4, 4), [0, 0, 0, 255]);
        assert_eq!(s.pixel(7, 7), [0, 0, 0, 255]);
    }

    #[test]
    fn fill_rect_writes_opaque_pixels() {
        let mut s = Surface::new(8, 8).unwrap();
        s.fill_rect(
            kurbo::Rect::new(2.0, 2.0, 6.0, 6.0),
            kurbo::Affine::IDENTITY,
            Rgba8::opaque(255, 0, 0),
        );
        assert_eq!(s.pixel(4, 4), [255, 0, 0, 255]);
        assert_eq!(s.pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn clone_copies_pixels_without_sharing() {
        let mut a = Surface::new(4, 4).unwrap();
        a.fill_rect(
            kurbo::Rect::new(0.0, 0.0, 4.0, 4.0),
            kurbo::Affine::IDENTITY,
            Rgba8::WHITE,
        );
        let b = a.clone();
        a.clear();
        assert_eq!(b.pixel(2, 2), [255, 255, 255, 255]);
        assert_eq!(a.pixel(2, 2), [0, 0, 0, 0]);
    }
}
