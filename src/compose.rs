use crate::{
    assets::{PreparedImage, image_paint},
    blur::blur_rgba8_premul,
    color::Rgba8,
    composite::over_in_place,
    error::{PostcraftError, PostcraftResult},
    model::LayoutPreset,
    surface::Surface,
    text::{FontFace, TextBlock, TextShaper, draw_shaped, shape_wrapped},
};

/// Pixel size of one card face (both the drawing surface and the template
/// surface are created at this size).
pub const CARD_WIDTH: f64 = 879.0;
pub const CARD_HEIGHT: f64 = 591.0;

const FACE_FILL: Rgba8 = Rgba8::WHITE;
const GRADIENT_FROM: Rgba8 = Rgba8::opaque(0xE5, 0xFF, 0xE6);
const GRADIENT_TO: Rgba8 = Rgba8::opaque(0xFF, 0xF3, 0xD6);

// Back-face message geometry in face-local card units; the face transform
// applies the preset's scale.
const TEXT_SIZE: f32 = 16.0;
const TEXT_LINE_HEIGHT: f64 = 24.0;
const TEXT_INSET: f64 = 36.0;
const TEXT_MAX_WIDTH: f32 = (CARD_WIDTH / 2.0 - 40.0) as f32;

// Drop shadow under the rotated preset's backing rectangles.
const SHADOW_COLOR: Rgba8 = Rgba8::new(0, 0, 0, 38);
const SHADOW_OFFSET_Y: f64 = 4.0;
const SHADOW_BLUR_RADIUS: u32 = 20;

const ROTATED_CANVAS: u32 = 1080;
const ROTATED_SCALE: f64 = 0.5;
const ROTATED_TILT_DEG: f64 = 2.0;
const ROTATED_FACE_OFFSET: (f64, f64) = (60.0, 80.0);

/// Placement of one card face on the output canvas. `(x, y)` is the top-left
/// corner of the scaled face before rotation; rotation is about the face
/// center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceGeometry {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub angle_deg: f64,
}

impl FaceGeometry {
    fn still(x: f64, y: f64, scale: f64) -> Self {
        Self {
            x,
            y,
            scale,
            angle_deg: 0.0,
        }
    }

    /// Affine mapping face-local card units onto the output canvas.
    pub fn transform(&self) -> kurbo::Affine {
        let cx = CARD_WIDTH * self.scale / 2.0;
        let cy = CARD_HEIGHT * self.scale / 2.0;
        kurbo::Affine::translate((self.x, self.y))
            * kurbo::Affine::translate((cx, cy))
            * kurbo::Affine::rotate(self.angle_deg.to_radians())
            * kurbo::Affine::translate((-cx, -cy))
            * kurbo::Affine::scale(self.scale)
    }
}

/// Output size and face placement for one layout preset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PresetGeometry {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub front: FaceGeometry,
    pub back: FaceGeometry,
}

/// Literal per-preset placement.
pub fn geometry(preset: LayoutPreset) -> PresetGeometry {
    match preset {
        LayoutPreset::Horizontal => {
            let (w, h) = (1600.0, 800.0);
            let scale = 0.6;
            let front_y = (h - CARD_HEIGHT * scale) / 2.0;
            PresetGeometry {
                canvas_width: w as u32,
                canvas_height: h as u32,
                front: FaceGeometry::still(w * 0.15, front_y, scale),
                back: FaceGeometry::still(w * 0.55, front_y, scale),
            }
        }
        LayoutPreset::Vertical => {
            let (w, h) = (1920.0, 1080.0);
            let scale = 0.65;
            let x = (w - CARD_WIDTH * scale) / 2.0;
            let front_y = h * 0.15;
            PresetGeometry {
                canvas_width: w as u32,
                canvas_height: h as u32,
                front: FaceGeometry::still(x, front_y, scale),
                back: FaceGeometry::still(x, front_y + CARD_HEIGHT * scale + 40.0, scale),
            }
        }
        LayoutPreset::Square => {
            let (w, h) = (800.0, 800.0);
            let scale = 0.5;
            let x = (w - CARD_WIDTH * scale) / 2.0;
            let front_y = (h - (CARD_HEIGHT * scale * 2.0 + 30.0)) / 2.0;
            PresetGeometry {
                canvas_width: w as u32,
                canvas_height: h as u32,
                front: FaceGeometry::still(x, front_y, scale),
                back: FaceGeometry::still(x, front_y + CARD_HEIGHT * scale + 30.0, scale),
            }
        }
        LayoutPreset::RotatedBackground => {
            let side = f64::from(ROTATED_CANVAS);
            let x = (side - CARD_WIDTH * ROTATED_SCALE) / 2.0;
            let y = (side - CARD_HEIGHT * ROTATED_SCALE) / 2.0;
            let (dx, dy) = ROTATED_FACE_OFFSET;
            PresetGeometry {
                canvas_width: ROTATED_CANVAS,
                canvas_height: ROTATED_CANVAS,
                front: FaceGeometry {
                    x: x - dx,
                    y: y - dy,
                    scale: ROTATED_SCALE,
                    angle_deg: -ROTATED_TILT_DEG,
                },
                back: FaceGeometry {
                    x: x + dx,
                    y: y + dy,
                    scale: ROTATED_SCALE,
                    angle_deg: ROTATED_TILT_DEG,
                },
            }
        }
    }
}

/// Everything a composition reads; captured at invocation time.
#[derive(Clone, Copy, Debug)]
pub struct ComposeInputs<'a> {
    pub preset: LayoutPreset,
    pub photo: &'a PreparedImage,
    pub background: Option<&'a PreparedImage>,
    pub ink: &'a Surface,
    pub template: &'a Surface,
    pub message: &'a str,
    pub font: Option<&'a FontFace>,
    pub text_color: Rgba8,
}

/// Flattened preview image: opaque premultiplied RGBA8, rebuilt from scratch
/// on every composition.
#[derive(Clone, Debug)]
pub struct Preview {
    pub preset: LayoutPreset,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Compose one flattened preview for the preset.
///
/// Pure in its inputs: a fresh output surface is built per call and later
/// draws occlude earlier ones at overlapping pixels.
#[tracing::instrument(skip_all, fields(preset = inputs.preset.name()))]
pub fn compose_preview(
    inputs: &ComposeInputs<'_>,
    shaper: &mut TextShaper,
) -> PostcraftResult<Preview> {
    let geo = geometry(inputs.preset);
    let mut out = Surface::new(geo.canvas_width, geo.canvas_height)?;

    if inputs.preset == LayoutPreset::RotatedBackground {
        let background = inputs.background.ok_or_else(|| {
            PostcraftError::validation(
                "the rotated-with-background preset requires a background image",
            )
        })?;
        draw_cover_background(&mut out, background)?;

        // Back drawn after front so it visually overlaps; each face's shadow
        // sits under its backing rect only, never under the content.
        draw_face_shadow(&mut out, &geo.front)?;
        draw_front_face(&mut out, &geo.front, inputs)?;
        draw_face_shadow(&mut out, &geo.back)?;
        draw_back_face(&mut out, &geo.back, inputs, shaper)?;
    } else {
        fill_gradient(&mut out);
        draw_front_face(&mut out, &geo.front, inputs)?;
        draw_back_face(&mut out, &geo.back, inputs, shaper)?;
    }

    tracing::debug!(
        width = geo.canvas_width,
        height = geo.canvas_height,
        "composed preview"
    );
    Ok(Preview {
        preset: inputs.preset,
        width: geo.canvas_width,
        height: geo.canvas_height,
        data: out.data().to_vec(),
    })
}

fn card_rect() -> kurbo::Rect {
    kurbo::Rect::new(0.0, 0.0, CARD_WIDTH, CARD_HEIGHT)
}

/// Front face: white backing rect, the uploaded photo stretched into the
/// face, then the ink surface overlaid.
fn draw_front_face(
    out: &mut Surface,
    face: &FaceGeometry,
    inputs: &ComposeInputs<'_>,
) -> PostcraftResult<()> {
    let t = face.transform();
    out.fill_rect(card_rect(), t, FACE_FILL);

    let photo = image_paint(inputs.photo)?;
    let (pw, ph) = (f64::from(inputs.photo.width), f64::from(inputs.photo.height));
    out.draw_image(
        &photo,
        t * kurbo::Affine::scale_non_uniform(CARD_WIDTH / pw, CARD_HEIGHT / ph),
        pw,
        ph,
    );

    let ink = inputs.ink.as_paint()?;
    let (iw, ih) = (f64::from(inputs.ink.width()), f64::from(inputs.ink.height()));
    out.draw_image(
        &ink,
        t * kurbo::Affine::scale_non_uniform(CARD_WIDTH / iw, CARD_HEIGHT / ih),
        iw,
        ih,
    );
    Ok(())
}

/// Back face: white backing rect, the static template, then the wrapped
/// message text.
fn draw_back_face(
    out: &mut Surface,
    face: &FaceGeometry,
    inputs: &ComposeInputs<'_>,
    shaper: &mut TextShaper,
) -> PostcraftResult<()> {
    let t = face.transform();
    out.fill_rect(card_rect(), t, FACE_FILL);

    let template = inputs.template.as_paint()?;
    let (tw, th) = (
        f64::from(inputs.template.width()),
        f64::from(inputs.template.height()),
    );
    out.draw_image(
        &template,
        t * kurbo::Affine::scale_non_uniform(CARD_WIDTH / tw, CARD_HEIGHT / th),
        tw,
        th,
    );

    if inputs.message.trim().is_empty() {
        return Ok(());
    }
    let font = inputs.font.ok_or_else(|| {
        PostcraftError::validation("a font is required when message text is set")
    })?;

    let block = TextBlock {
        text: inputs.message,
        size: TEXT_SIZE,
        color: inputs.text_color,
        origin: kurbo::Point::new(TEXT_INSET, TEXT_INSET),
        max_width: TEXT_MAX_WIDTH,
        line_height: TEXT_LINE_HEIGHT,
    };
    let shaped = shape_wrapped(shaper, font, &block, t)?;
    out.draw(|ctx| draw_shaped(ctx, &shaped));
    Ok(())
}

/// Diagonal backdrop gradient across the whole canvas.
fn fill_gradient(out: &mut Surface) {
    let w = f64::from(out.width());
    let h = f64::from(out.height());
    let denom = w * w + h * h;
    let lerp = |a: u8, b: u8, t: f64| -> u8 {
        (f64::from(a) + (f64::from(b) - f64::from(a)) * t + 0.5) as u8
    };

    let width = out.width() as usize;
    for (idx, px) in out.data_mut().chunks_exact_mut(4).enumerate() {
        let x = (idx % width) as f64;
        let y = (idx / width) as f64;
        let t = ((x * w + y * h) / denom).clamp(0.0, 1.0);
        px[0] = lerp(GRADIENT_FROM.r, GRADIENT_TO.r, t);
        px[1] = lerp(GRADIENT_FROM.g, GRADIENT_TO.g, t);
        px[2] = lerp(GRADIENT_FROM.b, GRADIENT_TO.b, t);
        px[3] = 255;
    }
}

/// Cover fit: scale the background to fill the canvas preserving aspect
/// ratio, centered; overflow is cropped by the surface bounds.
fn draw_cover_background(out: &mut Surface, background: &PreparedImage) -> PostcraftResult<()> {
    if background.width == 0 || background.height == 0 {
        return Err(PostcraftError::load("background image has zero dimensions"));
    }
    let (bw, bh) = (f64::from(background.width), f64::from(background.height));
    let (w, h) = (f64::from(out.width()), f64::from(out.height()));
    let scale = (w / bw).max(h / bh);
    let dx = (w - bw * scale) / 2.0;
    let dy = (h - bh * scale) / 2.0;

    let paint = image_paint(background)?;
    out.draw_image(
        &paint,
        kurbo::Affine::translate((dx, dy)) * kurbo::Affine::scale(scale),
        bw,
        bh,
    );
    Ok(())
}

/// Blurred silhouette of the face's backing rect, offset downward and
/// composited under everything the face will draw.
fn draw_face_shadow(out: &mut Surface, face: &FaceGeometry) -> PostcraftResult<()> {
    let mut scratch = Surface::new(out.width(), out.height())?;
    scratch.fill_rect(
        card_rect(),
        kurbo::Affine::translate((0.0, SHADOW_OFFSET_Y)) * face.transform(),
        SHADOW_COLOR,
    );

    let blurred = blur_rgba8_premul(
        scratch.data(),
        scratch.width(),
        scratch.height(),
        SHADOW_BLUR_RADIUS,
    )?;
    over_in_place(out.data_mut(), &blurred, 1.0)
}
