use std::sync::Arc;

use crate::{
    color::Rgba8,
    error::{PostcraftError, PostcraftResult},
    surface::affine_to_cpu,
};

/// Raw font bytes backing message text.
#[derive(Clone)]
pub struct FontFace {
    bytes: Arc<Vec<u8>>,
}

impl FontFace {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(bytes),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

/// Stateful helper for shaping and measuring single lines of text.
///
/// Explicit line breaks and word wrapping are handled by [`wrap_text`]; the
/// shaper itself always produces one-line layouts.
pub struct TextShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Rgba8>,
}

impl Default for TextShaper {
    fn default() -> Self {
        Self::new()
    }
}

impl TextShaper {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Shape one line of text with the given font bytes, size and brush.
    pub fn shape_line(
        &mut self,
        text: &str,
        font: &FontFace,
        size_px: f32,
        brush: Rgba8,
    ) -> PostcraftResult<parley::Layout<Rgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(PostcraftError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let families = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(font.bytes().to_vec()),
            None,
        );
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            PostcraftError::validation("no font families registered from font bytes")
        })?;
        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| PostcraftError::validation("registered font family has no name"))?
            .to_string();

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<Rgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }

    /// Advance width of one line at the given size, trailing whitespace
    /// included.
    pub fn measure(&mut self, text: &str, font: &FontFace, size_px: f32) -> PostcraftResult<f32> {
        Ok(self
            .shape_line(text, font, size_px, Rgba8::default())?
            .full_width())
    }
}

/// Greedy word wrap. For each explicit line, words accumulate until adding
/// one would exceed `max_width`; the accumulated line is then flushed and the
/// word starts the next line. Empty explicit lines are preserved so the
/// cursor still advances for them.
///
/// Every word appears exactly once, in order; no output line exceeds
/// `max_width` except a lone word that alone exceeds it (accepted overflow,
/// never broken mid-word).
pub fn wrap_text(
    text: &str,
    max_width: f32,
    mut measure: impl FnMut(&str) -> PostcraftResult<f32>,
) -> PostcraftResult<Vec<String>> {
    let mut lines = Vec::new();
    for raw_line in text.split('\n') {
        let mut line = String::new();
        for word in raw_line.split_whitespace() {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }
            let candidate = format!("{line} {word}");
            if measure(&candidate)? > max_width {
                lines.push(std::mem::take(&mut line));
                line.push_str(word);
            } else {
                line = candidate;
            }
        }
        lines.push(line);
    }
    Ok(lines)
}

/// A wrapped message positioned on a card face, in face-local units.
#[derive(Clone, Copy, Debug)]
pub struct TextBlock<'a> {
    pub text: &'a str,
    pub size: f32,
    pub color: Rgba8,
    pub origin: kurbo::Point,
    pub max_width: f32,
    pub line_height: f64,
}

/// Shaped, positioned lines ready to draw. Shaping is the fallible half;
/// drawing shaped lines cannot fail.
pub struct ShapedBlock {
    lines: Vec<(parley::Layout<Rgba8>, kurbo::Affine)>,
    font_data: vello_cpu::peniko::FontData,
}

/// Wrap and shape a message block. `transform` maps face-local units onto
/// the output surface (it may scale and rotate); the anchor origin is the
/// top-left of the first line box and the cursor advances by the fixed line
/// height.
pub fn shape_wrapped(
    shaper: &mut TextShaper,
    font: &FontFace,
    block: &TextBlock<'_>,
    transform: kurbo::Affine,
) -> PostcraftResult<ShapedBlock> {
    let wrapped = wrap_text(block.text, block.max_width, |line| {
        shaper.measure(line, font, block.size)
    })?;

    let mut lines = Vec::with_capacity(wrapped.len());
    for (i, line) in wrapped.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let layout = shaper.shape_line(line, font, block.size, block.color)?;
        let line_transform = transform
            * kurbo::Affine::translate((
                block.origin.x,
                block.origin.y + i as f64 * block.line_height,
            ));
        lines.push((layout, line_transform));
    }

    Ok(ShapedBlock {
        lines,
        font_data: vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font.bytes().to_vec()),
            0,
        ),
    })
}

/// Draw shaped lines as glyph runs.
pub fn draw_shaped(ctx: &mut vello_cpu::RenderContext, shaped: &ShapedBlock) {
    for (layout, transform) in &shaped.lines {
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(affine_to_cpu(*transform));

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };

                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));

                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&shaped.font_data)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
    }
}
