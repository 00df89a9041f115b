use kurbo::Point;

use crate::{color::Rgba8, input::SurfaceEvent, model::Tool, surface::Surface};

/// Side of the square cleared by the eraser, centered on the pointer.
pub const ERASER_SIZE: f64 = 16.0;

const PENCIL_WIDTH_PX: u8 = 2;
const HIGHLIGHTER_WIDTH_PX: u8 = 8;
const HIGHLIGHTER_ALPHA: u8 = 0x80;

const STROKE_TOLERANCE: f64 = 0.1;

/// Ink parameters for a stroking tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InkStyle {
    pub color: Rgba8,
    pub width_px: u8,
}

impl InkStyle {
    fn width(self) -> f64 {
        f64::from(self.width_px)
    }
}

impl Tool {
    /// Compositing parameters as a pure function of the tool: pencil strokes
    /// the configured color at full opacity and a narrow width, highlighter
    /// the same color at a fixed ~50% alpha and a wider width. The eraser
    /// carries no ink.
    pub fn ink(self, color: Rgba8) -> Option<InkStyle> {
        match self {
            Tool::Pencil => Some(InkStyle {
                color,
                width_px: PENCIL_WIDTH_PX,
            }),
            Tool::Highlighter => Some(InkStyle {
                color: color.with_alpha(HIGHLIGHTER_ALPHA),
                width_px: HIGHLIGHTER_WIDTH_PX,
            }),
            Tool::Eraser => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum State {
    Idle,
    Drawing { last: Point },
}

/// Stateful freehand drawing engine.
///
/// `idle --(pointer-down, tool active)--> drawing --(pointer-up |
/// pointer-leave | touch-end/cancel)--> idle`. Tool and color are passed
/// explicitly into every call; the engine keeps no ambient style state.
/// Stroke points are ephemeral, only the raster result persists.
#[derive(Clone, Debug)]
pub struct StrokeEngine {
    state: State,
}

impl Default for StrokeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StrokeEngine {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, State::Drawing { .. })
    }

    /// Dispatch a routed surface event.
    pub fn handle(
        &mut self,
        surface: &mut Surface,
        tool: Option<Tool>,
        color: Rgba8,
        event: SurfaceEvent,
    ) {
        match event {
            SurfaceEvent::Begin(p) => self.pointer_down(tool, p),
            SurfaceEvent::MoveTo(p) => self.pointer_move(surface, tool, color, p),
            SurfaceEvent::End => self.pointer_up(),
        }
    }

    /// Enter the drawing state when a tool is active. Nothing is drawn until
    /// the first move.
    pub fn pointer_down(&mut self, tool: Option<Tool>, at: Point) {
        if tool.is_some() {
            self.state = State::Drawing { last: at };
        }
    }

    /// Extend the current gesture. A no-op unless drawing with an active
    /// tool.
    pub fn pointer_move(
        &mut self,
        surface: &mut Surface,
        tool: Option<Tool>,
        color: Rgba8,
        at: Point,
    ) {
        let State::Drawing { last } = self.state else {
            return;
        };
        let Some(tool) = tool else {
            return;
        };

        match tool.ink(color) {
            None => {
                let half = ERASER_SIZE / 2.0;
                surface.clear_rect(at.x - half, at.y - half, ERASER_SIZE, ERASER_SIZE);
            }
            Some(ink) => stroke_segment(surface, last, at, ink),
        }
        self.state = State::Drawing { last: at };
    }

    /// Pointer up, pointer leave, or touch end/cancel.
    pub fn pointer_up(&mut self) {
        self.state = State::Idle;
    }
}

/// Stroke one segment immediately: the outline is expanded with round caps
/// and joins, then filled so the ink's alpha applies once per pass.
fn stroke_segment(surface: &mut Surface, from: Point, to: Point, ink: InkStyle) {
    let mut seg = kurbo::BezPath::new();
    seg.move_to(from);
    seg.line_to(to);

    let style = kurbo::Stroke::new(ink.width())
        .with_caps(kurbo::Cap::Round)
        .with_join(kurbo::Join::Round);
    let outline = kurbo::stroke(seg, &style, &kurbo::StrokeOpts::default(), STROKE_TOLERANCE);
    surface.fill_path(&outline, kurbo::Affine::IDENTITY, ink.color);
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba8 = Rgba8::opaque(255, 0, 0);

    fn surface() -> Surface {
        Surface::new(32, 32).unwrap()
    }

    fn draw_line(s: &mut Surface, engine: &mut StrokeEngine, tool: Tool) {
        engine.pointer_down(Some(tool), Point::new(4.0, 16.0));
        engine.pointer_move(s, Some(tool), RED, Point::new(28.0, 16.0));
        engine.pointer_up();
    }

    #[test]
    fn no_tool_makes_moves_a_noop() {
        let mut s = surface();
        let mut engine = StrokeEngine::new();
        engine.pointer_down(None, Point::new(4.0, 16.0));
        assert!(!engine.is_drawing());
        engine.pointer_move(&mut s, None, RED, Point::new(28.0, 16.0));
        assert!(s.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn pencil_strokes_full_opacity_within_width() {
        let mut s = surface();
        let mut engine = StrokeEngine::new();
        draw_line(&mut s, &mut engine, Tool::Pencil);

        // 2px-wide line centered on y=16 covers rows 15 and 16 fully.
        assert_eq!(s.pixel(16, 16), [255, 0, 0, 255]);
        assert_eq!(s.pixel(16, 15), [255, 0, 0, 255]);
        assert_eq!(s.pixel(16, 12), [0, 0, 0, 0]);
        assert_eq!(s.pixel(16, 20), [0, 0, 0, 0]);
    }

    #[test]
    fn highlighter_strokes_half_alpha_at_wider_width() {
        let mut s = surface();
        let mut engine = StrokeEngine::new();
        draw_line(&mut s, &mut engine, Tool::Highlighter);

        // 8px-wide line centered on y=16 covers rows 12..20.
        let px = s.pixel(16, 16);
        assert!((i32::from(px[3]) - 0x80).abs() <= 2, "alpha was {}", px[3]);
        assert!((i32::from(px[0]) - 0x80).abs() <= 2, "red was {}", px[0]);
        assert_eq!(px[1], 0);
        assert!(s.pixel(16, 13)[3] > 0);
        assert_eq!(s.pixel(16, 10), [0, 0, 0, 0]);
    }

    #[test]
    fn eraser_clears_square_regardless_of_prior_content() {
        let mut s = surface();
        s.fill_rect(
            kurbo::Rect::new(0.0, 0.0, 32.0, 32.0),
            kurbo::Affine::IDENTITY,
            Rgba8::BLACK,
        );

        let mut engine = StrokeEngine::new();
        engine.pointer_down(Some(Tool::Eraser), Point::new(16.0, 16.0));
        engine.pointer_move(&mut s, Some(Tool::Eraser), RED, Point::new(16.0, 16.0));

        assert_eq!(s.pixel(8, 8), [0, 0, 0, 0]);
        assert_eq!(s.pixel(23, 23), [0, 0, 0, 0]);
        assert_eq!(s.pixel(7, 7), [0, 0, 0, 255]);
        assert_eq!(s.pixel(24, 24), [0, 0, 0, 255]);
    }

    #[test]
    fn pointer_up_returns_to_idle() {
        let mut s = surface();
        let mut engine = StrokeEngine::new();
        engine.pointer_down(Some(Tool::Pencil), Point::new(4.0, 16.0));
        assert!(engine.is_drawing());
        engine.pointer_up();
        assert!(!engine.is_drawing());

        engine.pointer_move(&mut s, Some(Tool::Pencil), RED, Point::new(28.0, 16.0));
        assert!(s.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn ink_parameters_are_a_pure_function_of_tool() {
        let pencil = Tool::Pencil.ink(RED).unwrap();
        assert_eq!(pencil.color, RED);
        assert_eq!(pencil.width_px, 2);

        let highlighter = Tool::Highlighter.ink(RED).unwrap();
        assert_eq!(highlighter.color.a, 0x80);
        assert_eq!(highlighter.width_px, 8);

        assert!(Tool::Eraser.ink(RED).is_none());
    }
}
