use kurbo::Point;

/// Raw mouse/pointer action in client (screen) coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerAction {
    Down,
    Move,
    Up,
    Leave,
}

#[derive(Clone, Copy, Debug)]
pub struct PointerInput {
    pub action: PointerAction,
    pub client: Point,
}

/// Phase of a touch interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchPhase {
    Started,
    Moved,
    Ended,
    Cancelled,
}

/// One touch update; `touches` carries the active touch points in client
/// coordinates. Only the first active point drives drawing.
#[derive(Clone, Debug)]
pub struct TouchInput {
    pub phase: TouchPhase,
    pub touches: Vec<Point>,
}

/// On-screen bounding box of the drawing surface, in client coordinates.
/// The box may be scaled relative to the surface's pixel size.
#[derive(Clone, Copy, Debug)]
pub struct ViewRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Normalized event in surface-relative coordinates, driving the stroke
/// engine's idle/drawing transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SurfaceEvent {
    Begin(Point),
    MoveTo(Point),
    End,
}

/// Result of routing a touch update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchRouting {
    pub event: Option<SurfaceEvent>,
    /// True while a draw gesture is in progress; the embedder should
    /// suppress default scroll/gesture handling for the update.
    pub suppress_default: bool,
}

/// Maps mouse and touch events to coordinates relative to the drawing
/// surface, correct under on-screen scaling.
#[derive(Clone, Debug)]
pub struct InputRouter {
    surface_width: f64,
    surface_height: f64,
    view: ViewRect,
    gesture_active: bool,
}

impl InputRouter {
    pub fn new(surface_width: u32, surface_height: u32, view: ViewRect) -> Self {
        Self {
            surface_width: f64::from(surface_width),
            surface_height: f64::from(surface_height),
            view,
            gesture_active: false,
        }
    }

    /// Update the surface's on-screen bounding box (scroll, resize, zoom).
    pub fn set_view(&mut self, view: ViewRect) {
        self.view = view;
    }

    /// Client coordinates to surface-relative coordinates.
    pub fn to_surface(&self, client: Point) -> Point {
        let sx = self.surface_width / self.view.width.max(f64::EPSILON);
        let sy = self.surface_height / self.view.height.max(f64::EPSILON);
        Point::new((client.x - self.view.x) * sx, (client.y - self.view.y) * sy)
    }

    pub fn route_pointer(&self, input: &PointerInput) -> SurfaceEvent {
        match input.action {
            PointerAction::Down => SurfaceEvent::Begin(self.to_surface(input.client)),
            PointerAction::Move => SurfaceEvent::MoveTo(self.to_surface(input.client)),
            PointerAction::Up | PointerAction::Leave => SurfaceEvent::End,
        }
    }

    pub fn route_touch(&mut self, input: &TouchInput) -> TouchRouting {
        let first = input.touches.first().copied();
        match input.phase {
            TouchPhase::Started => match first {
                Some(p) => {
                    self.gesture_active = true;
                    TouchRouting {
                        event: Some(SurfaceEvent::Begin(self.to_surface(p))),
                        suppress_default: true,
                    }
                }
                None => TouchRouting {
                    event: None,
                    suppress_default: false,
                },
            },
            TouchPhase::Moved => match first {
                Some(p) if self.gesture_active => TouchRouting {
                    event: Some(SurfaceEvent::MoveTo(self.to_surface(p))),
                    suppress_default: true,
                },
                _ => TouchRouting {
                    event: None,
                    suppress_default: false,
                },
            },
            TouchPhase::Ended | TouchPhase::Cancelled => {
                let was_active = self.gesture_active;
                self.gesture_active = false;
                TouchRouting {
                    event: Some(SurfaceEvent::End),
                    suppress_default: was_active,
                }
            }
        }
    }
}
