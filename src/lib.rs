#![forbid(unsafe_code)]

pub mod assets;
pub mod blur;
pub mod color;
pub mod compose;
pub mod composite;
pub mod error;
pub mod export;
pub mod input;
pub mod model;
pub mod preview;
pub mod stroke;
pub mod surface;
pub mod template;
pub mod text;

pub use assets::{
    ImageDelivery, PendingImage, PreparedImage, decode_image, fetch_image_bytes, fetch_image_file,
};
pub use color::Rgba8;
pub use compose::{CARD_HEIGHT, CARD_WIDTH, ComposeInputs, Preview, compose_preview};
pub use error::{PostcraftError, PostcraftResult};
pub use input::{
    InputRouter, PointerAction, PointerInput, SurfaceEvent, TouchInput, TouchPhase, ViewRect,
};
pub use model::{LayoutPreset, PostcardSpec, Tool};
pub use preview::{PreviewRequest, Previewer};
pub use stroke::StrokeEngine;
pub use surface::Surface;
pub use template::draw_back_template;
pub use text::{FontFace, TextShaper, wrap_text};
