use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;

use crate::{
    assets::PendingImage,
    color::Rgba8,
    compose::{ComposeInputs, Preview, compose_preview},
    error::PostcraftResult,
    model::LayoutPreset,
    surface::Surface,
    text::{FontFace, TextShaper},
};

/// Inputs for one preview composition, captured at request time.
///
/// The ink and template surfaces are snapshots taken by value, so an
/// in-flight composition is immune to strokes drawn after it started.
pub struct PreviewRequest {
    pub preset: LayoutPreset,
    pub photo: PendingImage,
    pub background: Option<PendingImage>,
    pub ink: Surface,
    pub template: Surface,
    pub message: String,
    pub font: Option<FontFace>,
    pub text_color: Rgba8,
}

/// Runs preview compositions and tracks the latest surfaced result.
///
/// Every request gets a fresh generation and composes against its own output
/// surface; a request that was superseded before finishing still returns its
/// preview to its caller but is never installed as current, so late-arriving
/// image loads cannot clobber a newer preview.
pub struct Previewer {
    generation: AtomicU64,
    current: Mutex<Option<Arc<Preview>>>,
    shaper: Mutex<TextShaper>,
}

impl Default for Previewer {
    fn default() -> Self {
        Self::new()
    }
}

impl Previewer {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            current: Mutex::new(None),
            shaper: Mutex::new(TextShaper::new()),
        }
    }

    /// Latest surfaced preview, if any composition has completed.
    pub fn current(&self) -> Option<Arc<Preview>> {
        self.current.lock().clone()
    }

    /// Wait for the request's image loads (background first, then photo,
    /// chained in sequence) and compose the preview.
    ///
    /// A failed load is terminal for this attempt: the error is returned and
    /// the current preview is left untouched.
    #[tracing::instrument(skip_all, fields(preset = request.preset.name()))]
    pub async fn compose(&self, request: PreviewRequest) -> PostcraftResult<Arc<Preview>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let background = match request.background {
            Some(pending) => Some(pending.wait().await?),
            None => None,
        };
        let photo = request.photo.wait().await?;

        let preview = {
            let mut shaper = self.shaper.lock();
            compose_preview(
                &ComposeInputs {
                    preset: request.preset,
                    photo: &photo,
                    background: background.as_ref(),
                    ink: &request.ink,
                    template: &request.template,
                    message: &request.message,
                    font: request.font.as_ref(),
                    text_color: request.text_color,
                },
                &mut shaper,
            )?
        };

        let preview = Arc::new(preview);
        if self.generation.load(Ordering::SeqCst) == generation {
            *self.current.lock() = Some(Arc::clone(&preview));
        } else {
            tracing::debug!(generation, "superseded preview not surfaced");
        }
        Ok(preview)
    }
}
