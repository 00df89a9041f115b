use crate::{
    color::Rgba8,
    error::{PostcraftError, PostcraftResult},
};

/// Active drawing mode. Mutually exclusive; "no tool" is the absence of a
/// value (`Option<Tool>`), under which pointer input is a no-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    Pencil,
    Highlighter,
    Eraser,
}

/// Named geometry configuration for composing the two card faces into one
/// output image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutPreset {
    Horizontal,
    Vertical,
    Square,
    #[serde(rename = "rotated-with-background")]
    RotatedBackground,
}

impl LayoutPreset {
    pub const ALL: [LayoutPreset; 4] = [
        LayoutPreset::Horizontal,
        LayoutPreset::Vertical,
        LayoutPreset::Square,
        LayoutPreset::RotatedBackground,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LayoutPreset::Horizontal => "horizontal",
            LayoutPreset::Vertical => "vertical",
            LayoutPreset::Square => "square",
            LayoutPreset::RotatedBackground => "rotated-with-background",
        }
    }

    /// Resolve a preset id. Unknown names fall back to the default
    /// ([`LayoutPreset::Horizontal`]) rather than failing.
    pub fn from_name(name: &str) -> Self {
        match name {
            "horizontal" => LayoutPreset::Horizontal,
            "vertical" => LayoutPreset::Vertical,
            "square" => LayoutPreset::Square,
            "rotated-with-background" => LayoutPreset::RotatedBackground,
            other => {
                tracing::warn!(preset = other, "unknown layout preset, using horizontal");
                LayoutPreset::Horizontal
            }
        }
    }
}

/// Inputs for one postcard composition, as consumed by the CLI.
///
/// Paths are resolved relative to the spec file's directory.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PostcardSpec {
    /// Uploaded front photo.
    pub photo: String,
    /// Backdrop photo, required by the rotated-with-background preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Back-face message text; may contain explicit line breaks.
    #[serde(default)]
    pub message: String,
    /// Font file for the message text, required when the message is
    /// non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    /// Message text color as a hex string.
    #[serde(default = "default_text_color")]
    pub text_color: String,
    /// Layout preset name; unknown names fall back to horizontal.
    #[serde(default = "default_preset")]
    pub preset: String,
}

fn default_text_color() -> String {
    "#000000".to_string()
}

fn default_preset() -> String {
    "horizontal".to_string()
}

impl PostcardSpec {
    pub fn validate(&self) -> PostcraftResult<()> {
        if self.photo.trim().is_empty() {
            return Err(PostcraftError::validation("photo path must be non-empty"));
        }
        if !self.message.trim().is_empty() && self.font.is_none() {
            return Err(PostcraftError::validation(
                "a font is required when message text is set",
            ));
        }
        Rgba8::from_hex(&self.text_color)?;
        if LayoutPreset::from_name(&self.preset) == LayoutPreset::RotatedBackground
            && self.background.is_none()
        {
            return Err(PostcraftError::validation(
                "the rotated-with-background preset requires a background image",
            ));
        }
        Ok(())
    }

    pub fn preset(&self) -> LayoutPreset {
        LayoutPreset::from_name(&self.preset)
    }

    pub fn text_color(&self) -> PostcraftResult<Rgba8> {
        Rgba8::from_hex(&self.text_color)
    }
}
