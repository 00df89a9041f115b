use crate::error::{PostcraftError, PostcraftResult};

/// Straight-alpha RGBA8 color.
///
/// Also serves as the parley text brush (parley's `Brush` bound is satisfied
/// by any `Clone + PartialEq + Default + Debug` type).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BLACK: Rgba8 = Rgba8::opaque(0, 0, 0);
    pub const WHITE: Rgba8 = Rgba8::opaque(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
    pub fn from_hex(s: &str) -> PostcraftResult<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        let channel = |i: usize| -> PostcraftResult<u8> {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| PostcraftError::validation(format!("invalid hex color '{s}'")))
        };
        match hex.len() {
            6 => Ok(Self::opaque(channel(0)?, channel(2)?, channel(4)?)),
            8 => Ok(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => Err(PostcraftError::validation(format!(
                "invalid hex color '{s}' (expected #rrggbb or #rrggbbaa)"
            ))),
        }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Premultiplied RGBA8 form, matching the raster pixel contract.
    pub fn to_premul(self) -> [u8; 4] {
        let a = u16::from(self.a);
        let premul = |c: u8| -> u8 { ((u16::from(c) * a + 127) / 255) as u8 };
        [premul(self.r), premul(self.g), premul(self.b), self.a]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rgb_and_rgba_hex() {
        assert_eq!(Rgba8::from_hex("#000000").unwrap(), Rgba8::BLACK);
        assert_eq!(Rgba8::from_hex("cccccc").unwrap(), Rgba8::opaque(0xcc, 0xcc, 0xcc));
        assert_eq!(
            Rgba8::from_hex("#ff000080").unwrap(),
            Rgba8::new(255, 0, 0, 0x80)
        );
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(Rgba8::from_hex("#12345").is_err());
        assert!(Rgba8::from_hex("#zzzzzz").is_err());
    }

    #[test]
    fn premul_scales_color_channels() {
        let px = Rgba8::new(255, 0, 100, 128).to_premul();
        assert_eq!(px, [128, 0, ((100u16 * 128 + 127) / 255) as u8, 128]);
        assert_eq!(Rgba8::WHITE.to_premul(), [255, 255, 255, 255]);
        assert_eq!(Rgba8::new(10, 20, 30, 0).to_premul(), [0, 0, 0, 0]);
    }
}
