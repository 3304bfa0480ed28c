use crate::common::PaletteError;
use std::fmt;

/// Brightness below this value selects the dark variant
pub const DARK_BRIGHTNESS_THRESHOLD: u32 = 128;

/// Dark or light branch of theming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    pub const ALL: [ThemeVariant; 2] = [ThemeVariant::Dark, ThemeVariant::Light];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeVariant::Dark => "dark",
            ThemeVariant::Light => "light",
        }
    }
}

impl fmt::Display for ThemeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seed color read from the first line of the palette cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteState {
    hex_color: String,
}

impl PaletteState {
    pub fn new(hex_color: impl Into<String>) -> Self {
        Self {
            hex_color: hex_color.into(),
        }
    }

    pub fn hex_color(&self) -> &str {
        &self.hex_color
    }

    pub fn rgb(&self) -> Result<(u8, u8, u8), PaletteError> {
        parse_hex_color(&self.hex_color)
    }

    /// Variant for this color; malformed input falls back to [`ThemeVariant::Dark`]
    pub fn variant(&self) -> ThemeVariant {
        match self.rgb() {
            Ok((r, g, b)) => variant_for_rgb(r, g, b),
            Err(e) => {
                log::warn!("{e}, defaulting to dark theme");
                ThemeVariant::Dark
            }
        }
    }
}

/// Parse `rrggbb` or `#rrggbb` into byte components
pub fn parse_hex_color(hex: &str) -> Result<(u8, u8, u8), PaletteError> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(PaletteError::InvalidLength(hex.to_string()));
    }

    let component = |range: std::ops::Range<usize>, name: &'static str| {
        let pair = &digits[range];
        // from_str_radix would accept a leading '+'
        pair.bytes()
            .all(|b| b.is_ascii_hexdigit())
            .then(|| u8::from_str_radix(pair, 16).ok())
            .flatten()
            .ok_or_else(|| PaletteError::InvalidComponent {
                component: name,
                value: hex.to_string(),
            })
    };

    Ok((
        component(0..2, "red")?,
        component(2..4, "green")?,
        component(4..6, "blue")?,
    ))
}

/// Perceived brightness scaled by 1000: `R*299 + G*587 + B*114`.
///
/// Kept scaled so the threshold comparison needs no rounding.
pub fn brightness_millis(r: u8, g: u8, b: u8) -> u32 {
    u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114
}

/// Fixed perceptual-luminance threshold: dark iff brightness < 128
pub fn variant_for_rgb(r: u8, g: u8, b: u8) -> ThemeVariant {
    if brightness_millis(r, g, b) < DARK_BRIGHTNESS_THRESHOLD * 1000 {
        ThemeVariant::Dark
    } else {
        ThemeVariant::Light
    }
}
