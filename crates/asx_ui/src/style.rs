//! Colours and the neon HUD theme.
//!
//! Dark translucent panels, cyan borders, green accents. Everything is
//! emitted as CSS strings for inline `style` attributes.

use std::fmt::Write as _;

use bytemuck::{Pod, Zeroable};

/// RGBA colour, components in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Color {
    /// Red component.
    pub r: f32,
    /// Green component.
    pub g: f32,
    /// Blue component.
    pub b: f32,
    /// Alpha component.
    pub a: f32,
}

impl Color {
    /// Transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);
    /// Neon cyan, the primary accent.
    pub const CYAN: Self = Self::hex(0x00FF_FFFF);
    /// Dimmed cyan for body copy.
    pub const CYAN_DIM: Self = Self::hex(0x00CC_CCFF);
    /// Terminal green.
    pub const GREEN: Self = Self::hex(0x00FF_00FF);
    /// Warning yellow.
    pub const YELLOW: Self = Self::hex(0xFFFF_00FF);
    /// Alarm red.
    pub const RED: Self = Self::hex(0xFF00_00FF);
    /// Pale red for error copy.
    pub const RED_PALE: Self = Self::hex(0xFFCC_CCFF);

    /// Creates a colour from RGBA values.
    #[must_use]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque colour.
    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// Creates a colour from `0xRRGGBBAA`.
    #[must_use]
    pub const fn hex(hex: u32) -> Self {
        let r = ((hex >> 24) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let b = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let a = (hex & 0xFF) as f32 / 255.0;
        Self::rgba(r, g, b, a)
    }

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa`.
    #[must_use]
    pub fn parse_hex(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('#')?;
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).chain("ff".chars()).collect(),
            6 => format!("{digits}ff"),
            8 => digits.to_string(),
            _ => return None,
        };
        u32::from_str_radix(&expanded, 16).ok().map(Self::hex)
    }

    /// Returns the colour with a different alpha.
    #[must_use]
    pub const fn with_alpha(self, a: f32) -> Self {
        Self::rgba(self.r, self.g, self.b, a)
    }

    /// Linear interpolation.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::rgba(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }

    /// Converts to array format.
    #[must_use]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// CSS form: `#rrggbb` when opaque, `rgba(r, g, b, a)` otherwise.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn css(self) -> String {
        let [r, g, b] = [self.r, self.g, self.b].map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        if (self.a - 1.0).abs() < f32::EPSILON {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("rgba({r}, {g}, {b}, {})", (self.a * 100.0).round() / 100.0)
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::CYAN
    }
}

/// Builds an inline `style` attribute value from declarations.
///
/// ```rust,ignore
/// assert_eq!(inline(&[("padding", "20px"), ("color", "#00ffff")]), "padding: 20px; color: #00ffff;");
/// ```
#[must_use]
pub fn inline(declarations: &[(&str, &str)]) -> String {
    let mut out = String::new();
    for (i, (name, value)) in declarations.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{name}: {value};");
    }
    out
}

/// HUD theme.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Panel fill.
    pub panel: Color,
    /// Nested item fill.
    pub inset: Color,
    /// Borders and headings.
    pub primary: Color,
    /// Body copy.
    pub text: Color,
    /// Prices, success states, sidebar headings.
    pub accent: Color,
    /// System messages and status panels.
    pub warning: Color,
    /// Error borders and headings.
    pub error: Color,
    /// Error body copy.
    pub error_text: Color,
    /// Error panel fill.
    pub error_panel: Color,
    /// Heading font stack.
    pub display_font: &'static str,
}

impl Theme {
    /// Cyan-on-black terminal look.
    pub const NEON: Self = Self {
        panel: Color::rgba(0.0, 20.0 / 255.0, 20.0 / 255.0, 0.9),
        inset: Color::rgba(0.0, 40.0 / 255.0, 40.0 / 255.0, 0.5),
        primary: Color::CYAN,
        text: Color::CYAN_DIM,
        accent: Color::GREEN,
        warning: Color::YELLOW,
        error: Color::RED,
        error_text: Color::RED_PALE,
        error_panel: Color::rgba(50.0 / 255.0, 0.0, 0.0, 0.95),
        display_font: "'Orbitron', monospace",
    };

    /// Clip path that cuts the bottom-right corner of a card.
    #[must_use]
    pub fn notch(size_px: u32) -> String {
        format!(
            "polygon(0 0, 100% 0, 100% calc(100% - {size_px}px), calc(100% - {size_px}px) 100%, 0 100%)"
        )
    }

    /// Glow shadow in the given colour.
    #[must_use]
    pub fn glow(color: Color, radius_px: u32, strength: f32) -> String {
        format!("0 0 {radius_px}px {}", color.with_alpha(strength).css())
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::NEON
    }
}
