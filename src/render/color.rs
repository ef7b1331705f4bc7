/// Opaque-or-translucent 8-bit background color.
///
/// Written in configuration files as `"#RRGGBB"` or `"#RRGGBBAA"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Color {
    /// `#000000`.
    pub const BLACK: Self = Self::opaque(0, 0, 0);

    /// Fully opaque color.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Fully saturated opaque color at `hue` degrees and `lightness` in `[0, 1]`.
    ///
    /// With a high lightness this yields the pastel tones used for generated backgrounds.
    pub fn pastel(hue: f64, lightness: f64) -> Self {
        let l = lightness.clamp(0.0, 1.0);
        let sector = hue.rem_euclid(360.0) / 60.0;
        let chroma = 1.0 - (2.0 * l - 1.0).abs();
        let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
        let (r, g, b) = match sector as u8 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = l - chroma / 2.0;
        let channel = |v: f64| ((v + m).clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::opaque(channel(r), channel(g), channel(b))
    }

    /// Straight-alpha pixel.
    pub fn to_rgba8(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let digits = s.trim().trim_start_matches('#');
        if !matches!(digits.len(), 6 | 8) || !digits.bytes().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("color \"{s}\" must be #RRGGBB or #RRGGBBAA"));
        }
        let mut bytes = [255u8; 4];
        for (i, slot) in bytes.iter_mut().enumerate().take(digits.len() / 2) {
            *slot = u8::from_str_radix(&digits[2 * i..2 * i + 2], 16)
                .map_err(|e| format!("color \"{s}\": {e}"))?;
        }
        let [r, g, b, a] = bytes;
        Ok(Self { r, g, b, a })
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        if c.a == 255 {
            format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", c.r, c.g, c.b, c.a)
        }
    }
}
