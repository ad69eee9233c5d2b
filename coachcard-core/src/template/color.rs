///! Hex color parsing shared by the card templates and the rasterizer

/// An opaque sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb` (leading `#` optional)
    pub fn parse(value: &str) -> Option<Self> {
        let digits = value.trim().trim_start_matches('#');
        let expanded = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => digits.to_string(),
            _ => return None,
        };

        let bytes = hex::decode(expanded).ok()?;
        Some(Self::new(bytes[0], bytes[1], bytes[2]))
    }

    /// Parse `value`, using `fallback` when it is not a valid hex color
    pub fn parse_or(value: &str, fallback: Rgb) -> Self {
        Self::parse(value).unwrap_or_else(|| {
            tracing::warn!("Invalid color '{}', using {}", value, fallback.to_hex());
            fallback
        })
    }

    pub fn to_hex(&self) -> String {
        format!("#{}", hex::encode([self.r, self.g, self.b]))
    }
}
