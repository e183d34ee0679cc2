use crate::value_objects::color::Rgb;

pub const DEFAULT_PALETTE: [Rgb; 18] = [
    Rgb::new(0xFF, 0x57, 0x33),
    Rgb::new(0x33, 0xFF, 0x57),
    Rgb::new(0x33, 0x57, 0xFF),
    Rgb::new(0xF3, 0x9C, 0x12),
    Rgb::new(0x8E, 0x44, 0xAD),
    Rgb::new(0x1A, 0xBC, 0x9C),
    Rgb::new(0xE7, 0x4C, 0x3C),
    Rgb::new(0x2E, 0xCC, 0x71),
    Rgb::new(0x34, 0x98, 0xDB),
    Rgb::new(0x9B, 0x59, 0xB6),
    Rgb::new(0xE6, 0x7E, 0x22),
    Rgb::new(0x16, 0xA0, 0x85),
    Rgb::new(0xC0, 0x39, 0x2B),
    Rgb::new(0x27, 0xAE, 0x60),
    Rgb::new(0x29, 0x80, 0xB9),
    Rgb::new(0x8E, 0x44, 0xAD),
    Rgb::new(0xD3, 0x54, 0x00),
    Rgb::new(0x2C, 0x3E, 0x50),
];

/// Round-robin color source. Wraps after the last color.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    colors: Vec<Rgb>,
    next: usize,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_PALETTE.to_vec(),
            next: 0,
        }
    }
}

impl ColorPalette {
    pub fn new(colors: Vec<Rgb>) -> Result<Self, String> {
        if colors.is_empty() {
            return Err("color palette must not be empty".to_string());
        }
        Ok(Self { colors, next: 0 })
    }

    pub fn from_hex_list<S: AsRef<str>>(raw: &[S]) -> Result<Self, String> {
        let colors = raw
            .iter()
            .map(|hex| {
                Rgb::from_hex(hex.as_ref())
                    .ok_or_else(|| format!("invalid palette color: {}", hex.as_ref()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(colors)
    }

    pub fn next_color(&mut self) -> Rgb {
        let color = self.colors[self.next % self.colors.len()];
        self.next += 1;
        color
    }

    pub fn assigned(&self) -> usize {
        self.next
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}
