//! Color schemes and multi-stop interpolation engine.

/// RGB color as (r, g, b) with values in 0..=255.
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

    /// `#rrggbb`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A color stop: position in [0, 1] mapped to an RGB color.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    pub t: f64,
    pub color: Rgb,
}

impl ColorStop {
    pub const fn new(t: f64, r: u8, g: u8, b: u8) -> Self {
        Self {
            t,
            color: Rgb::new(r, g, b),
        }
    }
}

/// Available color schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorScheme {
    /// Dark blue -> White -> Dark red (trend slopes; negative is blue)
    RdBuR,
    /// Blue -> White -> Red, softer ends
    Divergent,
    /// Black -> White
    Grayscale,
    /// Pale yellow -> Green -> Deep blue (rainfall depth)
    Rainfall,
}

impl ColorScheme {
    pub const ALL: &[ColorScheme] = &[Self::RdBuR, Self::Divergent, Self::Grayscale, Self::Rainfall];

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RdBuR => "RdBu_r",
            Self::Divergent => "Divergent",
            Self::Grayscale => "Grayscale",
            Self::Rainfall => "Rainfall",
        }
    }

    /// Parse a scheme name, case-insensitive
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.name().eq_ignore_ascii_case(name))
            .or_else(|| name.eq_ignore_ascii_case("rdbur").then_some(Self::RdBuR))
    }
}

// ─── Color stop definitions ────────────────────────────────────────────

/// The 11-class ColorBrewer RdBu ramp, reversed
const RDBU_R_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 5, 48, 97),
    ColorStop::new(0.1, 33, 102, 172),
    ColorStop::new(0.2, 67, 147, 195),
    ColorStop::new(0.3, 146, 197, 222),
    ColorStop::new(0.4, 209, 229, 240),
    ColorStop::new(0.5, 247, 247, 247),
    ColorStop::new(0.6, 253, 219, 199),
    ColorStop::new(0.7, 244, 165, 130),
    ColorStop::new(0.8, 214, 96, 77),
    ColorStop::new(0.9, 178, 24, 43),
    ColorStop::new(1.0, 103, 0, 31),
];

const DIVERGENT_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 44, 62, 180),
    ColorStop::new(0.25, 120, 160, 220),
    ColorStop::new(0.50, 240, 240, 240),
    ColorStop::new(0.75, 220, 120, 80),
    ColorStop::new(1.00, 180, 30, 30),
];

/// ColorBrewer YlGnBu
const RAINFALL_STOPS: &[ColorStop] = &[
    ColorStop::new(0.000, 255, 255, 217),
    ColorStop::new(0.143, 237, 248, 177),
    ColorStop::new(0.286, 199, 233, 180),
    ColorStop::new(0.429, 127, 205, 187),
    ColorStop::new(0.571, 65, 182, 196),
    ColorStop::new(0.714, 29, 145, 192),
    ColorStop::new(0.857, 34, 94, 168),
    ColorStop::new(1.000, 12, 44, 132),
];

// ─── Interpolation engine ──────────────────────────────────────────────

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_color(c1: Rgb, c2: Rgb, t: f64) -> Rgb {
    Rgb::new(
        lerp(c1.r as f64, c2.r as f64, t).round() as u8,
        lerp(c1.g as f64, c2.g as f64, t).round() as u8,
        lerp(c1.b as f64, c2.b as f64, t).round() as u8,
    )
}

fn multi_stop(stops: &[ColorStop], t: f64) -> Rgb {
    if t <= 0.0 || t.is_nan() {
        return stops[0].color;
    }
    if t >= 1.0 {
        return stops[stops.len() - 1].color;
    }
    for i in 1..stops.len() {
        if t <= stops[i].t {
            let ratio = (t - stops[i - 1].t) / (stops[i].t - stops[i - 1].t);
            return lerp_color(stops[i - 1].color, stops[i].color, ratio);
        }
    }
    stops[stops.len() - 1].color
}

/// Evaluate a color scheme at normalized position `t` ∈ [0, 1].
///
/// Values outside the unit interval are clamped to the end colors.
pub fn evaluate(scheme: ColorScheme, t: f64) -> Rgb {
    match scheme {
        ColorScheme::RdBuR => multi_stop(RDBU_R_STOPS, t),
        ColorScheme::Divergent => multi_stop(DIVERGENT_STOPS, t),
        ColorScheme::Grayscale => {
            let v = (t.clamp(0.0, 1.0) * 255.0).round() as u8;
            Rgb::new(v, v, v)
        }
        ColorScheme::Rainfall => multi_stop(RAINFALL_STOPS, t),
    }
}
