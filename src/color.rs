use once_cell::sync::Lazy;
use regex::Regex;

/// An RGBA color with all four channels stored as doubles in `[0, 1]`.
///
/// The `rgba`/`rgb` expression builders normalize their 0-255 RGB inputs
/// into this range; alpha is taken as-is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

static FUNCTIONAL_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(rgb|rgba|hsl|hsla)\(\s*([^)]*)\)$").unwrap()
});

impl Color {
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    pub fn white() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }

    /// Parses a CSS color string: hex (`#rgb`, `#rgba`, `#rrggbb`,
    /// `#rrggbbaa`), functional `rgb()`/`rgba()`/`hsl()`/`hsla()` forms, and
    /// named colors.
    pub fn parse(input: &str) -> Option<Color> {
        let s = input.trim().to_ascii_lowercase();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(caps) = FUNCTIONAL_FORM.captures(&s) {
            let name = caps.get(1)?.as_str();
            let args: Vec<&str> = caps
                .get(2)?
                .as_str()
                .split(',')
                .map(str::trim)
                .collect();
            return parse_functional(name, &args);
        }
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, [r, g, b, a])| {
                Color::new(
                    f64::from(*r) / 255.0,
                    f64::from(*g) / 255.0,
                    f64::from(*b) / 255.0,
                    f64::from(*a),
                )
            })
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let digits: Vec<u32> = hex.chars().map(|c| c.to_digit(16)).collect::<Option<_>>()?;
    let (r, g, b, a) = match digits.as_slice() {
        [r, g, b] => (r * 17, g * 17, b * 17, 255),
        [r, g, b, a] => (r * 17, g * 17, b * 17, a * 17),
        [r1, r0, g1, g0, b1, b0] => (r1 * 16 + r0, g1 * 16 + g0, b1 * 16 + b0, 255),
        [r1, r0, g1, g0, b1, b0, a1, a0] => {
            (r1 * 16 + r0, g1 * 16 + g0, b1 * 16 + b0, a1 * 16 + a0)
        }
        _ => return None,
    };
    Some(Color::new(
        f64::from(r) / 255.0,
        f64::from(g) / 255.0,
        f64::from(b) / 255.0,
        f64::from(a) / 255.0,
    ))
}

fn parse_functional(name: &str, args: &[&str]) -> Option<Color> {
    let expects_alpha = name.ends_with('a');
    if args.len() != if expects_alpha { 4 } else { 3 } {
        return None;
    }

    let alpha = if expects_alpha {
        let a: f64 = args[3].parse().ok()?;
        a.clamp(0.0, 1.0)
    } else {
        1.0
    };

    if name.starts_with("rgb") {
        let mut channels = [0.0f64; 3];
        for (out, raw) in channels.iter_mut().zip(args) {
            let v = if let Some(pct) = raw.strip_suffix('%') {
                pct.parse::<f64>().ok()? * 255.0 / 100.0
            } else {
                raw.parse::<f64>().ok()?
            };
            *out = (v / 255.0).clamp(0.0, 1.0);
        }
        Some(Color::new(channels[0], channels[1], channels[2], alpha))
    } else {
        let h: f64 = args[0].parse().ok()?;
        let s: f64 = args[1].strip_suffix('%')?.parse::<f64>().ok()? / 100.0;
        let l: f64 = args[2].strip_suffix('%')?.parse::<f64>().ok()? / 100.0;
        let (r, g, b) = hsl_to_rgb(h.rem_euclid(360.0), s.clamp(0.0, 1.0), l.clamp(0.0, 1.0));
        Some(Color::new(r, g, b, alpha))
    }
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    (r1 + m, g1 + m, b1 + m)
}

// Channel triples are the CSS keyword values; alpha is 0 only for
// "transparent".
const NAMED_COLORS: &[(&str, [u8; 4])] = &[
    ("aqua", [0, 255, 255, 1]),
    ("black", [0, 0, 0, 1]),
    ("blue", [0, 0, 255, 1]),
    ("cyan", [0, 255, 255, 1]),
    ("fuchsia", [255, 0, 255, 1]),
    ("gray", [128, 128, 128, 1]),
    ("green", [0, 128, 0, 1]),
    ("grey", [128, 128, 128, 1]),
    ("lime", [0, 255, 0, 1]),
    ("magenta", [255, 0, 255, 1]),
    ("maroon", [128, 0, 0, 1]),
    ("navy", [0, 0, 128, 1]),
    ("olive", [128, 128, 0, 1]),
    ("orange", [255, 165, 0, 1]),
    ("purple", [128, 0, 128, 1]),
    ("red", [255, 0, 0, 1]),
    ("silver", [192, 192, 192, 1]),
    ("teal", [0, 128, 128, 1]),
    ("transparent", [0, 0, 0, 0]),
    ("white", [255, 255, 255, 1]),
    ("yellow", [255, 255, 0, 1]),
];
