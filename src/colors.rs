//! Trace colours and the colormaps used to colour overlays by stimulus.

use crate::{min_and_max, EmgError, EmgResult};
use plotters::style::RGBColor;

/// colour for traces whose stimulus is unknown
pub const BAD_COLOR: RGBColor = RGBColor(128, 128, 128);

/// colormaps offered by the GUI, every name also accepts a `_r` suffix
pub const COLORMAPS: &[&str] = &[
    "viridis",
    "plasma",
    "inferno",
    "magma",
    "cool",
    "hot",
    "spring",
    "summer",
    "autumn",
    "winter",
    "gray",
];

const NAMED: &[(&str, (u8, u8, u8))] = &[
    ("b", (0, 0, 255)),
    ("g", (0, 128, 0)),
    ("r", (255, 0, 0)),
    ("c", (0, 191, 191)),
    ("m", (191, 0, 191)),
    ("y", (191, 191, 0)),
    ("k", (0, 0, 0)),
    ("w", (255, 255, 255)),
    ("black", (0, 0, 0)),
    ("white", (255, 255, 255)),
    ("gold", (255, 215, 0)),
    ("red", (255, 0, 0)),
    ("darkred", (139, 0, 0)),
    ("crimson", (220, 20, 60)),
    ("green", (0, 128, 0)),
    ("lime", (0, 255, 0)),
    ("blue", (0, 0, 255)),
    ("navy", (0, 0, 128)),
    ("teal", (0, 128, 128)),
    ("cyan", (0, 255, 255)),
    ("magenta", (255, 0, 255)),
    ("yellow", (255, 255, 0)),
    ("orange", (255, 165, 0)),
    ("purple", (128, 0, 128)),
    ("brown", (165, 42, 42)),
    ("pink", (255, 192, 203)),
    ("silver", (192, 192, 192)),
    ("gray", (128, 128, 128)),
    ("grey", (128, 128, 128)),
    ("tab:blue", (31, 119, 180)),
    ("tab:orange", (255, 127, 14)),
    ("tab:green", (44, 160, 44)),
    ("tab:red", (214, 39, 40)),
    ("tab:purple", (148, 103, 189)),
];

type Stops = &'static [(f64, (u8, u8, u8))];

const VIRIDIS: Stops = &[
    (0.0, (68, 1, 84)),
    (0.125, (71, 44, 122)),
    (0.25, (59, 81, 139)),
    (0.375, (44, 113, 142)),
    (0.5, (33, 144, 141)),
    (0.625, (39, 173, 129)),
    (0.75, (92, 200, 99)),
    (0.875, (170, 220, 50)),
    (1.0, (253, 231, 37)),
];

const PLASMA: Stops = &[
    (0.0, (13, 8, 135)),
    (0.125, (65, 4, 157)),
    (0.25, (106, 0, 168)),
    (0.375, (143, 13, 164)),
    (0.5, (177, 42, 144)),
    (0.625, (204, 71, 120)),
    (0.75, (225, 100, 98)),
    (0.875, (248, 149, 64)),
    (1.0, (240, 249, 33)),
];

const INFERNO: Stops = &[
    (0.0, (0, 0, 4)),
    (0.125, (31, 12, 72)),
    (0.25, (85, 15, 109)),
    (0.375, (136, 34, 106)),
    (0.5, (186, 54, 85)),
    (0.625, (227, 89, 51)),
    (0.75, (249, 140, 10)),
    (0.875, (249, 201, 50)),
    (1.0, (252, 255, 164)),
];

const MAGMA: Stops = &[
    (0.0, (0, 0, 4)),
    (0.125, (28, 16, 68)),
    (0.25, (79, 18, 123)),
    (0.375, (129, 37, 129)),
    (0.5, (181, 54, 122)),
    (0.625, (229, 80, 100)),
    (0.75, (251, 135, 97)),
    (0.875, (254, 194, 135)),
    (1.0, (252, 253, 191)),
];

const COOL: Stops = &[(0.0, (0, 255, 255)), (1.0, (255, 0, 255))];
const HOT: Stops = &[
    (0.0, (11, 0, 0)),
    (0.365, (255, 0, 0)),
    (0.746, (255, 255, 0)),
    (1.0, (255, 255, 255)),
];
const SPRING: Stops = &[(0.0, (255, 0, 255)), (1.0, (255, 255, 0))];
const SUMMER: Stops = &[(0.0, (0, 128, 102)), (1.0, (255, 255, 102))];
const AUTUMN: Stops = &[(0.0, (255, 0, 0)), (1.0, (255, 255, 0))];
const WINTER: Stops = &[(0.0, (0, 0, 255)), (1.0, (0, 255, 128))];
const GRAY: Stops = &[(0.0, (0, 0, 0)), (1.0, (255, 255, 255))];

/// Parses a matplotlib-like colour: a name, a single letter or a hex string.
pub fn parse_color(s: &str) -> EmgResult<RGBColor> {
    let lower = s.trim().to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(|| invalid_color(s));
    }
    NAMED
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, (r, g, b))| RGBColor(*r, *g, *b))
        .ok_or_else(|| invalid_color(s))
}

fn parse_hex(hex: &str) -> Option<RGBColor> {
    let digits: Vec<u8> = hex
        .chars()
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<Vec<u8>>>()?;
    match digits.as_slice() {
        [r, g, b] => Some(RGBColor(r * 17, g * 17, b * 17)),
        [r1, r0, g1, g0, b1, b0] => Some(RGBColor(r1 * 16 + r0, g1 * 16 + g0, b1 * 16 + b0)),
        _ => None,
    }
}

fn invalid_color(s: &str) -> EmgError {
    EmgError::InvalidOption {
        name: "color",
        reason: format!("unknown colour '{}'", s),
    }
}

/// A piecewise linear colormap over [0, 1].
#[derive(Debug, Clone)]
pub struct Colormap {
    name: String,
    stops: Stops,
    reversed: bool,
}

impl Colormap {
    pub fn from_name(name: &str) -> EmgResult<Colormap> {
        let lower = name.trim().to_ascii_lowercase();
        let (base, reversed) = match lower.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (lower.as_str(), false),
        };
        let stops = match base {
            "viridis" => VIRIDIS,
            "plasma" => PLASMA,
            "inferno" => INFERNO,
            "magma" => MAGMA,
            "cool" => COOL,
            "hot" => HOT,
            "spring" => SPRING,
            "summer" => SUMMER,
            "autumn" => AUTUMN,
            "winter" => WINTER,
            "gray" | "grey" => GRAY,
            _ => {
                return Err(EmgError::InvalidOption {
                    name: "cmap",
                    reason: format!("unknown colormap '{}'", name),
                })
            }
        };
        Ok(Colormap {
            name: lower.clone(),
            stops,
            reversed,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// colour at x, x is clamped to [0, 1]
    pub fn at(&self, x: f64) -> RGBColor {
        let x = if x.is_nan() { 0. } else { x.clamp(0., 1.) };
        let x = if self.reversed { 1. - x } else { x };
        let upper = self
            .stops
            .iter()
            .position(|(s, _)| *s >= x)
            .unwrap_or(self.stops.len() - 1);
        if upper == 0 {
            let (_, (r, g, b)) = self.stops[0];
            return RGBColor(r, g, b);
        }
        let (s0, c0) = self.stops[upper - 1];
        let (s1, c1) = self.stops[upper];
        let p = if s1 > s0 { (x - s0) / (s1 - s0) } else { 0. };
        let lerp = |a: u8, b: u8| ((1. - p) * a as f64 + p * b as f64).round() as u8;
        RGBColor(lerp(c0.0, c1.0), lerp(c0.1, c1.1), lerp(c0.2, c1.2))
    }
}

/// Linear normalisation of stimulus values to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalize {
    pub vmin: f64,
    pub vmax: f64,
}

impl Normalize {
    pub fn new(vmin: f64, vmax: f64) -> Normalize {
        Normalize { vmin, vmax }
    }

    /// Bounds from the finite values, overridden by cmin / cmax when given.
    /// None without any bound, an error when the bounds are inverted.
    pub fn from_values(
        values: &[f64],
        cmin: Option<f64>,
        cmax: Option<f64>,
    ) -> EmgResult<Option<Normalize>> {
        let auto = min_and_max(values);
        let vmin = cmin.or(auto.map(|(lo, _)| lo));
        let vmax = cmax.or(auto.map(|(_, hi)| hi));
        let (vmin, vmax) = match (vmin, vmax) {
            (Some(lo), Some(hi)) => (lo, hi),
            _ => return Ok(None),
        };
        if vmin > vmax {
            let name = if cmin.is_some() { "cmin" } else { "cmax" };
            return Err(EmgError::InvalidOption {
                name,
                reason: format!("color range {} .. {} is inverted", vmin, vmax),
            });
        }
        Ok(Some(Normalize { vmin, vmax }))
    }

    /// a degenerate range maps everything to 0
    pub fn apply(&self, v: f64) -> f64 {
        if self.vmax == self.vmin {
            return 0.;
        }
        ((v - self.vmin) / (self.vmax - self.vmin)).clamp(0., 1.)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_and_hex_colours() {
        assert_eq!(parse_color("gold").unwrap(), RGBColor(255, 215, 0));
        assert_eq!(parse_color(" Red ").unwrap(), RGBColor(255, 0, 0));
        assert_eq!(parse_color("k").unwrap(), RGBColor(0, 0, 0));
        assert_eq!(parse_color("#ff8000").unwrap(), RGBColor(255, 128, 0));
        assert_eq!(parse_color("#0f0").unwrap(), RGBColor(0, 255, 0));
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("not-a-colour").is_err());
    }

    #[test]
    fn colormap_ends_and_reverse() {
        let v = Colormap::from_name("viridis").unwrap();
        assert_eq!(v.at(0.), RGBColor(68, 1, 84));
        assert_eq!(v.at(1.), RGBColor(253, 231, 37));
        assert_eq!(v.at(7.), RGBColor(253, 231, 37));
        let r = Colormap::from_name("viridis_r").unwrap();
        assert_eq!(r.at(0.), RGBColor(253, 231, 37));
        assert_eq!(r.at(1.), v.at(0.));
    }

    #[test]
    fn colormap_interpolates() {
        let g = Colormap::from_name("gray").unwrap();
        assert_eq!(g.at(0.5), RGBColor(128, 128, 128));
        let hot = Colormap::from_name("hot").unwrap();
        assert_eq!(hot.at(0.746), RGBColor(255, 255, 0));
    }

    #[test]
    fn every_listed_colormap_exists() {
        for name in COLORMAPS {
            assert!(Colormap::from_name(name).is_ok(), "{}", name);
        }
        assert!(Colormap::from_name("jet").is_err());
    }

    #[test]
    fn normalize_clamps_and_handles_flat_range() {
        let n = Normalize::from_values(&[1., 2., f64::NAN, 3.], None, None).unwrap().unwrap();
        assert_eq!(n, Normalize::new(1., 3.));
        assert_eq!(n.apply(2.), 0.5);
        assert_eq!(n.apply(10.), 1.);
        assert_eq!(n.apply(-10.), 0.);

        let fixed = Normalize::from_values(&[1., 3.], Some(0.), None).unwrap().unwrap();
        assert_eq!(fixed.apply(1.5), 0.5);

        let flat = Normalize::new(2., 2.);
        assert_eq!(flat.apply(2.), 0.);

        assert!(Normalize::from_values(&[f64::NAN], None, None).unwrap().is_none());
        assert!(Normalize::from_values(&[f64::NAN], Some(0.), Some(1.)).unwrap().is_some());
    }

    #[test]
    fn lone_bound_past_the_data_is_rejected() {
        match Normalize::from_values(&[1., 3.], Some(5.), None) {
            Err(EmgError::InvalidOption { name, .. }) => assert_eq!(name, "cmin"),
            other => panic!("unexpected {:?}", other),
        }
        match Normalize::from_values(&[1., 3.], None, Some(0.5)) {
            Err(EmgError::InvalidOption { name, .. }) => assert_eq!(name, "cmax"),
            other => panic!("unexpected {:?}", other),
        }
        // equal bounds are a flat range, not an error
        assert!(Normalize::from_values(&[1., 3.], Some(3.), None).is_ok());
    }

    #[test]
    fn reversed_names_are_not_listed() {
        assert!(COLORMAPS.iter().all(|name| !name.ends_with("_r")));
        assert!(Colormap::from_name("inferno_r").is_ok());
    }
}
