use crate::colors::{parse_color, Colormap};
use crate::{EmgError, EmgResult, DEFAULT_STIM_COL};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// vector canvases are laid out in points
pub const VECTOR_DPI: f64 = 72.;
/// largest accepted canvas side, in pixels
pub const MAX_CANVAS_PX: f64 = 20000.;

/// Everything that controls how a figure looks.
/// Also the schema of the TOML presets loaded with `--config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotOptions {
    pub recording_index: i64,
    pub channel_index: i64,
    pub overlay: bool,
    pub stim_col: String,
    pub cmap: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmax: Option<f64>,
    pub show_colorbar: bool,
    pub color: String,
    /// in points
    pub linewidth: f64,
    /// width and height in inches
    pub figsize: (f64, f64),
    pub dpi: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmax: Option<f64>,
    pub hide_axes: bool,
    pub transparent: bool,
    pub fixed_y: bool,
    pub scale_bars: bool,
    pub create_axes: bool,
}

impl Default for PlotOptions {
    fn default() -> Self {
        PlotOptions {
            recording_index: 0,
            channel_index: 1,
            overlay: false,
            stim_col: DEFAULT_STIM_COL.to_string(),
            cmap: "viridis".to_string(),
            cmin: None,
            cmax: None,
            show_colorbar: false,
            color: "gold".to_string(),
            linewidth: 1.5,
            figsize: (10., 4.),
            dpi: 300,
            tmin: None,
            tmax: None,
            hide_axes: true,
            transparent: true,
            fixed_y: false,
            scale_bars: false,
            create_axes: false,
        }
    }
}

impl PlotOptions {
    /// Reads a TOML preset, missing keys keep their default.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> EmgResult<PlotOptions> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EmgError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        PlotOptions::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> EmgResult<PlotOptions> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml_string(&self) -> EmgResult<String> {
        toml::to_string_pretty(self).map_err(|e| EmgError::Config(e.to_string()))
    }

    pub fn validate(&self) -> EmgResult<()> {
        let invalid =
            |name: &'static str, reason: String| Err(EmgError::InvalidOption { name, reason });
        if self.dpi == 0 {
            return invalid("dpi", "must be positive".to_string());
        }
        let (w, h) = self.figsize;
        if !(w > 0. && h > 0. && w.is_finite() && h.is_finite()) {
            return invalid("figsize", format!("{} x {} is not a positive size", w, h));
        }
        if w * self.dpi as f64 > MAX_CANVAS_PX || h * self.dpi as f64 > MAX_CANVAS_PX {
            return invalid(
                "figsize",
                format!("{} x {} inches at {} dpi is too large", w, h, self.dpi),
            );
        }
        if !(self.linewidth > 0. && self.linewidth.is_finite()) {
            return invalid("linewidth", format!("{} is not positive", self.linewidth));
        }
        if let (Some(lo), Some(hi)) = (self.tmin, self.tmax) {
            if lo > hi {
                return invalid("tmin", format!("tmin {} is after tmax {}", lo, hi));
            }
        }
        if let (Some(lo), Some(hi)) = (self.cmin, self.cmax) {
            if lo > hi {
                return invalid("cmin", format!("cmin {} is above cmax {}", lo, hi));
            }
        }
        if self.stim_col.trim().is_empty() {
            return invalid("stim_col", "empty column name".to_string());
        }
        parse_color(&self.color)?;
        Colormap::from_name(&self.cmap)?;
        Ok(())
    }

    /// canvas size for the format: dpi pixels per inch for rasters, points for vectors
    pub fn canvas_size(&self, format: OutputFormat) -> (u32, u32) {
        let ppi = self.pixels_per_inch(format);
        let (w, h) = self.figsize;
        (
            ((w * ppi).round() as u32).max(1),
            ((h * ppi).round() as u32).max(1),
        )
    }

    pub fn pixels_per_inch(&self, format: OutputFormat) -> f64 {
        match format {
            OutputFormat::Png => self.dpi as f64,
            OutputFormat::Svg | OutputFormat::Pdf => VECTOR_DPI,
        }
    }

    /// Converts a length in points to canvas units.
    pub fn points(&self, format: OutputFormat, pt: f64) -> f64 {
        pt * self.pixels_per_inch(format) / 72.
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Svg,
    Pdf,
}

impl OutputFormat {
    pub fn from_path<P: AsRef<Path>>(path: P) -> EmgResult<OutputFormat> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            "pdf" => Ok(OutputFormat::Pdf),
            _ => Err(EmgError::UnsupportedFormat(ext)),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
            OutputFormat::Pdf => "pdf",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension().to_uppercase())
    }
}
