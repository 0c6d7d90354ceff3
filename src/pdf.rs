//! Single page PDF output for plotters.
//!
//! Canvas units are PDF points, the device y axis is flipped on output.
//! Text uses the built-in Helvetica font, so nothing has to be embedded;
//! its width is estimated from the font size.

use plotters_backend::text_anchor::{HPos, VPos};
use plotters_backend::{
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend, DrawingErrorKind,
    FontTransform,
};
use std::path::{Path, PathBuf};

/// average Helvetica advance as a fraction of the font size
const CHAR_WIDTH: f64 = 0.52;
/// cubic bezier handle length for a quarter circle
const KAPPA: f64 = 0.552_284_75;

pub struct PdfBackend {
    path: PathBuf,
    size: (u32, u32),
    content: String,
    saved: bool,
}

impl PdfBackend {
    pub fn new<P: AsRef<Path>>(path: P, size: (u32, u32)) -> Self {
        PdfBackend {
            path: path.as_ref().to_path_buf(),
            size,
            content: String::from("1 J 1 j\n"),
            saved: false,
        }
    }

    fn y(&self, y: f64) -> f64 {
        self.size.1 as f64 - y
    }

    fn op(&mut self, s: String) {
        self.content.push_str(&s);
        self.content.push('\n');
    }

    /// Cubic Bezier segment from the current point.
    fn curve(&mut self, points: [f64; 6]) {
        let coords: Vec<String> = points.iter().map(|v| format!("{:.2}", v)).collect();
        self.op(format!("{} c", coords.join(" ")));
    }

    fn stroke_color(&mut self, color: BackendColor, width: u32) {
        let (r, g, b) = rgb(color);
        self.op(format!("{:.3} {:.3} {:.3} RG {} w", r, g, b, width.max(1)));
    }

    fn fill_color(&mut self, color: BackendColor) {
        let (r, g, b) = rgb(color);
        self.op(format!("{:.3} {:.3} {:.3} rg", r, g, b));
    }

    fn path_ops(&mut self, points: &[BackendCoord]) {
        for (i, (x, y)) in points.iter().enumerate() {
            let op = if i == 0 { "m" } else { "l" };
            let py = self.y(*y as f64);
            self.op(format!("{} {:.2} {}", *x, py, op));
        }
    }

    /// The complete file: header, objects, xref table and trailer.
    pub fn document(&self) -> Vec<u8> {
        let (w, h) = self.size;
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>",
                w, h
            ),
            format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                self.content.len(),
                self.content
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];
        let mut out: Vec<u8> = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, obj) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, obj).as_bytes());
        }
        let xref = out.len();
        let header = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        out.extend_from_slice(header.as_bytes());
        for off in offsets {
            out.extend_from_slice(format!("{:010} 00000 n \n", off).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref
            )
            .as_bytes(),
        );
        out
    }

    fn save(&mut self) -> std::io::Result<()> {
        std::fs::write(&self.path, self.document())?;
        self.saved = true;
        Ok(())
    }
}

fn rgb(color: BackendColor) -> (f64, f64, f64) {
    let (r, g, b) = color.rgb;
    (r as f64 / 255., g as f64 / 255., b as f64 / 255.)
}

fn text_width(text: &str, size: f64) -> f64 {
    CHAR_WIDTH * size * text.chars().count() as f64
}

/// PDF literal string, latin-1 characters as octal escapes
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            _ if (160..=255).contains(&(c as u32)) => out.push_str(&format!("\\{:03o}", c as u32)),
            _ => out.push('?'),
        }
    }
    out
}

impl DrawingBackend for PdfBackend {
    type ErrorType = std::io::Error;

    fn get_size(&self) -> (u32, u32) {
        self.size
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<std::io::Error>> {
        Ok(())
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<std::io::Error>> {
        if !self.saved {
            self.save().map_err(DrawingErrorKind::DrawingError)?;
        }
        Ok(())
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<std::io::Error>> {
        if color.alpha == 0. {
            return Ok(());
        }
        self.fill_color(color);
        let y = self.y(point.1 as f64 + 1.);
        self.op(format!("{} {:.2} 1 1 re f", point.0, y));
        Ok(())
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<std::io::Error>> {
        self.draw_path(vec![from, to], style)
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<std::io::Error>> {
        if style.color().alpha == 0. {
            return Ok(());
        }
        let (x0, y0) = upper_left;
        let (x1, y1) = bottom_right;
        if fill {
            self.fill_color(style.color());
            let y = self.y(y1 as f64 + 1.);
            self.op(format!("{} {:.2} {} {} re f", x0, y, x1 - x0 + 1, y1 - y0 + 1));
        } else {
            self.stroke_color(style.color(), style.stroke_width());
            let y = self.y(y1 as f64);
            self.op(format!("{} {:.2} {} {} re S", x0, y, x1 - x0, y1 - y0));
        }
        Ok(())
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<std::io::Error>> {
        if style.color().alpha == 0. {
            return Ok(());
        }
        let points: Vec<BackendCoord> = path.into_iter().collect();
        if points.len() < 2 {
            return Ok(());
        }
        self.stroke_color(style.color(), style.stroke_width());
        self.path_ops(&points);
        self.op("S".to_string());
        Ok(())
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<std::io::Error>> {
        if style.color().alpha == 0. {
            return Ok(());
        }
        if fill {
            self.fill_color(style.color());
        } else {
            self.stroke_color(style.color(), style.stroke_width());
        }
        let (cx, cy) = (center.0 as f64, self.y(center.1 as f64));
        let r = radius as f64;
        let k = r * KAPPA;
        self.op(format!("{:.2} {:.2} m", cx + r, cy));
        self.curve([cx + r, cy + k, cx + k, cy + r, cx, cy + r]);
        self.curve([cx - k, cy + r, cx - r, cy + k, cx - r, cy]);
        self.curve([cx - r, cy - k, cx - k, cy - r, cx, cy - r]);
        self.curve([cx + k, cy - r, cx + r, cy - k, cx + r, cy]);
        self.op(if fill { "f" } else { "S" }.to_string());
        Ok(())
    }

    fn fill_polygon<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        vert: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<std::io::Error>> {
        if style.color().alpha == 0. {
            return Ok(());
        }
        let points: Vec<BackendCoord> = vert.into_iter().collect();
        if points.len() < 3 {
            return Ok(());
        }
        self.fill_color(style.color());
        self.path_ops(&points);
        self.op("h f".to_string());
        Ok(())
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<std::io::Error>> {
        let color = style.color();
        if color.alpha == 0. || text.is_empty() {
            return Ok(());
        }
        let size = style.size();
        let anchor = style.anchor();
        // offsets in text space, baseline direction first
        let dx = match anchor.h_pos {
            HPos::Left => 0.,
            HPos::Center => -text_width(text, size) / 2.,
            _ => -text_width(text, size),
        };
        let dy = match anchor.v_pos {
            VPos::Top => -0.8 * size,
            VPos::Center => -0.35 * size,
            _ => 0.,
        };
        let (a, b, c, d) = match style.transform() {
            FontTransform::Rotate90 => (0., -1., 1., 0.),
            FontTransform::Rotate180 => (-1., 0., 0., -1.),
            FontTransform::Rotate270 => (0., 1., -1., 0.),
            _ => (1., 0., 0., 1.),
        };
        let x = pos.0 as f64 + a * dx + c * dy;
        let y = self.y(pos.1 as f64) + b * dx + d * dy;
        let (r, g, bl) = rgb(color);
        self.op(format!(
            "BT /F1 {:.1} Tf {:.3} {:.3} {:.3} rg {} {} {} {} {:.2} {:.2} Tm ({}) Tj ET",
            size,
            r,
            g,
            bl,
            a,
            b,
            c,
            d,
            x,
            y,
            escape(text)
        ));
        Ok(())
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<std::io::Error>> {
        let size = style.size();
        Ok((text_width(text, size).round() as u32, size.round() as u32))
    }
}

impl Drop for PdfBackend {
    fn drop(&mut self) {
        if !self.saved {
            // drop cannot report the error, present() should be called to see it
            let _ = self.save();
        }
    }
}
