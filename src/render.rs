//! From a loaded table to a figure on disk.

use crate::colors::{parse_color, Colormap, Normalize, BAD_COLOR};
use crate::error::render_err;
use crate::linspace::Linspace;
use crate::pdf::PdfBackend;
use crate::{
    min_and_max, nice_number, EmgError, EmgResult, EmgTable, OutputFormat, PlotOptions, Trace,
};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters_backend::text_anchor::{HPos, Pos, VPos};
use plotters_backend::FontTransform;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// fraction of the data span added on each side, as matplotlib does
const MARGIN: f64 = 0.05;
/// scale bars are about this fraction of the span
const SCALE_BAR_FRACTION: f64 = 0.2;
const COLORBAR_STRIPES: u64 = 128;

#[derive(Debug, Clone)]
pub struct StyledTrace {
    pub trace: Trace,
    pub color: RGBColor,
}

#[derive(Debug, Clone)]
pub struct Colorbar {
    pub cmap: Colormap,
    pub norm: Normalize,
    pub label: String,
}

/// Lengths of the L-shaped calibration bars, in data units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleBars {
    pub time: f64,
    pub amplitude: f64,
}

/// Plot-ready figure: styled traces and the ranges they are drawn in.
#[derive(Debug, Clone)]
pub struct Figure {
    pub traces: Vec<StyledTrace>,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub colorbar: Option<Colorbar>,
    pub scale_bars: Option<ScaleBars>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    /// the figure first, then the axes file if any
    pub files: Vec<PathBuf>,
    pub series: usize,
    pub size: (u32, u32),
    pub format: OutputFormat,
}

impl Figure {
    /// Applies the options to the table: channel and time filtering,
    /// colours, ranges, colorbar and scale bars.
    pub fn build(table: &EmgTable, opts: &PlotOptions) -> EmgResult<Figure> {
        opts.validate()?;
        let channel = opts.channel_index;
        let channel_traces = table.traces(channel, opts.tmin, opts.tmax);
        if channel_traces.is_empty() {
            return Err(EmgError::NoData {
                channel,
                recording: None,
            });
        }

        let mut colorbar = None;
        let traces: Vec<StyledTrace> = if opts.overlay {
            if !table.has_stimulus() {
                return Err(EmgError::MissingColumn(opts.stim_col.clone()));
            }
            let cmap = Colormap::from_name(&opts.cmap)?;
            let stims: Vec<f64> = channel_traces.iter().map(|t| t.stimulus).collect();
            let norm = Normalize::from_values(&stims, opts.cmin, opts.cmax)?
                .unwrap_or(Normalize::new(0., 1.));
            debug!("overlay of {} recordings, norm {:?}", channel_traces.len(), norm);
            let styled = channel_traces
                .iter()
                .map(|t| {
                    let color = if t.stimulus.is_nan() {
                        warn!("recording {} has no stimulus value", t.recording);
                        BAD_COLOR
                    } else {
                        cmap.at(norm.apply(t.stimulus))
                    };
                    StyledTrace {
                        trace: t.clone(),
                        color,
                    }
                })
                .collect();
            if opts.show_colorbar {
                colorbar = Some(Colorbar {
                    cmap,
                    norm,
                    label: opts.stim_col.clone(),
                });
            }
            styled
        } else {
            let trace = channel_traces
                .iter()
                .find(|t| t.recording == opts.recording_index)
                .cloned()
                .ok_or(EmgError::NoData {
                    channel,
                    recording: Some(opts.recording_index),
                })?;
            vec![StyledTrace {
                trace,
                color: parse_color(&opts.color)?,
            }]
        };

        let all_time: Vec<f64> = traces.iter().flat_map(|t| t.trace.time.iter().copied()).collect();
        let (dmin, dmax) = min_and_max(&all_time).unwrap_or((0., 1.));
        let x_range = if opts.tmin.is_some() || opts.tmax.is_some() {
            widen(opts.tmin.unwrap_or(dmin), opts.tmax.unwrap_or(dmax))
        } else {
            padded(dmin, dmax)
        };

        let y_source: Vec<f64> = if opts.fixed_y {
            channel_traces.iter().flat_map(|t| t.amplitude.iter().copied()).collect()
        } else {
            traces.iter().flat_map(|t| t.trace.amplitude.iter().copied()).collect()
        };
        let y_range = match min_and_max(&y_source) {
            Some((lo, hi)) => padded(lo, hi),
            None => (-1., 1.),
        };
        debug!("x range {:?}, y range {:?}", x_range, y_range);

        let scale_bars = if opts.scale_bars {
            Some(ScaleBars {
                time: nice_number(SCALE_BAR_FRACTION * (x_range.1 - x_range.0)),
                amplitude: nice_number(SCALE_BAR_FRACTION * (y_range.1 - y_range.0)),
            })
        } else {
            None
        };

        Ok(Figure {
            traces,
            x_range,
            y_range,
            colorbar,
            scale_bars,
        })
    }

    /// number of plotted recordings
    pub fn series_count(&self) -> usize {
        self.traces.len()
    }

    /// Writes the figure in the format given by the extension of `fout`,
    /// plus `<stem>_axes.svg` when asked for.
    pub fn save<P: AsRef<Path>>(&self, opts: &PlotOptions, fout: P) -> EmgResult<RenderReport> {
        let fout = fout.as_ref();
        let format = OutputFormat::from_path(fout)?;
        let size = opts.canvas_size(format);
        match format {
            OutputFormat::Png => self.save_png(opts, fout, size)?,
            OutputFormat::Svg => {
                let root = SVGBackend::new(fout, size).into_drawing_area();
                self.draw_on(&root, opts, format)?;
                root.present().map_err(render_err)?;
            }
            OutputFormat::Pdf => {
                let root = PdfBackend::new(fout, size).into_drawing_area();
                self.draw_on(&root, opts, format)?;
                root.present().map_err(render_err)?;
            }
        }
        info!("Saved EMG trace to {}", fout.display());
        let mut files = vec![fout.to_path_buf()];
        if opts.create_axes {
            let axes = axes_path(fout);
            self.save_axes_svg(opts, &axes)?;
            info!("Saved axes to {}", axes.display());
            files.push(axes);
        }
        Ok(RenderReport {
            files,
            series: self.series_count(),
            size,
            format,
        })
    }

    fn save_png(&self, opts: &PlotOptions, fout: &Path, size: (u32, u32)) -> EmgResult<()> {
        let (w, h) = size;
        let on_white = self.render_rgb(opts, OutputFormat::Png, size, &WHITE)?;
        if !opts.transparent {
            image::save_buffer(fout, &on_white, w, h, image::ColorType::Rgb8).map_err(render_err)?;
            return Ok(());
        }
        let on_black = self.render_rgb(opts, OutputFormat::Png, size, &BLACK)?;
        let rgba = matte(&on_white, &on_black);
        image::save_buffer(fout, &rgba, w, h, image::ColorType::Rgba8).map_err(render_err)?;
        Ok(())
    }

    fn render_rgb(
        &self,
        opts: &PlotOptions,
        format: OutputFormat,
        size: (u32, u32),
        background: &RGBColor,
    ) -> EmgResult<Vec<u8>> {
        let mut buf = vec![0u8; size.0 as usize * size.1 as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buf, size).into_drawing_area();
            root.fill(background).map_err(render_err)?;
            self.draw_traces_and_decorations(&root, opts, format)?;
            root.present().map_err(render_err)?;
        }
        Ok(buf)
    }

    /// Opaque RGBA rendering on white at the given resolution, for previews.
    pub fn render_rgba(&self, opts: &PlotOptions, dpi: u32) -> EmgResult<(u32, u32, Vec<u8>)> {
        let opts = PlotOptions {
            dpi,
            ..opts.clone()
        };
        opts.validate()?;
        let size = opts.canvas_size(OutputFormat::Png);
        let rgb = self.render_rgb(&opts, OutputFormat::Png, size, &WHITE)?;
        let mut rgba = Vec::with_capacity(rgb.len() / 3 * 4);
        for px in rgb.chunks_exact(3) {
            rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
        }
        Ok((size.0, size.1, rgba))
    }

    /// vector backends: the background is only filled when not transparent
    fn draw_on<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        opts: &PlotOptions,
        format: OutputFormat,
    ) -> EmgResult<()> {
        if !opts.transparent {
            root.fill(&WHITE).map_err(render_err)?;
        }
        self.draw_traces_and_decorations(root, opts, format)
    }

    fn draw_traces_and_decorations<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        opts: &PlotOptions,
        format: OutputFormat,
    ) -> EmgResult<()> {
        match &self.colorbar {
            Some(cb) => {
                let (w, _) = root.dim_in_pixel();
                let bar_w = colorbar_width(opts, format).min(w / 2);
                let (left, right) = root.split_horizontally(w as i32 - bar_w as i32);
                self.draw_chart(&left, opts, format)?;
                draw_colorbar(&right, cb, opts, format)
            }
            None => self.draw_chart(root, opts, format),
        }
    }

    fn draw_chart<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        opts: &PlotOptions,
        format: OutputFormat,
    ) -> EmgResult<()> {
        let px = |pt: f64| opts.points(format, pt);
        let (x0, x1) = self.x_range;
        let (y0, y1) = self.y_range;
        let stroke = px(opts.linewidth).round().max(1.) as u32;
        let font_size = px(10.);

        let mut builder = ChartBuilder::on(area);
        if !opts.hide_axes {
            builder
                .margin(px(8.) as i32)
                .x_label_area_size(px(30.) as i32)
                .y_label_area_size(px(45.) as i32);
        }
        let mut chart = builder
            .build_cartesian_2d(x0..x1, y0..y1)
            .map_err(render_err)?;

        if !opts.hide_axes {
            chart
                .configure_mesh()
                .disable_mesh()
                .set_all_tick_mark_size(px(3.) as i32)
                .label_style(("sans-serif", font_size))
                .axis_desc_style(("sans-serif", font_size))
                .x_desc("time [ms]")
                .y_desc("amplitude [mV]")
                .x_labels(8)
                .y_labels(6)
                .draw()
                .map_err(render_err)?;
        }

        for st in self.traces.iter() {
            for segment in st.trace.segments() {
                chart
                    .draw_series(LineSeries::new(segment, st.color.stroke_width(stroke)))
                    .map_err(render_err)?;
            }
        }

        if let Some(bars) = &self.scale_bars {
            let xspan = x1 - x0;
            let yspan = y1 - y0;
            let cx = x1 - 0.04 * xspan;
            let cy = y0 + 0.06 * yspan;
            chart
                .draw_series(LineSeries::new(
                    vec![(cx - bars.time, cy), (cx, cy), (cx, cy + bars.amplitude)],
                    BLACK.stroke_width(stroke),
                ))
                .map_err(render_err)?;
            let style = ("sans-serif", font_size).into_font().color(&BLACK);
            chart
                .draw_series(vec![
                    Text::new(
                        format!("{} ms", bars.time),
                        (cx - bars.time / 2., cy - 0.01 * yspan),
                        style.pos(Pos::new(HPos::Center, VPos::Top)),
                    ),
                    Text::new(
                        format!("{} mV", bars.amplitude),
                        (cx + 0.005 * xspan, cy + bars.amplitude / 2.),
                        style.pos(Pos::new(HPos::Left, VPos::Center)),
                    ),
                ])
                .map_err(render_err)?;
        }
        Ok(())
    }

    /// The axes alone, as an SVG whose inner rectangle has the size of the
    /// bare trace figure, so that the two can be stacked in an editor.
    pub fn save_axes_svg<P: AsRef<Path>>(&self, opts: &PlotOptions, fout: P) -> EmgResult<()> {
        let format = OutputFormat::Svg;
        let px = |pt: f64| opts.points(format, pt);
        let (w, h) = opts.canvas_size(format);
        let plot_w = match self.colorbar {
            Some(_) => w - colorbar_width(opts, format).min(w / 2),
            None => w,
        };
        let (ml, mr, mt, mb) = (px(55.) as i32, px(10.) as i32, px(10.) as i32, px(40.) as i32);
        let size = ((w as i32 + ml + mr) as u32, (h as i32 + mt + mb) as u32);
        let root = SVGBackend::new(fout.as_ref(), size).into_drawing_area();

        let (x0, x1) = self.x_range;
        let (y0, y1) = self.y_range;
        let to_px = |x: f64, y: f64| -> (i32, i32) {
            (
                ml + ((x - x0) / (x1 - x0) * plot_w as f64).round() as i32,
                mt + ((y1 - y) / (y1 - y0) * h as f64).round() as i32,
            )
        };
        let line = BLACK.stroke_width(px(1.).round().max(1.) as u32);
        let tick = px(4.) as i32;
        let font_size = px(10.);
        let font = ("sans-serif", font_size).into_font().color(&BLACK);
        let draw = |e: &PathElement<(i32, i32)>| root.draw(e).map_err(render_err);

        let origin = to_px(x0, y0);
        draw(&PathElement::new(vec![to_px(x0, y1), origin, to_px(x1, y0)], line))?;

        for x in Linspace::multiples(x0, x1, nice_number((x1 - x0) / 6.)) {
            let (tx, ty) = to_px(x, y0);
            draw(&PathElement::new(vec![(tx, ty), (tx, ty + tick)], line))?;
            root.draw(&Text::new(
                tick_label(x),
                (tx, ty + tick + 2),
                font.pos(Pos::new(HPos::Center, VPos::Top)),
            ))
            .map_err(render_err)?;
        }
        for y in Linspace::multiples(y0, y1, nice_number((y1 - y0) / 5.)) {
            let (tx, ty) = to_px(x0, y);
            draw(&PathElement::new(vec![(tx, ty), (tx - tick, ty)], line))?;
            root.draw(&Text::new(
                tick_label(y),
                (tx - tick - 2, ty),
                font.pos(Pos::new(HPos::Right, VPos::Center)),
            ))
            .map_err(render_err)?;
        }

        let bottom = mt + h as i32;
        root.draw(&Text::new(
            "time [ms]",
            (ml + plot_w as i32 / 2, bottom + mb - 2),
            font.pos(Pos::new(HPos::Center, VPos::Bottom)),
        ))
        .map_err(render_err)?;
        root.draw(&Text::new(
            "amplitude [mV]",
            (2, mt + h as i32 / 2),
            font.pos(Pos::new(HPos::Center, VPos::Top))
                .transform(FontTransform::Rotate270),
        ))
        .map_err(render_err)?;
        root.present().map_err(render_err)?;
        Ok(())
    }
}

fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    cb: &Colorbar,
    opts: &PlotOptions,
    format: OutputFormat,
) -> EmgResult<()> {
    let px = |pt: f64| opts.points(format, pt);
    let (w, h) = area.dim_in_pixel();
    let (w, h) = (w as i32, h as i32);
    let bar_x0 = px(6.) as i32;
    let bar_x1 = bar_x0 + px(12.) as i32;
    let bar_y0 = px(10.) as i32;
    let bar_y1 = (h - px(10.) as i32).max(bar_y0 + 1);
    let bar_h = (bar_y1 - bar_y0) as f64;

    for v in Linspace::half_open(0., 1., COLORBAR_STRIPES) {
        let top = bar_y1 - ((v + 1. / COLORBAR_STRIPES as f64) * bar_h).round() as i32;
        let bottom = bar_y1 - (v * bar_h).round() as i32;
        area.draw(&Rectangle::new(
            [(bar_x0, top), (bar_x1, bottom)],
            cb.cmap.at(v).filled(),
        ))
        .map_err(render_err)?;
    }
    area.draw(&Rectangle::new(
        [(bar_x0, bar_y0), (bar_x1, bar_y1)],
        BLACK.stroke_width(1),
    ))
    .map_err(render_err)?;

    let font = ("sans-serif", px(9.)).into_font().color(&BLACK);
    let ticks = [(cb.norm.vmin, bar_y1), (cb.norm.vmax, bar_y0)];
    for (value, y) in ticks.iter() {
        area.draw(&Text::new(
            format!("{:.2}", value),
            (bar_x1 + px(3.) as i32, *y),
            font.pos(Pos::new(HPos::Left, VPos::Center)),
        ))
        .map_err(render_err)?;
    }
    area.draw(&Text::new(
        cb.label.clone(),
        (w - px(2.) as i32, (bar_y0 + bar_y1) / 2),
        font.pos(Pos::new(HPos::Center, VPos::Bottom))
            .transform(FontTransform::Rotate270),
    ))
    .map_err(render_err)?;
    Ok(())
}

fn colorbar_width(opts: &PlotOptions, format: OutputFormat) -> u32 {
    opts.points(format, 60.).round() as u32
}

fn tick_label(v: f64) -> String {
    // -0 and float noise such as 40.00000000001
    let r = (v * 1e6).round() / 1e6;
    if r == 0. {
        "0".to_string()
    } else {
        format!("{}", r)
    }
}

fn padded(lo: f64, hi: f64) -> (f64, f64) {
    let (lo, hi) = widen(lo, hi);
    let m = (hi - lo) * MARGIN;
    (lo - m, hi + m)
}

/// a flat range is opened around its value
fn widen(lo: f64, hi: f64) -> (f64, f64) {
    if hi > lo {
        (lo, hi)
    } else {
        let half = (lo.abs() * MARGIN).max(0.5);
        (lo - half, lo + half)
    }
}

/// Recovers straight alpha from the same figure drawn on white and on black.
/// For a pixel with colour c and opacity a:
/// white = a*c + (1-a)*255, black = a*c, so a = 1 - (white - black) / 255.
pub fn matte(on_white: &[u8], on_black: &[u8]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(on_white.len() / 3 * 4);
    for (w, b) in on_white.chunks_exact(3).zip(on_black.chunks_exact(3)) {
        let diff: u32 = (0..3).map(|i| w[i].saturating_sub(b[i]) as u32).sum();
        let alpha = 255 - (diff / 3).min(255);
        if alpha == 0 {
            rgba.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        for &c in b.iter() {
            rgba.push(((c as u32 * 255 + alpha / 2) / alpha).min(255) as u8);
        }
        rgba.push(alpha as u8);
    }
    rgba
}

/// `<stem>_axes.svg` next to the figure
pub fn axes_path<P: AsRef<Path>>(fout: P) -> PathBuf {
    suffixed(fout.as_ref(), "_axes", "svg")
}

/// `<stem>_rec<NNN>.<ext>` for batch output
pub fn recording_path<P: AsRef<Path>>(fout: P, recording: i64) -> PathBuf {
    let fout = fout.as_ref();
    let ext = fout.extension().and_then(|e| e.to_str()).unwrap_or("png");
    suffixed(fout, &format!("_rec{:03}", recording), ext)
}

fn suffixed(fout: &Path, suffix: &str, ext: &str) -> PathBuf {
    let stem = fout
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    fout.with_file_name(format!("{}{}.{}", stem, suffix, ext))
}

/// Loads the csv, builds the figure and writes it to `fout`.
pub fn plot_emg_trace<P: AsRef<Path>, Q: AsRef<Path>>(
    csvin: P,
    opts: &PlotOptions,
    fout: Q,
) -> EmgResult<RenderReport> {
    opts.validate()?;
    OutputFormat::from_path(fout.as_ref())?;
    let table = EmgTable::from_csv(csvin, &opts.stim_col)?;
    Figure::build(&table, opts)?.save(opts, fout)
}

/// One single-trace figure per recording of the channel,
/// written next to `fout` as `<stem>_rec<NNN>.<ext>`.
pub fn plot_all_recordings<P: AsRef<Path>, Q: AsRef<Path>>(
    csvin: P,
    opts: &PlotOptions,
    fout: Q,
) -> EmgResult<Vec<RenderReport>> {
    opts.validate()?;
    OutputFormat::from_path(fout.as_ref())?;
    let table = EmgTable::from_csv(csvin, &opts.stim_col)?;
    let recordings: Vec<i64> = table
        .traces(opts.channel_index, opts.tmin, opts.tmax)
        .iter()
        .map(|t| t.recording)
        .collect();
    if recordings.is_empty() {
        return Err(EmgError::NoData {
            channel: opts.channel_index,
            recording: None,
        });
    }
    let mut reports = Vec::with_capacity(recordings.len());
    for rec in recordings {
        let rec_opts = PlotOptions {
            recording_index: rec,
            overlay: false,
            ..opts.clone()
        };
        let figure = Figure::build(&table, &rec_opts)?;
        reports.push(figure.save(&rec_opts, recording_path(fout.as_ref(), rec))?);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> EmgTable {
        let mut csv =
            String::from("recording_index,channel_index,time_point,amplitude_mV,stimulus_V\n");
        for rec in 0..3 {
            for i in 0..11 {
                let t = i as f64 - 5.;
                let (amp, stim) = ((rec + 1) as f64 * t, 1. + rec as f64);
                csv.push_str(&format!("{},1,{},{},{}\n", rec, t, amp, stim));
            }
        }
        EmgTable::from_reader(csv.as_bytes(), "stimulus_V").unwrap()
    }

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn single_trace_uses_the_chosen_colour_and_padded_ranges() {
        let opts = PlotOptions {
            color: "red".into(),
            ..Default::default()
        };
        let fig = Figure::build(&table(), &opts).unwrap();
        assert_eq!(fig.series_count(), 1);
        assert_eq!(fig.traces[0].trace.recording, 0);
        assert_eq!(fig.traces[0].color, RGBColor(255, 0, 0));
        assert!(close(fig.x_range, (-5.5, 5.5)), "{:?}", fig.x_range);
        assert!(close(fig.y_range, (-5.5, 5.5)), "{:?}", fig.y_range);
        assert!(fig.colorbar.is_none());
        assert!(fig.scale_bars.is_none());
    }

    #[test]
    fn fixed_y_spans_every_recording_of_the_channel() {
        let opts = PlotOptions {
            fixed_y: true,
            ..Default::default()
        };
        let fig = Figure::build(&table(), &opts).unwrap();
        assert_eq!(fig.series_count(), 1);
        assert!(close(fig.y_range, (-16.5, 16.5)), "{:?}", fig.y_range);
    }

    #[test]
    fn overlay_colours_every_recording_by_stimulus() {
        let opts = PlotOptions {
            overlay: true,
            show_colorbar: true,
            ..Default::default()
        };
        let fig = Figure::build(&table(), &opts).unwrap();
        assert_eq!(fig.series_count(), 3);
        let viridis = Colormap::from_name("viridis").unwrap();
        assert_eq!(fig.traces[0].color, viridis.at(0.));
        assert_eq!(fig.traces[1].color, viridis.at(0.5));
        assert_eq!(fig.traces[2].color, viridis.at(1.));
        let cb = fig.colorbar.unwrap();
        assert_eq!(cb.norm, Normalize::new(1., 3.));
        assert_eq!(cb.label, "stimulus_V");
    }

    #[test]
    fn overlay_needs_the_stimulus_column() {
        let csv = "recording_index,channel_index,time_point,amplitude_mV\n0,1,0,1\n0,1,1,2\n";
        let table = EmgTable::from_reader(csv.as_bytes(), "stimulus_V").unwrap();
        let opts = PlotOptions {
            overlay: true,
            ..Default::default()
        };
        match Figure::build(&table, &opts) {
            Err(EmgError::MissingColumn(c)) => assert_eq!(c, "stimulus_V"),
            other => panic!("expected missing column, got {:?}", other.map(|f| f.series_count())),
        }
    }

    #[test]
    fn unknown_channel_or_recording_is_no_data() {
        let opts = PlotOptions {
            channel_index: 9,
            ..Default::default()
        };
        assert!(matches!(
            Figure::build(&table(), &opts),
            Err(EmgError::NoData { channel: 9, recording: None })
        ));
        let opts = PlotOptions {
            recording_index: 42,
            ..Default::default()
        };
        assert!(matches!(
            Figure::build(&table(), &opts),
            Err(EmgError::NoData { channel: 1, recording: Some(42) })
        ));
    }

    #[test]
    fn cropping_sets_exact_x_limits() {
        let opts = PlotOptions {
            tmin: Some(-2.),
            ..Default::default()
        };
        let fig = Figure::build(&table(), &opts).unwrap();
        assert_eq!(fig.x_range, (-2., 5.));
        assert_eq!(fig.traces[0].trace.time.len(), 8);
    }

    #[test]
    fn scale_bars_are_nice_fractions_of_the_span() {
        let opts = PlotOptions {
            scale_bars: true,
            ..Default::default()
        };
        let fig = Figure::build(&table(), &opts).unwrap();
        assert_eq!(
            fig.scale_bars,
            Some(ScaleBars {
                time: 2.,
                amplitude: 2.
            })
        );
    }

    #[test]
    fn matte_recovers_alpha() {
        let on_white = [255, 255, 255, 255, 0, 0, 255, 128, 128];
        let on_black = [0, 0, 0, 255, 0, 0, 128, 0, 0];
        assert_eq!(
            matte(&on_white, &on_black),
            vec![0, 0, 0, 0, 255, 0, 0, 255, 255, 0, 0, 128]
        );
    }

    #[test]
    fn derived_paths() {
        assert_eq!(axes_path("out/fig.png"), PathBuf::from("out/fig_axes.svg"));
        assert_eq!(recording_path("out/fig.pdf", 7), PathBuf::from("out/fig_rec007.pdf"));
    }

    #[test]
    fn tick_labels_and_flat_ranges() {
        assert_eq!(tick_label(40.000000000001), "40");
        assert_eq!(tick_label(-0.0), "0");
        assert_eq!(tick_label(-2.5), "-2.5");
        assert_eq!(widen(2., 2.), (1.5, 2.5));
        assert_eq!(widen(100., 100.), (95., 105.));
    }

    #[test]
    fn missing_stimulus_value_is_drawn_gray() {
        let csv = "recording_index,channel_index,time_point,amplitude_mV,stimulus_V\n\
                   0,1,0,1,1.0\n0,1,1,2,1.0\n1,1,0,3,\n1,1,1,4,\n2,1,0,5,2.0\n2,1,1,6,2.0\n";
        let table = EmgTable::from_reader(csv.as_bytes(), "stimulus_V").unwrap();
        let opts = PlotOptions {
            overlay: true,
            ..Default::default()
        };
        let fig = Figure::build(&table, &opts).unwrap();
        assert_eq!(fig.series_count(), 3);
        assert_eq!(fig.traces[1].color, BAD_COLOR);
        let viridis = Colormap::from_name("viridis").unwrap();
        assert_eq!(fig.traces[0].color, viridis.at(0.));
        assert_eq!(fig.traces[2].color, viridis.at(1.));
    }

    #[test]
    fn inverted_colour_bounds_are_rejected() {
        let opts = PlotOptions {
            overlay: true,
            cmin: Some(10.),
            ..Default::default()
        };
        assert!(matches!(
            Figure::build(&table(), &opts),
            Err(EmgError::InvalidOption { name: "cmin", .. })
        ));
    }

    #[test]
    fn preview_is_opaque_on_white() {
        let opts = PlotOptions {
            figsize: (2., 1.),
            ..Default::default()
        };
        let fig = Figure::build(&table(), &opts).unwrap();
        let (w, h, rgba) = fig.render_rgba(&opts, 40).unwrap();
        assert_eq!((w, h), (80, 40));
        assert_eq!(rgba.len(), 80 * 40 * 4);
        assert!(rgba.chunks_exact(4).all(|px| px[3] == 255));
        assert_eq!(&rgba[..4], &[255, 255, 255, 255]);
        // the gold trace crosses the canvas
        assert!(rgba.chunks_exact(4).any(|px| px[0] > 200 && px[2] < 100));
    }
}
