use super::VERSION;
use crate::{EmgError, EmgResult, PlotOptions};
use clap::{App, AppSettings, Arg, ArgMatches};
use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;

/// Everything the plot CLI was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotCli {
    pub csvin: PathBuf,
    pub fout: PathBuf,
    /// false when `fout` was derived from the csv path
    pub explicit_output: bool,
    pub options: PlotOptions,
    pub all_recordings: bool,
    pub info: bool,
    pub verbose: bool,
}

fn app() -> App<'static, 'static> {
    let value = |name: &'static str, long: &'static str, help: &'static str| {
        Arg::with_name(name)
            .long(long)
            .help(help)
            .takes_value(true)
            .allow_hyphen_values(true)
    };
    let flag = |name: &'static str, help: &'static str| Arg::with_name(name).long(name).help(help);

    App::new("emg_plot")
        .version(VERSION.unwrap_or("unknown"))
        .author("Andrew Worthy")
        .about("Plot one or all EMG traces colored by stimulus")
        .setting(AppSettings::ColoredHelp)
        .arg(
            Arg::with_name("csv_file")
                .help("path to the EMG csv")
                .required(true)
                .index(1),
        )
        .arg(
            value(
                "output",
                "output",
                "output image file, png, svg or pdf (default: show the figure in a window, \
                 or <csv>.png in builds without the gui feature)",
            )
            .short("o"),
        )
        .arg(
            value(
                "recording",
                "recording",
                "recording_index to plot (ignored with --overlay)",
            )
            .short("r"),
        )
        .arg(value("channel", "channel", "channel_index to plot").short("c"))
        .arg(flag("overlay", "plot all recordings overlaid, colored by stimulus"))
        .arg(value("stim-col", "stim-col", "column name for stimulus intensity"))
        .arg(value("cmap", "cmap", "colormap name (for overlay)"))
        .arg(value("cmin", "cmin", "min stimulus for colormap normalization"))
        .arg(value("cmax", "cmax", "max stimulus for colormap normalization"))
        .arg(flag("show-colorbar", "draw a colorbar when using --overlay"))
        .arg(value("color", "color", "trace color (for single-trace mode)"))
        .arg(value("linewidth", "linewidth", "trace line width, in points"))
        .arg(
            value("figsize", "figsize", "figure size in inches: width height")
                .number_of_values(2)
                .value_names(&["WIDTH", "HEIGHT"]),
        )
        .arg(value("dpi", "dpi", "figure resolution"))
        .arg(value("tmin", "tmin", "start time (inclusive) to plot"))
        .arg(value("tmax", "tmax", "end time (inclusive) to plot"))
        .arg(flag("no-hide-axes", "show axes/ticks"))
        .arg(flag("no-transparent", "save with opaque background"))
        .arg(flag("fixed-y", "y limits from every recording of the channel"))
        .arg(flag("scale-bars", "draw time and amplitude scale bars on the trace"))
        .arg(flag("create-axes", "also write <output>_axes.svg with the axes only"))
        .arg(flag(
            "all-recordings",
            "write one figure per recording as <output>_recNNN.<ext>",
        ))
        .arg(value("config", "config", "TOML file with plot options, flags override it"))
        .arg(flag("info", "print a summary of the csv and exit"))
        .arg(
            Arg::with_name("verbose")
                .help("print verbose information")
                .short("v")
                .long("verbose"),
        )
}

/// Takes the CLI arguments that control the plotting of the EMG traces.
/// Exits with the usage message on invalid arguments.
pub fn parse_cli() -> EmgResult<PlotCli> {
    let matches = app().get_matches();
    cli_from_matches(&matches)
}

pub fn parse_cli_from<I, T>(args: I) -> EmgResult<PlotCli>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = app()
        .get_matches_from_safe(args)
        .map_err(|e| EmgError::InvalidOption {
            name: "arguments",
            reason: e.message,
        })?;
    cli_from_matches(&matches)
}

impl PlotCli {
    /// A derived output path never replaces an existing file.
    pub fn check_default_output(&self) -> EmgResult<()> {
        if !self.explicit_output && self.fout.exists() {
            return Err(EmgError::InvalidOption {
                name: "output",
                reason: format!(
                    "{} already exists, pass -o to overwrite it",
                    self.fout.display()
                ),
            });
        }
        Ok(())
    }
}

fn cli_from_matches(m: &ArgMatches) -> EmgResult<PlotCli> {
    let csvin = PathBuf::from(m.value_of("csv_file").unwrap_or_default());
    let fout = match m.value_of("output") {
        Some(p) => PathBuf::from(p),
        None => {
            let mut fout = csvin.clone();
            fout.set_extension("png");
            fout
        }
    };

    let mut o = match m.value_of("config") {
        Some(path) => PlotOptions::from_toml_file(path)?,
        None => PlotOptions::default(),
    };
    if let Some(v) = parsed(m, "recording")? {
        o.recording_index = v;
    }
    if let Some(v) = parsed(m, "channel")? {
        o.channel_index = v;
    }
    if let Some(v) = m.value_of("stim-col") {
        o.stim_col = v.to_string();
    }
    if let Some(v) = m.value_of("cmap") {
        o.cmap = v.to_string();
    }
    if let Some(v) = parsed(m, "cmin")? {
        o.cmin = Some(v);
    }
    if let Some(v) = parsed(m, "cmax")? {
        o.cmax = Some(v);
    }
    if let Some(v) = m.value_of("color") {
        o.color = v.to_string();
    }
    if let Some(v) = parsed(m, "linewidth")? {
        o.linewidth = v;
    }
    if let Some(mut values) = m.values_of("figsize") {
        let mut next = || -> EmgResult<f64> {
            let s = values.next().unwrap_or_default();
            s.parse().map_err(|_| invalid("figsize", s))
        };
        o.figsize = (next()?, next()?);
    }
    if let Some(v) = parsed(m, "dpi")? {
        o.dpi = v;
    }
    if let Some(v) = parsed(m, "tmin")? {
        o.tmin = Some(v);
    }
    if let Some(v) = parsed(m, "tmax")? {
        o.tmax = Some(v);
    }
    o.overlay |= m.is_present("overlay");
    o.show_colorbar |= m.is_present("show-colorbar");
    o.fixed_y |= m.is_present("fixed-y");
    o.scale_bars |= m.is_present("scale-bars");
    o.create_axes |= m.is_present("create-axes");
    if m.is_present("no-hide-axes") {
        o.hide_axes = false;
    }
    if m.is_present("no-transparent") {
        o.transparent = false;
    }

    Ok(PlotCli {
        csvin,
        fout,
        explicit_output: m.is_present("output"),
        options: o,
        all_recordings: m.is_present("all-recordings"),
        info: m.is_present("info"),
        verbose: m.is_present("verbose"),
    })
}

fn parsed<T: FromStr>(m: &ArgMatches, name: &'static str) -> EmgResult<Option<T>> {
    match m.value_of(name) {
        Some(s) => s.parse().map(Some).map_err(|_| invalid(name, s)),
        None => Ok(None),
    }
}

fn invalid(name: &'static str, value: &str) -> EmgError {
    EmgError::InvalidOption {
        name,
        reason: format!("could not parse '{}'", value),
    }
}
