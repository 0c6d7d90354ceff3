//! Synthetic EMG exports, for trying the plotter and for tests.

use crate::linspace::Linspace;
use crate::{
    EmgError, EmgResult, COL_AMPLITUDE, COL_CHANNEL, COL_RECORDING, COL_TIME, DEFAULT_STIM_COL,
    VERSION,
};
use clap::{App, Arg, ArgMatches};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    pub recordings: u32,
    pub channels: u32,
    pub samples: u64,
    /// ms
    pub t_start: f64,
    /// ms
    pub t_end: f64,
    /// mV
    pub noise_std: f64,
    pub seed: u64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        SynthConfig {
            recordings: 3,
            channels: 2,
            samples: 1000,
            t_start: -20.,
            t_end: 80.,
            noise_std: 5.,
            seed: 42,
        }
    }
}

/// Gaussian noise plus a biphasic compound action potential at t = 0,
/// growing with the recording index as the stimulus does.
pub fn write_csv<W: Write>(out: W, cfg: &SynthConfig) -> EmgResult<()> {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    // noise_std is validated by the caller, zero gives a clean pulse
    let noise = Normal::new(0., cfg.noise_std.abs()).map_err(|e| EmgError::InvalidOption {
        name: "noise_std",
        reason: e.to_string(),
    })?;
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([
        COL_RECORDING,
        COL_CHANNEL,
        COL_TIME,
        COL_AMPLITUDE,
        DEFAULT_STIM_COL,
    ])?;
    let width = 2.;
    for recording in 0..cfg.recordings {
        let amplitude = 50. + recording as f64 * 20.;
        let stimulus = 1. + recording as f64 * 0.5;
        for channel in 1..=cfg.channels {
            for t in Linspace::inclusive(cfg.t_start, cfg.t_end, cfg.samples) {
                let pulse = amplitude * (-(t / width).powi(2)).exp()
                    - 0.3 * amplitude * (-((t - 1.) / (width * 1.5)).powi(2)).exp();
                let v = noise.sample(&mut rng) + pulse;
                wtr.write_record(&[
                    recording.to_string(),
                    channel.to_string(),
                    format!("{:.4}", t),
                    format!("{:.4}", v),
                    format!("{}", stimulus),
                ])?;
            }
        }
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv_file<P: AsRef<Path>>(fout: P, cfg: &SynthConfig) -> EmgResult<()> {
    let file = std::fs::File::create(fout)?;
    write_csv(std::io::BufWriter::new(file), cfg)
}

fn app() -> App<'static, 'static> {
    App::new("emg_synth")
        .version(VERSION.unwrap_or("unknown"))
        .author("Andrew Worthy")
        .about("Write a synthetic EMG csv export")
        .arg(
            Arg::with_name("output")
                .help("csv file to write")
                .short("o")
                .long("output")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("recordings")
                .help("number of recordings")
                .short("r")
                .long("recordings")
                .takes_value(true)
                .default_value("3"),
        )
        .arg(
            Arg::with_name("channels")
                .help("number of channels")
                .short("c")
                .long("channels")
                .takes_value(true)
                .default_value("2"),
        )
        .arg(
            Arg::with_name("samples")
                .help("samples per trace")
                .short("n")
                .long("samples")
                .takes_value(true)
                .default_value("1000"),
        )
        .arg(
            Arg::with_name("seed")
                .help("random seed")
                .long("seed")
                .takes_value(true)
                .default_value("42"),
        )
}

/// Output path and generator settings for `emg_synth`.
pub fn parse_cli() -> EmgResult<(PathBuf, SynthConfig)> {
    cli_from_matches(&app().get_matches())
}

pub fn parse_cli_from<I, T>(args: I) -> EmgResult<(PathBuf, SynthConfig)>
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

fn cli_from_matches(m: &ArgMatches) -> EmgResult<(PathBuf, SynthConfig)> {
    fn number<T: std::str::FromStr>(m: &ArgMatches, name: &'static str) -> EmgResult<T> {
        let s = m.value_of(name).unwrap_or_default();
        s.parse().map_err(|_| EmgError::InvalidOption {
            name,
            reason: format!("could not parse '{}'", s),
        })
    }
    let fout = PathBuf::from(m.value_of("output").unwrap_or_default());
    let cfg = SynthConfig {
        recordings: number(m, "recordings")?,
        channels: number(m, "channels")?,
        samples: number(m, "samples")?,
        seed: number(m, "seed")?,
        ..Default::default()
    };
    if cfg.samples < 2 {
        return Err(EmgError::InvalidOption {
            name: "samples",
            reason: "at least 2 samples per trace".to_string(),
        });
    }
    Ok((fout, cfg))
}
