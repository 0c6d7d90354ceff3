use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

pub mod colors;
pub mod error;
pub mod linspace;
pub mod options;
pub mod pdf;
pub mod plot;
pub mod render;
pub mod summary;
pub mod synth;
pub mod worker;

#[cfg(feature = "gui")]
pub mod gui;

pub use error::{EmgError, EmgResult};
pub use options::{OutputFormat, PlotOptions};
pub use render::{plot_all_recordings, plot_emg_trace, Figure, RenderReport};
pub use summary::FileSummary;

pub const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");

/// Logs to stderr so that stdout stays clean for `--info`.
/// Calling it twice keeps the first subscriber.
pub fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub const COL_RECORDING: &str = "recording_index";
pub const COL_CHANNEL: &str = "channel_index";
pub const COL_TIME: &str = "time_point";
pub const COL_AMPLITUDE: &str = "amplitude_mV";
pub const DEFAULT_STIM_COL: &str = "stimulus_V";

/// The whole EMG export, one entry per csv row in every column vector.
#[derive(Debug, Clone)]
pub struct EmgTable {
    pub columns: Vec<String>,
    pub stim_col: Option<String>,
    pub recording: Vec<i64>,
    pub channel: Vec<i64>,
    pub time: Vec<f64>,
    pub amplitude: Vec<f64>,
    pub stimulus: Vec<f64>,
}

/// One recording of one channel, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub recording: i64,
    pub stimulus: f64,
    pub time: Vec<f64>,
    pub amplitude: Vec<f64>,
}

impl EmgTable {
    pub fn new(capacity: usize) -> EmgTable {
        EmgTable {
            columns: Vec::new(),
            stim_col: None,
            recording: Vec::with_capacity(capacity),
            channel: Vec::with_capacity(capacity),
            time: Vec::with_capacity(capacity),
            amplitude: Vec::with_capacity(capacity),
            stimulus: Vec::with_capacity(capacity),
        }
    }

    /// Init an EmgTable from csv.
    /// Amplitude and stimulus cells that do not parse are set to NAN,
    /// index and time cells that do not parse are an error.
    /// The stimulus column is optional and only loaded when present.
    pub fn from_csv<P: AsRef<Path>>(fin: P, stim_col: &str) -> EmgResult<EmgTable> {
        let fin = fin.as_ref();
        if !fin.exists() {
            return Err(EmgError::NotFound(fin.to_path_buf()));
        }
        let file = File::open(fin)?;
        let table = EmgTable::from_reader(file, stim_col)?;
        debug!(
            "loaded {} rows from {}, {} recordings",
            table.len(),
            fin.display(),
            table.recordings().len()
        );
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R, stim_col: &str) -> EmgResult<EmgTable> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let columns: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
        let position = |name: &str| columns.iter().position(|c| c == name);
        let required = |name: &str| {
            position(name).ok_or_else(|| EmgError::MissingColumn(name.to_string()))
        };
        let i_rec = required(COL_RECORDING)?;
        let i_ch = required(COL_CHANNEL)?;
        let i_t = required(COL_TIME)?;
        let i_amp = required(COL_AMPLITUDE)?;
        let i_stim = position(stim_col);

        let mut table = EmgTable::new(10000);
        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            let line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(i as u64 + 2);
            let cell = |idx: usize| record.get(idx).unwrap_or("");
            let parse_err = |idx: usize| EmgError::Parse {
                line,
                column: columns[idx].clone(),
                value: cell(idx).to_string(),
            };
            let rec = parse_index(cell(i_rec)).ok_or_else(|| parse_err(i_rec))?;
            let ch = parse_index(cell(i_ch)).ok_or_else(|| parse_err(i_ch))?;
            let t: f64 = cell(i_t)
                .parse()
                .ok()
                .filter(|t: &f64| t.is_finite())
                .ok_or_else(|| parse_err(i_t))?;
            let amp = match cell(i_amp).parse::<f64>() {
                Ok(a) => a,
                Err(_) => {
                    warn!("line {}: invalid amplitude '{}', set to NAN", line, cell(i_amp));
                    f64::NAN
                }
            };
            let stim = match i_stim {
                Some(idx) => cell(idx).parse::<f64>().unwrap_or_else(|_| {
                    warn!("line {}: invalid stimulus '{}', set to NAN", line, cell(idx));
                    f64::NAN
                }),
                None => f64::NAN,
            };
            table.recording.push(rec);
            table.channel.push(ch);
            table.time.push(t);
            table.amplitude.push(amp);
            table.stimulus.push(stim);
        }
        if table.is_empty() {
            return Err(EmgError::Empty);
        }
        table.stim_col = i_stim.map(|_| stim_col.to_string());
        table.columns = columns;
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn has_stimulus(&self) -> bool {
        self.stim_col.is_some()
    }

    /// sorted unique recording indices
    pub fn recordings(&self) -> Vec<i64> {
        sorted_unique(&self.recording)
    }

    /// sorted unique channel indices
    pub fn channels(&self) -> Vec<i64> {
        sorted_unique(&self.channel)
    }

    /// All the recordings of a channel inside the inclusive time window,
    /// ordered by recording index.
    pub fn traces(&self, channel: i64, tmin: Option<f64>, tmax: Option<f64>) -> Vec<Trace> {
        let mut groups: BTreeMap<i64, Trace> = BTreeMap::new();
        for i in 0..self.len() {
            if self.channel[i] != channel || !in_window(self.time[i], tmin, tmax) {
                continue;
            }
            let rec = self.recording[i];
            let trace = groups.entry(rec).or_insert_with(|| Trace {
                recording: rec,
                stimulus: self.stimulus[i],
                time: Vec::new(),
                amplitude: Vec::new(),
            });
            trace.time.push(self.time[i]);
            trace.amplitude.push(self.amplitude[i]);
        }
        groups.into_values().collect()
    }

    /// A single recording of a channel inside the inclusive time window.
    pub fn trace(
        &self,
        recording: i64,
        channel: i64,
        tmin: Option<f64>,
        tmax: Option<f64>,
    ) -> EmgResult<Trace> {
        self.traces(channel, tmin, tmax)
            .into_iter()
            .find(|t| t.recording == recording)
            .ok_or(EmgError::NoData {
                channel,
                recording: Some(recording),
            })
    }

    pub fn summary(&self, file_name: &str) -> FileSummary {
        FileSummary::from_table(self, file_name)
    }
}

impl Trace {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Splits the trace at NAN amplitudes, the line is not drawn across them.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut titer = self.time.iter();
        let mut segments = Vec::new();
        for achunk in self.amplitude.split(|a| a.is_nan()) {
            if !achunk.is_empty() {
                segments.push(achunk.iter().zip(titer.by_ref()).map(|(a, t)| (*t, *a)).collect());
            }
            // the NAN separator
            titer.next();
        }
        segments
    }
}

impl std::fmt::Display for EmgTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{},{},{},{},stimulus", COL_RECORDING, COL_CHANNEL, COL_TIME, COL_AMPLITUDE)?;
        for i in 0..self.len() {
            writeln!(
                f,
                "{},{},{},{},{}",
                self.recording[i],
                self.channel[i],
                self.time[i],
                self.amplitude[i],
                self.stimulus[i]
            )?;
        }
        Ok(())
    }
}

/// Integer cells may be written as integral floats, e.g. "1.0".
fn parse_index(s: &str) -> Option<i64> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(i);
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0. => Some(f as i64),
        _ => None,
    }
}

fn in_window(t: f64, tmin: Option<f64>, tmax: Option<f64>) -> bool {
    tmin.map_or(true, |lo| t >= lo) && tmax.map_or(true, |hi| t <= hi)
}

fn sorted_unique(v: &[i64]) -> Vec<i64> {
    let mut out = v.to_vec();
    out.sort_unstable();
    out.dedup();
    out
}

/// min and max of the slice, NAN values are ignored.
/// None when there is no finite value.
pub fn min_and_max(s: &[f64]) -> Option<(f64, f64)> {
    let mut finite = s.iter().copied().filter(|v| v.is_finite());
    let first = finite.next()?;
    let (mut min, mut max) = (first, first);
    for es in finite {
        if es > max {
            max = es
        }
        if es < min {
            min = es
        }
    }
    Some((min, max))
}

/// A "nice" value, 1, 2 or 5 times a power of ten, close to x.
pub fn nice_number(x: f64) -> f64 {
    if !(x.is_finite() && x > 0.) {
        return 1.;
    }
    let exp = x.log10().floor();
    let base = 10f64.powi(exp as i32);
    let frac = x / base;
    let nice = if frac < 1.5 {
        1.
    } else if frac < 3.5 {
        2.
    } else if frac < 7.5 {
        5.
    } else {
        10.
    };
    nice * base
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
recording_index,channel_index,time_point,amplitude_mV,stimulus_V,comment
0,1,0.0,1.0,1.5,a
0,1,0.5,2.0,1.5,b
0,2,0.0,9.0,1.5,c
1,1,0.0,-1.0,2.0,d
1.0,1,0.5,oops,2.0,e
1,1,1.0,3.0,2.0,f
";

    fn table() -> EmgTable {
        EmgTable::from_reader(CSV.as_bytes(), DEFAULT_STIM_COL).unwrap()
    }

    #[test]
    fn loads_columns_and_coerces_bad_amplitudes() {
        let t = table();
        assert_eq!(t.len(), 6);
        assert_eq!(t.columns.len(), 6);
        assert_eq!(t.stim_col.as_deref(), Some("stimulus_V"));
        assert_eq!(t.recording[4], 1);
        assert!(t.amplitude[4].is_nan());
        assert_eq!(t.recordings(), vec![0, 1]);
        assert_eq!(t.channels(), vec![1, 2]);
    }

    #[test]
    fn missing_required_column_is_reported() {
        let csv = "recording_index,channel_index,time_point\n0,1,0.0\n";
        match EmgTable::from_reader(csv.as_bytes(), DEFAULT_STIM_COL) {
            Err(EmgError::MissingColumn(c)) => assert_eq!(c, COL_AMPLITUDE),
            other => panic!("expected missing column, got {:?}", other),
        }
    }

    #[test]
    fn bad_time_is_a_parse_error_with_line() {
        let csv = "recording_index,channel_index,time_point,amplitude_mV\n0,1,0.0,1\n0,1,x,1\n";
        match EmgTable::from_reader(csv.as_bytes(), DEFAULT_STIM_COL) {
            Err(EmgError::Parse { line, column, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(column, COL_TIME);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn header_only_is_empty() {
        let csv = "recording_index,channel_index,time_point,amplitude_mV\n";
        assert!(matches!(
            EmgTable::from_reader(csv.as_bytes(), DEFAULT_STIM_COL),
            Err(EmgError::Empty)
        ));
    }

    #[test]
    fn stimulus_column_is_optional() {
        let csv = "recording_index,channel_index,time_point,amplitude_mV\n0,1,0.0,1\n";
        let t = EmgTable::from_reader(csv.as_bytes(), DEFAULT_STIM_COL).unwrap();
        assert!(!t.has_stimulus());
        assert!(t.stimulus[0].is_nan());
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = EmgTable::from_csv("/definitely/not/here.csv", DEFAULT_STIM_COL).unwrap_err();
        assert!(matches!(err, EmgError::NotFound(_)));
    }

    #[test]
    fn traces_group_by_recording_and_window() {
        let t = table();
        let traces = t.traces(1, None, None);
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[0].recording, 0);
        assert_eq!(traces[0].time, vec![0.0, 0.5]);
        assert_eq!(traces[1].stimulus, 2.0);

        let cropped = t.traces(1, Some(0.5), Some(1.0));
        assert_eq!(cropped[0].time, vec![0.5]);
        assert_eq!(cropped[1].time, vec![0.5, 1.0]);

        assert!(t.traces(3, None, None).is_empty());
        assert!(matches!(
            t.trace(5, 1, None, None),
            Err(EmgError::NoData { channel: 1, recording: Some(5) })
        ));
    }

    #[test]
    fn segments_break_at_nan() {
        let trace = Trace {
            recording: 0,
            stimulus: 1.,
            time: vec![0., 1., 2., 3., 4., 5.],
            amplitude: vec![f64::NAN, 1., f64::NAN, f64::NAN, 4., 5.],
        };
        assert_eq!(
            trace.segments(),
            vec![vec![(1., 1.)], vec![(4., 4.), (5., 5.)]]
        );
    }

    #[test]
    fn min_and_max_skip_nan() {
        assert_eq!(min_and_max(&[f64::NAN, 3., -1., 2.]), Some((-1., 3.)));
        assert_eq!(min_and_max(&[f64::NAN]), None);
    }

    #[test]
    fn nice_numbers() {
        assert_eq!(nice_number(18.), 20.);
        assert!((nice_number(0.12) - 0.1).abs() < 1e-12);
        assert_eq!(nice_number(4.), 5.);
        assert_eq!(nice_number(80.), 100.);
    }
}
