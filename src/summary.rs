use crate::{min_and_max, EmgTable};

/// What the GUI shows about a freshly selected file, also `emg_plot --info`.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSummary {
    pub file_name: String,
    pub columns: Vec<String>,
    pub rows: usize,
    pub recordings: usize,
    pub channels: Vec<i64>,
    pub stim_col: Option<String>,
    pub stimulus_range: Option<(f64, f64)>,
    pub time_range: Option<(f64, f64)>,
}

impl FileSummary {
    pub fn from_table(table: &EmgTable, file_name: &str) -> FileSummary {
        FileSummary {
            file_name: file_name.to_string(),
            columns: table.columns.clone(),
            rows: table.len(),
            recordings: table.recordings().len(),
            channels: table.channels(),
            stim_col: table.stim_col.clone(),
            stimulus_range: table.stim_col.as_ref().and_then(|_| min_and_max(&table.stimulus)),
            time_range: min_and_max(&table.time),
        }
    }
}

impl std::fmt::Display for FileSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "File: {}", self.file_name)?;
        writeln!(f, "Columns: {}", self.columns.join(", "))?;
        writeln!(f, "Rows: {}", self.rows)?;
        writeln!(f, "Number of recordings: {}", self.recordings)?;
        writeln!(f, "Available channels: {:?}", self.channels)?;
        if let Some((lo, hi)) = self.stimulus_range {
            writeln!(f, "Stimulus range: {:.2} - {:.2} V", lo, hi)?;
        }
        if let Some((lo, hi)) = self.time_range {
            write!(f, "Time range: {:.1} - {:.1} ms", lo, hi)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_text() {
        let csv = "recording_index,channel_index,time_point,amplitude_mV,stimulus_V\n\
                   0,1,-20,0.1,1.0\n\
                   0,2,-20,0.1,1.0\n\
                   3,1,80,0.2,2.5\n";
        let table = EmgTable::from_reader(csv.as_bytes(), "stimulus_V").unwrap();
        let summary = table.summary("trial.csv");
        assert_eq!(summary.recordings, 2);
        assert_eq!(summary.channels, vec![1, 2]);
        assert_eq!(
            summary.to_string(),
            "File: trial.csv\n\
             Columns: recording_index, channel_index, time_point, amplitude_mV, stimulus_V\n\
             Rows: 3\n\
             Number of recordings: 2\n\
             Available channels: [1, 2]\n\
             Stimulus range: 1.00 - 2.50 V\n\
             Time range: -20.0 - 80.0 ms"
        );
    }

    #[test]
    fn no_stimulus_line_without_the_column() {
        let csv = "recording_index,channel_index,time_point,amplitude_mV\n0,1,0,1\n";
        let table = EmgTable::from_reader(csv.as_bytes(), "stimulus_V").unwrap();
        let text = table.summary("x.csv").to_string();
        assert!(!text.contains("Stimulus"));
        assert!(text.ends_with("Time range: 0.0 - 0.0 ms"));
    }
}
