use std::path::PathBuf;
use thiserror::Error;

pub type EmgResult<T> = Result<T, EmgError>;

/// Everything that can go wrong between reading a CSV and writing a figure.
#[derive(Debug, Error)]
pub enum EmgError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("line {line}: could not parse '{value}' in column '{column}'")]
    Parse {
        line: u64,
        column: String,
        value: String,
    },

    #[error("the csv file has no data rows")]
    Empty,

    #[error(
        "no samples for channel {channel}{}",
        .recording.map(|r| format!(", recording {}", r)).unwrap_or_default()
    )]
    NoData {
        channel: i64,
        recording: Option<i64>,
    },

    #[error("unsupported output format '{0}', use png, svg or pdf")]
    UnsupportedFormat(String),

    #[error("invalid option {name}: {reason}")]
    InvalidOption { name: &'static str, reason: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("cancelled")]
    Cancelled,
}

impl From<toml::de::Error> for EmgError {
    fn from(err: toml::de::Error) -> Self {
        EmgError::Config(err.to_string())
    }
}

/// plotters errors are generic over the backend, keep only their message
pub(crate) fn render_err<E: std::fmt::Display>(e: E) -> EmgError {
    EmgError::Render(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_data_message_mentions_recording_when_known() {
        let e = EmgError::NoData {
            channel: 2,
            recording: Some(7),
        };
        assert_eq!(e.to_string(), "no samples for channel 2, recording 7");
        let e = EmgError::NoData {
            channel: 2,
            recording: None,
        };
        assert_eq!(e.to_string(), "no samples for channel 2");
    }

    #[test]
    fn toml_errors_become_config_errors() {
        let err = toml::from_str::<toml::Value>("a = [").unwrap_err();
        assert!(matches!(EmgError::from(err), EmgError::Config(_)));
    }
}
