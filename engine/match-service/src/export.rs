//! CSV export of cached fixtures

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime};
use fixture_fetcher::Match;
use tracing::{error, info};

use crate::error::ExportError;

/// Column headers, in output order
pub const CSV_HEADERS: [&str; 7] = [
    "Match ID",
    "Competition",
    "Home Team",
    "Away Team",
    "Match Time",
    "Home Team Form",
    "Away Team Form",
];

/// Writes timestamped CSV files into a directory
#[derive(Debug, Clone)]
pub struct CsvExporter {
    temp_dir: PathBuf,
}

impl CsvExporter {
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self { temp_dir: temp_dir.into() }
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Write `matches` to a new `football_matches_<timestamp>.csv` and
    /// return its path
    pub fn to_csv(&self, matches: &[Match]) -> Result<PathBuf, ExportError> {
        let (path, file) = self.create_export_file().map_err(|e| {
            error!("Error creating CSV file in {:?}: {}", self.temp_dir, e);
            e
        })?;

        write_csv(file, matches)?;

        info!("Exported {} matches to {:?}", matches.len(), path);
        Ok(path)
    }

    /// Open a file that did not exist before; a numeric suffix is added when
    /// two exports land in the same second
    fn create_export_file(&self) -> Result<(PathBuf, std::fs::File), ExportError> {
        std::fs::create_dir_all(&self.temp_dir)?;
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();

        let mut attempt = 0u32;
        loop {
            let name = if attempt == 0 {
                format!("football_matches_{}.csv", stamp)
            } else {
                format!("football_matches_{}_{}.csv", stamp, attempt)
            };
            let path = self.temp_dir.join(name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Write the header row and one row per match
pub fn write_csv<W: Write>(writer: W, matches: &[Match]) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_HEADERS)?;

    for m in matches {
        csv_writer.write_record(match_row(m))?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// One CSV row for `m`, in [`CSV_HEADERS`] order
pub fn match_row(m: &Match) -> [String; 7] {
    [
        m.id.clone(),
        m.competition.name.clone(),
        m.home_team.name.clone(),
        m.away_team.name.clone(),
        format_match_time(&m.match_time),
        m.home_team.form_string(),
        m.away_team.form_string(),
    ]
}

/// Render an ISO-8601 kickoff as `YYYY-MM-DD HH:MM`.
///
/// Offsets are kept as given, not converted. Empty input becomes "Unknown";
/// anything unparseable is returned unchanged.
pub fn format_match_time(raw: &str) -> String {
    const OUTPUT: &str = "%Y-%m-%d %H:%M";

    if raw.is_empty() {
        return "Unknown".to_string();
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format(OUTPUT).to_string();
    }

    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return naive.format(OUTPUT).to_string();
        }
    }

    raw.to_string()
}
