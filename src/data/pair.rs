//! Aligned price pair data structures

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Single row of the input file: timestamp plus both instruments' prices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Raw timestamp string from the index column
    pub timestamp: String,
    /// Price of the first instrument
    pub close: f64,
    /// Price of the second instrument
    pub close2: f64,
}

impl PricePoint {
    /// Create a new price point
    pub fn new(timestamp: impl Into<String>, close: f64, close2: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            close,
            close2,
        }
    }
}

/// Two price series sharing one timestamp index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PairSeries {
    pub data: Vec<PricePoint>,
}

impl PairSeries {
    /// Create a series from already aligned points
    pub fn new(data: Vec<PricePoint>) -> Self {
        Self { data }
    }

    /// Build a series from three parallel columns
    pub fn from_columns(timestamps: Vec<String>, close: Vec<f64>, close2: Vec<f64>) -> Result<Self> {
        if close.len() != timestamps.len() {
            return Err(Error::length_mismatch("close", timestamps.len(), close.len()));
        }
        if close2.len() != timestamps.len() {
            return Err(Error::length_mismatch("close2", timestamps.len(), close2.len()));
        }

        let data = timestamps
            .into_iter()
            .zip(close)
            .zip(close2)
            .map(|((ts, c), c2)| PricePoint::new(ts, c, c2))
            .collect();

        Ok(Self { data })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn timestamps(&self) -> Vec<String> {
        self.data.iter().map(|p| p.timestamp.clone()).collect()
    }

    pub fn close(&self) -> Vec<f64> {
        self.data.iter().map(|p| p.close).collect()
    }

    pub fn close2(&self) -> Vec<f64> {
        self.data.iter().map(|p| p.close2).collect()
    }

    /// Load a series from CSV
    ///
    /// The first column is the timestamp index; the two price columns are
    /// looked up by header name. Empty or `NaN` cells are read as `NaN` so
    /// the feature builder can drop the affected rows.
    pub fn load_csv<P: AsRef<Path>>(path: P, price_column: &str, pair_column: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path.as_ref())?;

        let headers = reader.headers()?.clone();
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| Error::MissingColumn(name.to_string()))
        };
        let price_idx = find(price_column)?;
        let pair_idx = find(pair_column)?;

        let mut data = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record = result?;
            let timestamp = record.get(0).unwrap_or_default().to_string();
            let close = parse_price(record.get(price_idx), row + 1, price_column)?;
            let close2 = parse_price(record.get(pair_idx), row + 1, pair_column)?;
            data.push(PricePoint::new(timestamp, close, close2));
        }

        tracing::debug!(
            "Loaded {} rows from {}",
            data.len(),
            path.as_ref().display()
        );
        Ok(Self { data })
    }

    /// Save the series to CSV with `Datetime,Close,Close2` header
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["Datetime", "Close", "Close2"])?;

        for point in &self.data {
            writer.write_record([
                point.timestamp.clone(),
                point.close.to_string(),
                point.close2.to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn parse_price(cell: Option<&str>, row: usize, column: &str) -> Result<f64> {
    match cell {
        None | Some("") => Ok(f64::NAN),
        Some(value) if value.eq_ignore_ascii_case("nan") => Ok(f64::NAN),
        Some(value) => value.parse::<f64>().map_err(|_| Error::Parse {
            row,
            column: column.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_csv_by_header_name() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Datetime,Open,Close,Close2").unwrap();
        writeln!(file, "2024-01-02 09:30:00,1.0,4700.5,37600.25").unwrap();
        writeln!(file, "2024-01-02 09:32:00,1.0,4701.0,").unwrap();
        file.flush().unwrap();

        let series = PairSeries::load_csv(file.path(), "Close", "Close2").unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.data[0].timestamp, "2024-01-02 09:30:00");
        assert_eq!(series.data[0].close, 4700.5);
        assert_eq!(series.data[0].close2, 37600.25);
        assert!(series.data[1].close2.is_nan());
    }

    #[test]
    fn test_missing_column() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Datetime,Close").unwrap();
        writeln!(file, "2024-01-02,1.0").unwrap();
        file.flush().unwrap();

        let err = PairSeries::load_csv(file.path(), "Close", "Close2").unwrap_err();
        assert!(matches!(err, Error::MissingColumn(ref c) if c == "Close2"));
    }

    #[test]
    fn test_bad_number_reports_row() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Datetime,Close,Close2").unwrap();
        writeln!(file, "t0,1.0,2.0").unwrap();
        writeln!(file, "t1,abc,2.0").unwrap();
        file.flush().unwrap();

        let err = PairSeries::load_csv(file.path(), "Close", "Close2").unwrap_err();
        match err {
            Error::Parse { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, "Close");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_csv_save_load() {
        let series = PairSeries::from_columns(
            vec!["a".into(), "b".into()],
            vec![100.0, 101.5],
            vec![50.0, 49.75],
        )
        .unwrap();

        let file = NamedTempFile::new().unwrap();
        series.save_csv(file.path()).unwrap();
        let loaded = PairSeries::load_csv(file.path(), "Close", "Close2").unwrap();

        assert_eq!(loaded.data, series.data);
    }

    #[test]
    fn test_from_columns_length_check() {
        let err = PairSeries::from_columns(vec!["a".into()], vec![1.0, 2.0], vec![1.0]).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { .. }));
    }
}
