//! CSV import for price histories and prediction batches.
//!
//! Prices: `date,open,high,low,close,volume`.
//! Predictions: `instrument,model,prediction_date,target_date,direction,
//! predicted_price,predicted_change_percent,confidence` with the two
//! predicted-value columns optional.

use crate::domain::error::ForecastError;
use crate::domain::ohlcv::{normalize_history, normalize_ticker, PricePoint};
use crate::domain::prediction::{Direction, NewPrediction};
use chrono::NaiveDate;
use csv::StringRecord;
use std::fs;
use std::path::Path;
use std::str::FromStr;

struct RecordReader<'a> {
    file: &'a str,
    line: usize,
    record: &'a StringRecord,
}

impl RecordReader<'_> {
    fn error(&self, reason: String) -> ForecastError {
        ForecastError::Import {
            file: self.file.to_string(),
            line: self.line,
            reason,
        }
    }

    fn field(&self, idx: usize, name: &str) -> Result<&str, ForecastError> {
        self.record
            .get(idx)
            .map(str::trim)
            .ok_or_else(|| self.error(format!("missing {} column", name)))
    }

    fn parse<T>(&self, idx: usize, name: &str) -> Result<T, ForecastError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.field(idx, name)?;
        raw.parse()
            .map_err(|e| self.error(format!("invalid {} value '{}': {}", name, raw, e)))
    }

    fn parse_optional(&self, idx: usize, name: &str) -> Result<Option<f64>, ForecastError> {
        match self.record.get(idx).map(str::trim) {
            None | Some("") => Ok(None),
            Some(_) => self.parse(idx, name).map(Some),
        }
    }

    fn date(&self, idx: usize, name: &str) -> Result<NaiveDate, ForecastError> {
        let raw = self.field(idx, name)?;
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| self.error(format!("invalid {} '{}': {}", name, raw, e)))
    }
}

fn read_records<P, T, F>(path: P, mut parse_row: F) -> Result<Vec<T>, ForecastError>
where
    P: AsRef<Path>,
    F: FnMut(&RecordReader<'_>) -> Result<T, ForecastError>,
{
    let path = path.as_ref();
    let file = path.display().to_string();
    let content = fs::read_to_string(path)?;

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| ForecastError::Import {
            file: file.clone(),
            line: e.position().map_or(0, |p| p.line() as usize),
            reason: format!("CSV parse error: {}", e),
        })?;
        let line = record.position().map_or(0, |p| p.line() as usize);
        let reader = RecordReader {
            file: &file,
            line,
            record: &record,
        };
        rows.push(parse_row(&reader)?);
    }
    Ok(rows)
}

/// Reads a daily price file, returned ascending by date with duplicate
/// dates collapsed to their first occurrence.
pub fn read_prices<P: AsRef<Path>>(path: P) -> Result<Vec<PricePoint>, ForecastError> {
    let points = read_records(path, |r| {
        let point = PricePoint {
            date: r.date(0, "date")?,
            open: r.parse(1, "open")?,
            high: r.parse(2, "high")?,
            low: r.parse(3, "low")?,
            close: r.parse(4, "close")?,
            volume: r.parse(5, "volume")?,
        };
        if !point.is_well_formed() {
            return Err(r.error(format!(
                "malformed prices open={} high={} low={} close={}",
                point.open, point.high, point.low, point.close
            )));
        }
        Ok(point)
    })?;
    Ok(normalize_history(points))
}

/// Reads a prediction batch. Every row is validated and its instrument
/// normalized; the first malformed row aborts the import.
pub fn read_predictions<P: AsRef<Path>>(path: P) -> Result<Vec<NewPrediction>, ForecastError> {
    read_records(path, |r| {
        let prediction = NewPrediction {
            instrument: normalize_ticker(r.field(0, "instrument")?),
            model: r.field(1, "model")?.to_string(),
            prediction_date: r.date(2, "prediction_date")?,
            target_date: r.date(3, "target_date")?,
            predicted_direction: r.parse::<Direction>(4, "direction")?,
            predicted_price: r.parse_optional(5, "predicted_price")?,
            predicted_change_percent: r.parse_optional(6, "predicted_change_percent")?,
            confidence: r.parse(7, "confidence")?,
        };
        prediction.validate().map_err(|e| r.error(e.to_string()))?;
        Ok(prediction)
    })
}
