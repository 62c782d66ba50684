//! SQLite storage adapter for prices, predictions and indicator snapshots.

use crate::domain::error::ForecastError;
use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::ohlcv::{normalize_ticker, Instrument, PricePoint};
use crate::domain::prediction::{Direction, Enrichment, NewPrediction, Outcome, Prediction};
use crate::ports::config_port::ConfigPort;
use crate::ports::indicator_port::IndicatorStore;
use crate::ports::prediction_port::{PredictionFilter, PredictionStore};
use crate::ports::price_port::PriceStore;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Row};

const DATE_FORMAT: &str = "%Y-%m-%d";

const PREDICTION_COLUMNS: &str = "id, instrument, model, prediction_date, target_date,
    predicted_direction, predicted_price, predicted_change_percent, confidence,
    actual_direction, actual_price, baseline_price, actual_change_percent, is_correct,
    confidence_weighted_score, price_error_percent, trading_return";

const INDICATOR_COLUMNS: &str = "date, rsi14, macd, macd_signal, macd_histogram,
    sma20, sma50, sma200, ema12, ema26, bollinger_upper, bollinger_middle,
    bollinger_lower, stochastic_k, stochastic_d, atr14, adx14";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> ForecastError {
    ForecastError::Database {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> ForecastError {
    ForecastError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn conversion_error<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let s: String = row.get(idx)?;
    NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

fn price_from_row(row: &Row<'_>) -> rusqlite::Result<PricePoint> {
    Ok(PricePoint {
        date: date_column(row, 0)?,
        open: row.get(1)?,
        high: row.get(2)?,
        low: row.get(3)?,
        close: row.get(4)?,
        volume: row.get(5)?,
    })
}

fn prediction_from_row(row: &Row<'_>) -> rusqlite::Result<Prediction> {
    let direction: String = row.get(5)?;
    let predicted_direction = direction.parse::<Direction>().map_err(|e| conversion_error(5, e))?;

    let is_correct: Option<bool> = row.get(13)?;
    let enrichment = match is_correct {
        Some(is_correct) => {
            let actual: String = row.get(9)?;
            Some(Enrichment {
                actual_direction: actual.parse::<Outcome>().map_err(|e| conversion_error(9, e))?,
                actual_price: row.get(10)?,
                baseline_price: row.get(11)?,
                actual_change_percent: row.get(12)?,
                is_correct,
                confidence_weighted_score: row.get(14)?,
                price_error_percent: row.get(15)?,
                trading_return: row.get(16)?,
            })
        }
        None => None,
    };

    Ok(Prediction {
        id: row.get(0)?,
        instrument: row.get(1)?,
        model: row.get(2)?,
        prediction_date: date_column(row, 3)?,
        target_date: date_column(row, 4)?,
        predicted_direction,
        predicted_price: row.get(6)?,
        predicted_change_percent: row.get(7)?,
        confidence: row.get(8)?,
        enrichment,
    })
}

fn snapshot_from_row(row: &Row<'_>) -> rusqlite::Result<IndicatorSnapshot> {
    Ok(IndicatorSnapshot {
        date: date_column(row, 0)?,
        rsi14: row.get(1)?,
        macd: row.get(2)?,
        macd_signal: row.get(3)?,
        macd_histogram: row.get(4)?,
        sma20: row.get(5)?,
        sma50: row.get(6)?,
        sma200: row.get(7)?,
        ema12: row.get(8)?,
        ema26: row.get(9)?,
        bollinger_upper: row.get(10)?,
        bollinger_middle: row.get(11)?,
        bollinger_lower: row.get(12)?,
        stochastic_k: row.get(13)?,
        stochastic_d: row.get(14)?,
        atr14: row.get(15)?,
        adx14: row.get(16)?,
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ForecastError> {
        let db_path =
            config
                .get_string("database", "path")
                .ok_or_else(|| ForecastError::ConfigMissing {
                    section: "database".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("database", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, ForecastError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, ForecastError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), ForecastError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS instruments (
                ticker TEXT PRIMARY KEY,
                name TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS prices (
                ticker TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume INTEGER NOT NULL,
                PRIMARY KEY (ticker, date)
            );
            CREATE TABLE IF NOT EXISTS predictions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                instrument TEXT NOT NULL,
                model TEXT NOT NULL,
                prediction_date TEXT NOT NULL,
                target_date TEXT NOT NULL,
                predicted_direction TEXT NOT NULL,
                predicted_price REAL,
                predicted_change_percent REAL,
                confidence REAL NOT NULL,
                actual_direction TEXT,
                actual_price REAL,
                baseline_price REAL,
                actual_change_percent REAL,
                is_correct INTEGER,
                confidence_weighted_score REAL,
                price_error_percent REAL,
                trading_return REAL,
                CHECK (target_date > prediction_date),
                UNIQUE (instrument, model, prediction_date, target_date)
            );
            CREATE INDEX IF NOT EXISTS idx_predictions_target ON predictions(target_date);
            CREATE INDEX IF NOT EXISTS idx_predictions_instrument ON predictions(instrument);
            CREATE TABLE IF NOT EXISTS indicators (
                ticker TEXT NOT NULL,
                date TEXT NOT NULL,
                rsi14 REAL,
                macd REAL,
                macd_signal REAL,
                macd_histogram REAL,
                sma20 REAL,
                sma50 REAL,
                sma200 REAL,
                ema12 REAL,
                ema26 REAL,
                bollinger_upper REAL,
                bollinger_middle REAL,
                bollinger_lower REAL,
                stochastic_k REAL,
                stochastic_d REAL,
                atr14 REAL,
                adx14 REAL,
                PRIMARY KEY (ticker, date)
            );",
        )
        .map_err(query_error)?;

        Ok(())
    }

    /// Registers an instrument, updating its display name if it exists.
    pub fn insert_instrument(&self, instrument: &Instrument) -> Result<(), ForecastError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO instruments (ticker, name) VALUES (?1, ?2)
             ON CONFLICT(ticker) DO UPDATE SET name = excluded.name",
            params![instrument.ticker, instrument.name],
        )
        .map_err(query_error)?;
        Ok(())
    }

    /// Inserts price points for `ticker`. Points already recorded for a
    /// date are left untouched. Returns the number of new rows.
    pub fn insert_prices(&self, ticker: &str, points: &[PricePoint]) -> Result<usize, ForecastError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        let mut inserted = 0;
        for point in points {
            inserted += tx
                .execute(
                    "INSERT OR IGNORE INTO prices (ticker, date, open, high, low, close, volume)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        ticker,
                        format_date(point.date),
                        point.open,
                        point.high,
                        point.low,
                        point.close,
                        point.volume
                    ],
                )
                .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)?;
        Ok(inserted)
    }

    /// Validates and stores a new pending prediction, returning its id.
    /// A prediction already recorded for the same instrument, model and
    /// dates is left untouched and yields `None`.
    pub fn insert_prediction(
        &self,
        prediction: &NewPrediction,
    ) -> Result<Option<i64>, ForecastError> {
        prediction.validate()?;
        let conn = self.conn()?;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO predictions (instrument, model, prediction_date,
                    target_date, predicted_direction, predicted_price,
                    predicted_change_percent, confidence)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    normalize_ticker(&prediction.instrument),
                    prediction.model,
                    format_date(prediction.prediction_date),
                    format_date(prediction.target_date),
                    prediction.predicted_direction.to_string(),
                    prediction.predicted_price,
                    prediction.predicted_change_percent,
                    prediction.confidence
                ],
            )
            .map_err(query_error)?;
        Ok((inserted == 1).then(|| conn.last_insert_rowid()))
    }

    fn query_predictions<P: rusqlite::Params>(
        &self,
        where_clause: &str,
        params: P,
    ) -> Result<Vec<Prediction>, ForecastError> {
        let conn = self.conn()?;
        let query = format!(
            "SELECT {PREDICTION_COLUMNS} FROM predictions WHERE {where_clause}
             ORDER BY target_date ASC, prediction_date ASC, id ASC"
        );
        let mut stmt = conn.prepare(&query).map_err(query_error)?;
        let rows = stmt
            .query_map(params, prediction_from_row)
            .map_err(query_error)?;

        let mut predictions = Vec::new();
        for row in rows {
            predictions.push(row.map_err(query_error)?);
        }
        Ok(predictions)
    }
}

impl PriceStore for SqliteAdapter {
    fn list_instruments(&self) -> Result<Vec<Instrument>, ForecastError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT ticker, name FROM instruments ORDER BY ticker")
            .map_err(query_error)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Instrument {
                    ticker: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(query_error)?;

        let mut instruments = Vec::new();
        for row in rows {
            instruments.push(row.map_err(query_error)?);
        }
        Ok(instruments)
    }

    fn get_prices(&self, ticker: &str) -> Result<Vec<PricePoint>, ForecastError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT date, open, high, low, close, volume
                 FROM prices WHERE ticker = ?1 ORDER BY date ASC",
            )
            .map_err(query_error)?;
        let rows = stmt
            .query_map(params![ticker], price_from_row)
            .map_err(query_error)?;

        let mut points = Vec::new();
        for row in rows {
            points.push(row.map_err(query_error)?);
        }
        Ok(points)
    }

    fn get_price(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> Result<Option<PricePoint>, ForecastError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT date, open, high, low, close, volume
                 FROM prices WHERE ticker = ?1 AND date = ?2",
            )
            .map_err(query_error)?;
        let mut rows = stmt
            .query_map(params![ticker, format_date(date)], price_from_row)
            .map_err(query_error)?;
        rows.next().transpose().map_err(query_error)
    }

    fn get_price_on_or_before(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> Result<Option<PricePoint>, ForecastError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT date, open, high, low, close, volume
                 FROM prices WHERE ticker = ?1 AND date <= ?2
                 ORDER BY date DESC LIMIT 1",
            )
            .map_err(query_error)?;
        let mut rows = stmt
            .query_map(params![ticker, format_date(date)], price_from_row)
            .map_err(query_error)?;
        rows.next().transpose().map_err(query_error)
    }
}

impl PredictionStore for SqliteAdapter {
    fn pending_predictions(&self, before: NaiveDate) -> Result<Vec<Prediction>, ForecastError> {
        self.query_predictions(
            "is_correct IS NULL AND target_date < ?1",
            params![format_date(before)],
        )
    }

    fn resolved_predictions(
        &self,
        filter: &PredictionFilter,
    ) -> Result<Vec<Prediction>, ForecastError> {
        self.query_predictions(
            "is_correct IS NOT NULL
             AND (?1 IS NULL OR instrument = ?1)
             AND (?2 IS NULL OR model = ?2)",
            params![filter.instrument, filter.model],
        )
    }

    fn unresolved_predictions(&self, from: NaiveDate) -> Result<Vec<Prediction>, ForecastError> {
        self.query_predictions(
            "is_correct IS NULL AND target_date >= ?1",
            params![format_date(from)],
        )
    }

    fn save_enrichment(&self, id: i64, enrichment: &Enrichment) -> Result<bool, ForecastError> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE predictions SET
                    actual_direction = ?2,
                    actual_price = ?3,
                    baseline_price = ?4,
                    actual_change_percent = ?5,
                    is_correct = ?6,
                    confidence_weighted_score = ?7,
                    price_error_percent = ?8,
                    trading_return = ?9
                 WHERE id = ?1 AND is_correct IS NULL",
                params![
                    id,
                    enrichment.actual_direction.to_string(),
                    enrichment.actual_price,
                    enrichment.baseline_price,
                    enrichment.actual_change_percent,
                    enrichment.is_correct,
                    enrichment.confidence_weighted_score,
                    enrichment.price_error_percent,
                    enrichment.trading_return
                ],
            )
            .map_err(query_error)?;
        Ok(changed == 1)
    }
}

impl IndicatorStore for SqliteAdapter {
    fn upsert_indicator(
        &self,
        ticker: &str,
        snapshot: &IndicatorSnapshot,
    ) -> Result<(), ForecastError> {
        let conn = self.conn()?;
        let v = snapshot.values();
        conn.execute(
            &format!(
                "INSERT INTO indicators (ticker, {INDICATOR_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
                 ON CONFLICT(ticker, date) DO UPDATE SET
                    rsi14 = excluded.rsi14,
                    macd = excluded.macd,
                    macd_signal = excluded.macd_signal,
                    macd_histogram = excluded.macd_histogram,
                    sma20 = excluded.sma20,
                    sma50 = excluded.sma50,
                    sma200 = excluded.sma200,
                    ema12 = excluded.ema12,
                    ema26 = excluded.ema26,
                    bollinger_upper = excluded.bollinger_upper,
                    bollinger_middle = excluded.bollinger_middle,
                    bollinger_lower = excluded.bollinger_lower,
                    stochastic_k = excluded.stochastic_k,
                    stochastic_d = excluded.stochastic_d,
                    atr14 = excluded.atr14,
                    adx14 = excluded.adx14"
            ),
            params![
                ticker,
                format_date(snapshot.date),
                v[0],
                v[1],
                v[2],
                v[3],
                v[4],
                v[5],
                v[6],
                v[7],
                v[8],
                v[9],
                v[10],
                v[11],
                v[12],
                v[13],
                v[14],
                v[15]
            ],
        )
        .map_err(query_error)?;
        Ok(())
    }

    fn get_indicators(&self, ticker: &str) -> Result<Vec<IndicatorSnapshot>, ForecastError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {INDICATOR_COLUMNS} FROM indicators WHERE ticker = ?1 ORDER BY date ASC"
            ))
            .map_err(query_error)?;
        let rows = stmt
            .query_map(params![ticker], snapshot_from_row)
            .map_err(query_error)?;

        let mut snapshots = Vec::new();
        for row in rows {
            snapshots.push(row.map_err(query_error)?);
        }
        Ok(snapshots)
    }
}
