//! Parsers for the SoftM JSON schemas.
//!
//! SoftM serves rows with its own column names (`date`/`time`/`temp` for the
//! forecast, `temp`/`t1`/`t2` for the temperature graph) and occasionally
//! sends numbers as strings with a comma decimal separator. These parsers
//! normalize all of that into the canonical shapes from `common`.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use common::source::WeatherParser;
use common::types::{TempGraphPoint, TimePoint};
use common::Error;
use serde::Deserialize;
use tracing::debug;

/// Weather row as served by `getPrognozT`.
#[derive(Debug, Deserialize)]
struct SoftMWeatherRow {
    date: String,
    time: String,
    temp: serde_json::Value, // number, or string with a comma decimal
}

/// Temperature-graph row as served by `getTempGraphic`.
#[derive(Debug, Deserialize)]
struct SoftMTempGraphRow {
    #[serde(rename = "temp")]
    outdoor_t: serde_json::Value,
    #[serde(rename = "t1")]
    home_in_t: serde_json::Value,
    #[serde(rename = "t2")]
    home_out_t: serde_json::Value,
}

fn parse_softm_number(value: &serde_json::Value, field: &str) -> Result<f64, Error> {
    match value {
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::ForecastSource(format!("{} is not a float: {}", field, n))),
        serde_json::Value::String(s) => s
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|e| Error::ForecastSource(format!("bad {} value {:?}: {}", field, s, e))),
        other => Err(Error::ForecastSource(format!(
            "unexpected {} value: {}",
            field, other
        ))),
    }
}

fn parse_softm_date(raw: &str) -> Result<NaiveDate, Error> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    // Some deployments send a full datetime in the date column.
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .map(|dt| dt.date())
        .map_err(|e| Error::ForecastSource(format!("bad date value {:?}: {}", raw, e)))
}

/// Parses the SoftM weather payload into the canonical series shape.
///
/// The forecast date and wall-clock time come in separate columns, both in
/// the server's local time; the configured offset makes them absolute.
#[derive(Debug, Clone)]
pub struct SoftMWeatherParser {
    server_offset: FixedOffset,
}

impl SoftMWeatherParser {
    pub fn new(server_offset: FixedOffset) -> Self {
        Self { server_offset }
    }

    fn combine(&self, date: &str, time: &str) -> Result<DateTime<FixedOffset>, Error> {
        let date = parse_softm_date(date)?;
        let time = NaiveTime::parse_from_str(time.trim(), "%H:%M:%S")
            .map_err(|e| Error::ForecastSource(format!("bad time value {:?}: {}", time, e)))?;

        NaiveDateTime::new(date, time)
            .and_local_timezone(self.server_offset)
            .single()
            .ok_or_else(|| {
                Error::ForecastSource(format!("unrepresentable timestamp {} {}", date, time))
            })
    }
}

impl WeatherParser for SoftMWeatherParser {
    fn parse_weather(&self, raw: &str) -> Result<Vec<TimePoint>, Error> {
        let rows: Vec<SoftMWeatherRow> = serde_json::from_str(raw)?;

        let mut points = Vec::with_capacity(rows.len());
        for row in &rows {
            let timestamp = self.combine(&row.date, &row.time)?;
            let value = parse_softm_number(&row.temp, "temp")?;
            points.push(TimePoint::new(timestamp, value));
        }

        debug!("Parsed {} weather rows", points.len());
        Ok(points)
    }
}

/// Parses the SoftM temperature-graph payload into canonical graph rows.
#[derive(Debug, Clone, Default)]
pub struct SoftMTempGraphParser;

impl SoftMTempGraphParser {
    pub fn parse_temp_graph(&self, raw: &str) -> Result<Vec<TempGraphPoint>, Error> {
        let rows: Vec<SoftMTempGraphRow> = serde_json::from_str(raw)?;

        let points = rows
            .iter()
            .map(|row| {
                Ok(TempGraphPoint {
                    outdoor_t: parse_softm_number(&row.outdoor_t, "temp")?,
                    home_in_t: parse_softm_number(&row.home_in_t, "t1")?,
                    home_out_t: parse_softm_number(&row.home_out_t, "t2")?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        debug!("Parsed {} temp graph rows", points.len());
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yekt() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600).unwrap()
    }

    #[test]
    fn parses_weather_rows_with_numeric_and_comma_temps() {
        let raw = r#"[
            {"date": "2021-01-30", "time": "00:00:00", "temp": -5.5},
            {"date": "2021-01-30", "time": "01:00:00", "temp": "-6,1"}
        ]"#;

        let points = SoftMWeatherParser::new(yekt()).parse_weather(raw).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].value, -5.5);
        assert_eq!(points[1].value, -6.1);
        assert_eq!(points[0].timestamp.to_rfc3339(), "2021-01-30T00:00:00+05:00");
        assert_eq!(points[1].timestamp.to_rfc3339(), "2021-01-30T01:00:00+05:00");
    }

    #[test]
    fn accepts_full_datetime_in_date_column() {
        let raw = r#"[{"date": "2021-01-30T00:00:00", "time": "03:00:00", "temp": 1.0}]"#;

        let points = SoftMWeatherParser::new(yekt()).parse_weather(raw).unwrap();

        assert_eq!(points[0].timestamp.to_rfc3339(), "2021-01-30T03:00:00+05:00");
    }

    #[test]
    fn rejects_unparseable_time() {
        let raw = r#"[{"date": "2021-01-30", "time": "3 am", "temp": 1.0}]"#;

        let err = SoftMWeatherParser::new(yekt()).parse_weather(raw).unwrap_err();
        assert!(matches!(err, Error::ForecastSource(_)));
    }

    #[test]
    fn parses_temp_graph_rows() {
        let raw = r#"[
            {"temp": -30.0, "t1": "86,5", "t2": 70.0},
            {"temp": 10.0, "t1": 35.0, "t2": 30.0}
        ]"#;

        let points = SoftMTempGraphParser.parse_temp_graph(raw).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].outdoor_t, -30.0);
        assert_eq!(points[0].home_in_t, 86.5);
        assert_eq!(points[1].home_out_t, 30.0);
    }
}
