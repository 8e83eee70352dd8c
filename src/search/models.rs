//! Search query model

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Rejected search input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("{field} must be a 3-letter airport code, got {value:?}")]
    InvalidCode { field: &'static str, value: String },
    #[error("{field} must be a YYYY-MM-DD date, got {value:?}")]
    InvalidDate { field: &'static str, value: String },
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

/// Validated route and travel dates broadcast to every provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SearchQuery {
    origin: String,
    destination: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl SearchQuery {
    /// Build a query. Airport codes are upper-cased.
    pub fn new(
        origin: &str,
        destination: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, QueryError> {
        let origin = parse_code("origin", origin)?;
        let destination = parse_code("destination", destination)?;
        if end_date < start_date {
            return Err(QueryError::EndBeforeStart {
                start: start_date,
                end: end_date,
            });
        }

        Ok(Self {
            origin,
            destination,
            start_date,
            end_date,
        })
    }

    /// Build a query from raw strings. A missing end date means a same-day return.
    pub fn parse(
        origin: &str,
        destination: &str,
        start_date: &str,
        end_date: Option<&str>,
    ) -> Result<Self, QueryError> {
        let start = parse_date("start_date", start_date)?;
        let end = match end_date {
            Some(raw) if !raw.trim().is_empty() => parse_date("end_date", raw)?,
            _ => start,
        };
        Self::new(origin, destination, start, end)
    }

    /// Parse a `ORIGIN|DEST|START[|END]` route string
    pub fn from_route(route: &str) -> Result<Self, QueryError> {
        let parts: Vec<&str> = route.split('|').collect();
        match parts.as_slice() {
            [origin, destination, start] => Self::parse(origin, destination, start, None),
            [origin, destination, start, end, ..] => {
                Self::parse(origin, destination, start, Some(end))
            }
            _ => Err(QueryError::InvalidCode {
                field: "route",
                value: route.to_string(),
            }),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Human-readable route, e.g. `GRU->JFK`
    pub fn route(&self) -> String {
        format!("{}->{}", self.origin, self.destination)
    }

    /// Cache key at day granularity: `ORIGIN|DEST|START|END`
    pub fn cache_key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.origin,
            self.destination,
            self.start_date.format(DATE_FORMAT),
            self.end_date.format(DATE_FORMAT)
        )
    }
}

fn parse_code(field: &'static str, value: &str) -> Result<String, QueryError> {
    let code = value.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(QueryError::InvalidCode {
            field,
            value: value.to_string(),
        });
    }
    Ok(code.to_ascii_uppercase())
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, QueryError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| QueryError::InvalidDate {
        field,
        value: value.to_string(),
    })
}
