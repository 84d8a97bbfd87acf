//! Chart series: raw aggregate rows in, chart-ready JSON arrays out.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use sqlx::FromRow;

use crate::catalog::{ChartSpec, ValueKind};
use crate::errors::AppError;

/// Raw row produced by [`ChartSpec::sql`]. Both columns arrive as text.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct AggregateRow {
    pub label: Option<String>,
    pub value: Option<String>,
}

impl AggregateRow {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            value: Some(value.into()),
        }
    }
}

/// Numeric aggregate, serialized as a bare JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(i64),
    Amount(f64),
}

impl MetricValue {
    /// Parse a text-encoded aggregate according to its declared kind.
    /// Integers beyond `i64` degrade to a lossy `Amount`.
    pub fn parse(kind: ValueKind, raw: &str) -> Result<Self, AppError> {
        let raw = raw.trim();
        match kind {
            ValueKind::Integer => match raw.parse::<i64>() {
                Ok(count) => Ok(Self::Count(count)),
                Err(_) if is_integer_literal(raw) => Self::parse(ValueKind::Decimal, raw),
                Err(_) => Err(AppError::Mapping(format!("{raw:?} is not an integer"))),
            },
            ValueKind::Decimal => match raw.parse::<f64>() {
                Ok(amount) if amount.is_finite() => Ok(Self::Amount(amount)),
                _ => Err(AppError::Mapping(format!("{raw:?} is not a finite number"))),
            },
        }
    }
}

fn is_integer_literal(raw: &str) -> bool {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// One labelled point of a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub label: String,
    pub value: MetricValue,
}

/// Ordered chart points plus the JSON keys they are published under.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label_field: &'static str,
    pub value_field: &'static str,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    /// Map aggregate rows into a series, keeping row order. Any NULL or
    /// unparsable column fails the whole series.
    pub fn from_rows(spec: &ChartSpec, rows: Vec<AggregateRow>) -> Result<Self, AppError> {
        let kind = spec.metric.value_kind();
        let points = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| -> Result<ChartPoint, AppError> {
                let label = row.label.ok_or_else(|| {
                    AppError::Mapping(format!(
                        "{}: row {index} has a NULL {}",
                        spec.chart.slug(),
                        spec.label_field
                    ))
                })?;
                let raw = row.value.ok_or_else(|| {
                    AppError::Mapping(format!(
                        "{}: row {index} has a NULL {}",
                        spec.chart.slug(),
                        spec.value_field
                    ))
                })?;
                let value = MetricValue::parse(kind, &raw).map_err(|e| {
                    AppError::Mapping(format!(
                        "{}: row {index} {}: {e}",
                        spec.chart.slug(),
                        spec.value_field
                    ))
                })?;
                Ok(ChartPoint { label, value })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            label_field: spec.label_field,
            value_field: spec.value_field,
            points,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Serialize for ChartSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.points.len()))?;
        for point in &self.points {
            seq.serialize_element(&PointEntry {
                label_field: self.label_field,
                value_field: self.value_field,
                point,
            })?;
        }
        seq.end()
    }
}

struct PointEntry<'a> {
    label_field: &'static str,
    value_field: &'static str,
    point: &'a ChartPoint,
}

impl Serialize for PointEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(self.label_field, &self.point.label)?;
        map.serialize_entry(self.value_field, &self.point.value)?;
        map.end()
    }
}
