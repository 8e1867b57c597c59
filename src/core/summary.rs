//! Derived summary types served from the cache

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Price and sentiment averages sharing one aggregation bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedPoint {
    pub time: DateTime<Utc>,
    pub price: f64,
    pub sentiment: f64,
}

/// Which value of an [`AggregatedPoint`] a trend is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Price,
    Sentiment,
}

impl Field {
    pub fn of(&self, point: &AggregatedPoint) -> f64 {
        match self {
            Field::Price => point.price,
            Field::Sentiment => point.sentiment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Falling,
    Flat,
}

impl Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TrendDirection::Rising => "rising",
                TrendDirection::Falling => "falling",
                TrendDirection::Flat => "flat",
            }
        )
    }
}

impl TrendDirection {
    /// Compares the first and last point of `points` on `field`.
    pub fn of(points: &[AggregatedPoint], field: Field) -> Self {
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return TrendDirection::Flat;
        };
        let (first, last) = (field.of(first), field.of(last));
        if last > first {
            TrendDirection::Rising
        } else if last < first {
            TrendDirection::Falling
        } else {
            TrendDirection::Flat
        }
    }
}

/// The aggregation result kept in the cache slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub hourly_average_of_averages: Vec<AggregatedPoint>,
    pub sentiment_direction: TrendDirection,
    pub price_direction: TrendDirection,
}

impl CacheEntry {
    pub fn from_points(points: Vec<AggregatedPoint>) -> Self {
        Self {
            sentiment_direction: TrendDirection::of(&points, Field::Sentiment),
            price_direction: TrendDirection::of(&points, Field::Price),
            hourly_average_of_averages: points,
        }
    }
}
