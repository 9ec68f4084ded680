//! Named, date-keyed indicator output

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Chronologically ordered indicator values, e.g. "SMA20" or "RSI14"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries<T> {
    name: String,
    points: BTreeMap<NaiveDate, T>,
}

impl<T> IndicatorSeries<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: BTreeMap::new(),
        }
    }

    /// An empty series, returned when the input cannot support the indicator
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn insert(&mut self, date: NaiveDate, value: T) {
        self.points.insert(date, value);
    }

    pub fn get(&self, date: &NaiveDate) -> Option<&T> {
        self.points.get(date)
    }

    /// Most recent point
    pub fn latest(&self) -> Option<(&NaiveDate, &T)> {
        self.points.iter().next_back()
    }

    pub fn latest_value(&self) -> Option<&T> {
        self.points.values().next_back()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &T)> {
        self.points.iter()
    }

    pub fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.points.keys()
    }
}

impl<T> FromIterator<(NaiveDate, T)> for IndicatorSeries<T> {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, T)>>(iter: I) -> Self {
        Self {
            name: String::new(),
            points: iter.into_iter().collect(),
        }
    }
}

impl<T> IndicatorSeries<T> {
    /// Rename, used after collecting from an iterator
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_is_last_date() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let mut series = IndicatorSeries::new("SMA2");
        series.insert(d(3), 3.0);
        series.insert(d(1), 1.0);
        series.insert(d(2), 2.0);

        assert_eq!(series.name(), "SMA2");
        assert_eq!(series.len(), 3);
        assert_eq!(series.latest(), Some((&d(3), &3.0)));
        assert_eq!(series.get(&d(2)), Some(&2.0));
        let dates: Vec<_> = series.dates().copied().collect();
        assert_eq!(dates, vec![d(1), d(2), d(3)]);
    }

    #[test]
    fn test_empty_series() {
        let series: IndicatorSeries<f64> = IndicatorSeries::empty("RSI14");
        assert!(series.is_empty());
        assert!(series.latest_value().is_none());
    }
}
