// In: src/column/statistics.rs

//! Running per-column statistics.
//!
//! Each accumulator keeps one `ColumnStatistics` for the open stripe. When the
//! stripe is flushed that snapshot is written into the stripe footer and merged
//! into the file-level statistics, which end up in the file footer.

use serde::{Deserialize, Serialize};

use crate::types::TypeKind;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TypedStatistics {
    /// Structural columns carry counts only.
    None,
    Integer {
        minimum: Option<i64>,
        maximum: Option<i64>,
        /// `None` once the running sum has overflowed.
        sum: Option<i64>,
    },
    Double {
        minimum: Option<f64>,
        maximum: Option<f64>,
        /// `None` once the running sum is no longer finite.
        sum: Option<f64>,
    },
    String {
        minimum: Option<String>,
        maximum: Option<String>,
        /// Total length in bytes.
        sum: u64,
    },
    Boolean {
        true_count: u64,
    },
    Date {
        minimum: Option<i64>,
        maximum: Option<i64>,
    },
    Timestamp {
        minimum_millis: Option<i64>,
        maximum_millis: Option<i64>,
    },
    Decimal {
        scale: u32,
        minimum: Option<i128>,
        maximum: Option<i128>,
        sum: Option<i128>,
    },
    Binary {
        /// Total length in bytes.
        sum: u64,
    },
}

impl TypedStatistics {
    /// The empty statistics for a column of `kind`. `scale` only matters for
    /// decimals.
    pub fn for_kind(kind: TypeKind, scale: u32) -> Self {
        match kind {
            kind if kind.is_integer() => TypedStatistics::Integer {
                minimum: None,
                maximum: None,
                sum: Some(0),
            },
            kind if kind.is_string_like() => TypedStatistics::String {
                minimum: None,
                maximum: None,
                sum: 0,
            },
            TypeKind::Float | TypeKind::Double => TypedStatistics::Double {
                minimum: None,
                maximum: None,
                sum: Some(0.0),
            },
            TypeKind::Boolean => TypedStatistics::Boolean { true_count: 0 },
            TypeKind::Date => TypedStatistics::Date {
                minimum: None,
                maximum: None,
            },
            TypeKind::Timestamp => TypedStatistics::Timestamp {
                minimum_millis: None,
                maximum_millis: None,
            },
            TypeKind::Decimal => TypedStatistics::Decimal {
                scale,
                minimum: None,
                maximum: None,
                sum: Some(0),
            },
            TypeKind::Binary => TypedStatistics::Binary { sum: 0 },
            // Struct, list and map.
            _ => TypedStatistics::None,
        }
    }
}

fn merge_min<T: PartialOrd + Clone>(slot: &mut Option<T>, candidate: &Option<T>) {
    if let Some(c) = candidate {
        if slot.as_ref().map_or(true, |s| c < s) {
            *slot = Some(c.clone());
        }
    }
}

fn merge_max<T: PartialOrd + Clone>(slot: &mut Option<T>, candidate: &Option<T>) {
    if let Some(c) = candidate {
        if slot.as_ref().map_or(true, |s| c > s) {
            *slot = Some(c.clone());
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ColumnStatistics {
    /// Non-null values seen.
    pub number_of_values: u64,
    pub null_count: u64,
    pub typed: TypedStatistics,
}

impl ColumnStatistics {
    pub fn new(kind: TypeKind, scale: u32) -> Self {
        Self {
            number_of_values: 0,
            null_count: 0,
            typed: TypedStatistics::for_kind(kind, scale),
        }
    }

    pub fn has_null(&self) -> bool {
        self.null_count > 0
    }

    pub(crate) fn record_null(&mut self) {
        self.null_count += 1;
    }

    /// Counts one present value that carries no typed statistics.
    pub(crate) fn record_present(&mut self) {
        self.number_of_values += 1;
    }

    pub(crate) fn record_integer(&mut self, v: i64) {
        self.number_of_values += 1;
        match &mut self.typed {
            TypedStatistics::Integer {
                minimum,
                maximum,
                sum,
            } => {
                merge_min(minimum, &Some(v));
                merge_max(maximum, &Some(v));
                *sum = sum.and_then(|s| s.checked_add(v));
            }
            TypedStatistics::Date { minimum, maximum } => {
                merge_min(minimum, &Some(v));
                merge_max(maximum, &Some(v));
            }
            _ => {}
        }
    }

    /// Records a floating-point value. NaN and infinities count towards
    /// `number_of_values` but never become the minimum or maximum.
    pub(crate) fn record_double(&mut self, v: f64) {
        self.number_of_values += 1;
        if let TypedStatistics::Double {
            minimum,
            maximum,
            sum,
        } = &mut self.typed
        {
            if v.is_finite() {
                merge_min(minimum, &Some(v));
                merge_max(maximum, &Some(v));
            }
            *sum = sum.map(|s| s + v).filter(|s| s.is_finite());
        }
    }

    pub(crate) fn record_bytes(&mut self, v: &[u8]) {
        self.number_of_values += 1;
        match &mut self.typed {
            TypedStatistics::String {
                minimum,
                maximum,
                sum,
            } => {
                let text = Some(String::from_utf8_lossy(v).into_owned());
                merge_min(minimum, &text);
                merge_max(maximum, &text);
                *sum += v.len() as u64;
            }
            TypedStatistics::Binary { sum } => *sum += v.len() as u64,
            _ => {}
        }
    }

    pub(crate) fn record_boolean(&mut self, v: bool) {
        self.number_of_values += 1;
        if let TypedStatistics::Boolean { true_count } = &mut self.typed {
            *true_count += u64::from(v);
        }
    }

    pub(crate) fn record_timestamp_millis(&mut self, millis: i64) {
        self.number_of_values += 1;
        if let TypedStatistics::Timestamp {
            minimum_millis,
            maximum_millis,
        } = &mut self.typed
        {
            merge_min(minimum_millis, &Some(millis));
            merge_max(maximum_millis, &Some(millis));
        }
    }

    pub(crate) fn record_decimal(&mut self, unscaled: i128) {
        self.number_of_values += 1;
        if let TypedStatistics::Decimal {
            minimum,
            maximum,
            sum,
            ..
        } = &mut self.typed
        {
            merge_min(minimum, &Some(unscaled));
            merge_max(maximum, &Some(unscaled));
            *sum = sum.and_then(|s| s.checked_add(unscaled));
        }
    }

    /// Folds `other` (statistics of the same column) into `self`.
    pub fn merge(&mut self, other: &ColumnStatistics) {
        self.number_of_values += other.number_of_values;
        self.null_count += other.null_count;
        match (&mut self.typed, &other.typed) {
            (
                TypedStatistics::Integer {
                    minimum,
                    maximum,
                    sum,
                },
                TypedStatistics::Integer {
                    minimum: o_min,
                    maximum: o_max,
                    sum: o_sum,
                },
            ) => {
                merge_min(minimum, o_min);
                merge_max(maximum, o_max);
                *sum = sum.zip(*o_sum).and_then(|(a, b)| a.checked_add(b));
            }
            (
                TypedStatistics::Double {
                    minimum,
                    maximum,
                    sum,
                },
                TypedStatistics::Double {
                    minimum: o_min,
                    maximum: o_max,
                    sum: o_sum,
                },
            ) => {
                merge_min(minimum, o_min);
                merge_max(maximum, o_max);
                *sum = sum.zip(*o_sum).map(|(a, b)| a + b).filter(|s| s.is_finite());
            }
            (
                TypedStatistics::String {
                    minimum,
                    maximum,
                    sum,
                },
                TypedStatistics::String {
                    minimum: o_min,
                    maximum: o_max,
                    sum: o_sum,
                },
            ) => {
                merge_min(minimum, o_min);
                merge_max(maximum, o_max);
                *sum += o_sum;
            }
            (
                TypedStatistics::Boolean { true_count },
                TypedStatistics::Boolean { true_count: other },
            ) => *true_count += other,
            (
                TypedStatistics::Date { minimum, maximum },
                TypedStatistics::Date {
                    minimum: o_min,
                    maximum: o_max,
                },
            ) => {
                merge_min(minimum, o_min);
                merge_max(maximum, o_max);
            }
            (
                TypedStatistics::Timestamp {
                    minimum_millis,
                    maximum_millis,
                },
                TypedStatistics::Timestamp {
                    minimum_millis: o_min,
                    maximum_millis: o_max,
                },
            ) => {
                merge_min(minimum_millis, o_min);
                merge_max(maximum_millis, o_max);
            }
            (
                TypedStatistics::Decimal {
                    minimum,
                    maximum,
                    sum,
                    ..
                },
                TypedStatistics::Decimal {
                    minimum: o_min,
                    maximum: o_max,
                    sum: o_sum,
                    ..
                },
            ) => {
                merge_min(minimum, o_min);
                merge_max(maximum, o_max);
                *sum = sum.zip(*o_sum).and_then(|(a, b)| a.checked_add(b));
            }
            (TypedStatistics::Binary { sum }, TypedStatistics::Binary { sum: o_sum }) => {
                *sum += o_sum
            }
            _ => {}
        }
    }
}
