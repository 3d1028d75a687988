// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Serialize;

use crate::error::ErrorKind;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail_with;

/// A self-assessment on the half-integer scale 0.5, 1, 1.5, ..., 5.
///
/// Stored as a count of half points so comparisons and sums are exact.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: Rating = Rating(1);
    pub const MAX: Rating = Rating(10);

    pub fn new(value: f64) -> Fallible<Self> {
        let halves = value * 2.0;
        let range = Self::MIN.0 as f64..=Self::MAX.0 as f64;
        if !halves.is_finite() || halves.fract() != 0.0 || !range.contains(&halves) {
            return fail_with(
                ErrorKind::InvalidRating,
                format!("invalid rating: {value} (expected 0.5 to 5 in steps of 0.5)"),
            );
        }
        Ok(Self(halves as u8))
    }

    pub fn halves(self) -> u8 {
        self.0
    }

    pub fn value(self) -> f64 {
        self.0 as f64 / 2.0
    }

    /// Every valid rating, lowest first.
    pub fn all() -> impl Iterator<Item = Rating> {
        (Self::MIN.0..=Self::MAX.0).map(Rating)
    }
}

impl Display for Rating {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl FromStr for Rating {
    type Err = ErrorReport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s.trim().parse().map_err(|_| {
            ErrorReport::with_kind(ErrorKind::InvalidRating, format!("invalid rating: {s}"))
        })?;
        Rating::new(value)
    }
}

impl Serialize for Rating {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_f64(self.value())
    }
}

impl ToSql for Rating {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.value()))
    }
}

impl FromSql for Rating {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let value: f64 = FromSql::column_result(value)?;
        Rating::new(value).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ratings() -> Fallible<()> {
        assert_eq!(Rating::new(0.5)?, Rating::MIN);
        assert_eq!(Rating::new(5.0)?, Rating::MAX);
        assert_eq!(Rating::new(3.5)?.halves(), 7);
        assert_eq!(Rating::all().count(), 10);
        Ok(())
    }

    #[test]
    fn test_invalid_ratings() {
        for value in [0.0, 0.25, 5.5, -1.0, 3.3, f64::NAN, f64::INFINITY] {
            let err = Rating::new(value).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidRating);
        }
    }

    #[test]
    fn test_parse_and_display() -> Fallible<()> {
        let rating: Rating = "4.5".parse()?;
        assert_eq!(rating.to_string(), "4.5");
        let rating: Rating = "3".parse()?;
        assert_eq!(rating.to_string(), "3");
        assert!("good".parse::<Rating>().is_err());
        Ok(())
    }
}
