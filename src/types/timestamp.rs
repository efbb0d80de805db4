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

use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::TimeDelta;
use chrono::Utc;
use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Serialize;

use crate::error::ErrorReport;

/// 9999-12-31T23:59:59.999999Z, the last instant with a four-digit year.
const LATEST_SECONDS: i64 = 253_402_300_799;
const LATEST_NANOS: u32 = 999_999_000;

/// An instant in time, in UTC.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn new(ts: DateTime<Utc>) -> Self {
        Self(ts)
    }

    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }

    /// The last representable timestamp. Later instants would not keep the
    /// text form fixed-width.
    pub fn latest() -> Self {
        let latest = DateTime::from_timestamp(LATEST_SECONDS, LATEST_NANOS);
        Self(latest.unwrap_or(DateTime::<Utc>::MAX_UTC))
    }

    /// The instant `days` whole days after this one, saturating at
    /// [`Timestamp::latest`].
    pub fn plus_days(self, days: u32) -> Self {
        let latest = Self::latest();
        match self.0.checked_add_signed(TimeDelta::days(i64::from(days))) {
            Some(ts) => Self(ts).min(latest),
            None => latest,
        }
    }

    /// The time elapsed from `earlier` to this instant.
    pub fn since(self, earlier: Timestamp) -> TimeDelta {
        self.0 - earlier.0
    }

    /// Fixed-width RFC 3339, so that the text form sorts chronologically.
    pub fn to_rfc3339(self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M"))
    }
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_rfc3339()))
    }
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        let ts = DateTime::parse_from_rfc3339(&string).map_err(|e| {
            let report = ErrorReport::new(format!("invalid timestamp '{string}': {e}"));
            FromSqlError::Other(Box::new(report))
        })?;
        let ts = ts.with_timezone(&Utc);
        Ok(Timestamp(ts))
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_rfc3339())
    }
}
