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

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Serialize;

use crate::error::ErrorKind;
use crate::error::Fallible;
use crate::error::fail_with;
use crate::types::card::Card;

/// Number of hex digits kept when deriving an id from a set name.
const DERIVED_ID_LEN: usize = 16;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SetId(String);

impl SetId {
    pub fn new(id: impl Into<String>) -> Fallible<Self> {
        let id: String = id.into();
        let id = id.trim();
        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return fail_with(ErrorKind::InvalidInput, format!("invalid set id: {id:?}"));
        }
        Ok(Self(id.to_string()))
    }

    /// Derive a stable id from a set's name, so that re-importing a set
    /// keeps its history.
    pub fn from_name(name: &str) -> Self {
        let hash = blake3::hash(name.trim().as_bytes());
        Self(hash.to_hex()[..DERIVED_ID_LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SetId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for SetId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl ToSql for SetId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for SetId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        SetId::new(string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// A named, ordered sequence of cards.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Set {
    pub id: SetId,
    pub name: String,
    pub cards: Vec<Card>,
}

impl Set {
    pub fn new(id: SetId, name: impl Into<String>, cards: Vec<Card>) -> Self {
        Self {
            id,
            name: name.into(),
            cards,
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
