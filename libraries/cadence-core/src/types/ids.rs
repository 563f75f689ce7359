/// ID types for Cadence entities
use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(feature = "sqlx-support")]
use sqlx::{
    encode::IsNull,
    error::BoxDynError,
    sqlite::{SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef},
    Decode, Encode, Sqlite, Type,
};

/// Track identifier (SQLite rowid)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(i64);

impl TrackId {
    /// Create a track ID from a raw rowid
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw rowid
    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for TrackId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "sqlx-support")]
impl Type<Sqlite> for TrackId {
    fn type_info() -> SqliteTypeInfo {
        <i64 as Type<Sqlite>>::type_info()
    }
}

#[cfg(feature = "sqlx-support")]
impl<'q> Encode<'q, Sqlite> for TrackId {
    fn encode_by_ref(
        &self,
        args: &mut Vec<SqliteArgumentValue<'q>>,
    ) -> Result<IsNull, BoxDynError> {
        <i64 as Encode<Sqlite>>::encode_by_ref(&self.0, args)
    }
}

#[cfg(feature = "sqlx-support")]
impl<'r> Decode<'r, Sqlite> for TrackId {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        let id = <i64 as Decode<Sqlite>>::decode(value)?;
        Ok(TrackId(id))
    }
}

/// Playlist identifier (SQLite rowid)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(i64);

impl PlaylistId {
    /// Create a playlist ID from a raw rowid
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw rowid
    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for PlaylistId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "sqlx-support")]
impl Type<Sqlite> for PlaylistId {
    fn type_info() -> SqliteTypeInfo {
        <i64 as Type<Sqlite>>::type_info()
    }
}

#[cfg(feature = "sqlx-support")]
impl<'q> Encode<'q, Sqlite> for PlaylistId {
    fn encode_by_ref(
        &self,
        args: &mut Vec<SqliteArgumentValue<'q>>,
    ) -> Result<IsNull, BoxDynError> {
        <i64 as Encode<Sqlite>>::encode_by_ref(&self.0, args)
    }
}

#[cfg(feature = "sqlx-support")]
impl<'r> Decode<'r, Sqlite> for PlaylistId {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        let id = <i64 as Decode<Sqlite>>::decode(value)?;
        Ok(PlaylistId(id))
    }
}
