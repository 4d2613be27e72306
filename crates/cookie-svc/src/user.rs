//! The structured record stored in the encrypted demo cookie.

use common::protocol::UserResponse;
use cookie_codec::{CookieRecord, Record, RecordError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub age: i64,
}

impl Default for User {
    fn default() -> Self {
        Self {
            name: "Alice".into(),
            age: 21,
        }
    }
}

impl CookieRecord for User {
    fn to_record(&self) -> Record {
        Record::new()
            .with("Name", self.name.as_str())
            .with("Age", self.age)
    }

    fn from_record(record: &Record) -> Result<Self, RecordError> {
        Ok(Self {
            name: record.text("Name")?.to_owned(),
            age: record.int("Age")?,
        })
    }
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            name: u.name,
            age: u.age,
        }
    }
}
