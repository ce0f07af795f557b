//! Ingested records and the write commands they become.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;

/// Insert used for every ingested post. Duplicate ids fail on the primary key.
pub const INSERT_POST_SQL: &str = r#"
    INSERT INTO post_history (id, post_time, flair, url, author, num_comments)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#;

/// Text layout of the `post_time` column.
pub const POST_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One ingested item, destined for one `post_history` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// External item identifier; primary key of the row.
    pub id: String,
    pub observed_at: DateTime<Utc>,
    /// Flair or category. `None` and empty are both stored as NULL.
    pub category: Option<String>,
    pub url: String,
    pub author: String,
    pub comment_count: u32,
}

impl Record {
    pub fn new(
        id: impl Into<String>,
        observed_at: DateTime<Utc>,
        category: Option<String>,
        url: impl Into<String>,
        author: impl Into<String>,
        comment_count: u32,
    ) -> Self {
        Self {
            id: id.into(),
            observed_at,
            category,
            url: url.into(),
            author: author.into(),
            comment_count,
        }
    }

    /// `post_time` column value.
    pub fn post_time(&self) -> String {
        self.observed_at.format(POST_TIME_FORMAT).to_string()
    }
}

/// A prepared unit of work: one statement and its positional parameters.
///
/// Owned by the write queue until dequeued, then executed once and dropped
/// whatever the outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteCommand {
    pub statement: String,
    pub params: Vec<Value>,
}

impl WriteCommand {
    pub fn new(statement: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            statement: statement.into(),
            params,
        }
    }
}

impl From<Record> for WriteCommand {
    fn from(record: Record) -> Self {
        let post_time = record.post_time();
        let flair = match record.category {
            Some(flair) if !flair.is_empty() => Value::Text(flair),
            _ => Value::Null,
        };

        WriteCommand::new(
            INSERT_POST_SQL,
            vec![
                Value::Text(record.id),
                Value::Text(post_time),
                flair,
                Value::Text(record.url),
                Value::Text(record.author),
                Value::Integer(i64::from(record.comment_count)),
            ],
        )
    }
}
