//! Error types shared by the MongoDB storage implementation.

use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;

/// Convenient result alias returning [`MongoDaoError`] failures.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Server error code reported on unique index violations.
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to write {entity} `{id}`")]
    Write {
        entity: &'static str,
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("{entity} `{id}` already exists")]
    Duplicate { entity: &'static str, id: String },
    #[error("failed to load {entity} `{id}`")]
    Load {
        entity: &'static str,
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("stored {entity} `{id}` is malformed: {reason}")]
    Malformed {
        entity: &'static str,
        id: String,
        reason: String,
    },
}

impl MongoDaoError {
    /// Build a write error, classifying unique index violations as duplicates.
    pub fn write(entity: &'static str, id: impl Into<String>, source: MongoError) -> Self {
        let id = id.into();
        if is_duplicate_key(&source) {
            MongoDaoError::Duplicate { entity, id }
        } else {
            MongoDaoError::Write { entity, id, source }
        }
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(command) => command.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}
