//! Stored-value format for a consent record: percent-escaped JSON.

use std::string::FromUtf8Error;

use thiserror::Error;

use crate::state::ConsentRecord;

/// Why a stored value could not be turned back into a record.
///
/// Never surfaced past the persistence layer: an undecodable value means
/// "no consent yet".
#[derive(Error, Debug)]
pub enum RecordDecodeError {
    #[error("stored value is not valid percent-encoded UTF-8: {0}")]
    Escape(#[from] FromUtf8Error),

    #[error("stored value is not a consent record: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn encode_record(record: &ConsentRecord) -> String {
    // Serializing plain structs and string-keyed maps cannot fail.
    let json = serde_json::to_string(record).unwrap_or_default();
    urlencoding::encode(&json).into_owned()
}

pub fn decode_record(raw: &str) -> Result<ConsentRecord, RecordDecodeError> {
    let json = urlencoding::decode(raw)?;
    let mut record: ConsentRecord = serde_json::from_str(&json)?;
    if !record.categories.necessary {
        tracing::debug!("stored consent record had necessary=false; normalizing");
        record.categories = record.categories.normalized();
    }
    Ok(record)
}
