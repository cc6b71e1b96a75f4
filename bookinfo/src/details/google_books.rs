//! Mapping from the Google Books volumes API into [`BookDetails`].

use client::types::BookDetails;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ServiceError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    pub authors: Vec<String>,
    pub published_date: String,
    pub page_count: i32,
    pub publisher: String,
    pub language: String,
    pub print_type: String,
    #[serde(default)]
    pub industry_identifiers: Vec<IndustryIdentifier>,
}

#[derive(Debug, Deserialize)]
pub struct IndustryIdentifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub identifier: String,
}

/// `items[0].volumeInfo` of a volumes search result.
fn first_volume_info(payload: &Value) -> Result<&Value, ServiceError> {
    payload
        .get("items")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .and_then(|item| item.get("volumeInfo"))
        .filter(|info| info.is_object())
        .ok_or_else(|| {
            ServiceError::SchemaMismatch(
                "book service response has no items[0].volumeInfo object".to_string(),
            )
        })
}

/// Maps a volumes search result onto the details of `product_id`.
pub fn book_details(product_id: i64, payload: &Value) -> Result<BookDetails, ServiceError> {
    let info = VolumeInfo::deserialize(first_volume_info(payload)?).map_err(volume_info_error)?;
    to_book_details(product_id, info)
}

/// An absent field is an incomplete answer, a field of the wrong type or shape is a mismatch.
fn volume_info_error(e: serde_json::Error) -> ServiceError {
    let message = e.to_string();
    if message.starts_with("missing field") {
        ServiceError::UpstreamFailure(format!(
            "book service response is incomplete: {message}"
        ))
    } else {
        ServiceError::SchemaMismatch(format!(
            "book service response has unexpected volumeInfo: {message}"
        ))
    }
}

fn to_book_details(product_id: i64, info: VolumeInfo) -> Result<BookDetails, ServiceError> {
    let author = info.authors.first().cloned().ok_or_else(|| {
        ServiceError::UpstreamFailure("book service response has no authors".to_string())
    })?;

    let year = match info.published_date.get(..4).map(str::parse::<i32>) {
        Some(Ok(year)) => year,
        _ => {
            tracing::warn!(
                published_date = %info.published_date,
                "Failed to extract year"
            );
            0
        }
    };

    let language = if info.language == "en" {
        "English"
    } else {
        "unknown"
    };
    let kind = if info.print_type == "BOOK" {
        "paperback"
    } else {
        "unknown"
    };

    Ok(BookDetails {
        id: product_id,
        author,
        year,
        kind: kind.to_string(),
        pages: info.page_count,
        publisher: info.publisher,
        language: language.to_string(),
        isbn_10: isbn(&info.industry_identifiers, "ISBN_10"),
        isbn_13: isbn(&info.industry_identifiers, "ISBN_13"),
    })
}

fn isbn(identifiers: &[IndustryIdentifier], kind: &str) -> String {
    identifiers
        .iter()
        .find(|id| id.kind == kind)
        .map(|id| id.identifier.clone())
        .unwrap_or_default()
}
