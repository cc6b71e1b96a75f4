//! Wire types shared by every bookinfo component.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Reviewer slot consulted for even-indexed reviews.
pub const REVIEWER_1: &str = "Reviewer1";
/// Reviewer slot consulted for odd-indexed reviews.
pub const REVIEWER_2: &str = "Reviewer2";

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub description_html: String,
}

/// Bibliographic metadata for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDetails {
    pub id: i64,
    pub author: String,
    pub year: i32,
    #[serde(rename = "type")]
    pub kind: String,
    pub pages: i32,
    pub publisher: String,
    pub language: String,
    #[serde(rename = "ISBN-10")]
    pub isbn_10: String,
    #[serde(rename = "ISBN-13")]
    pub isbn_13: String,
}

/// Star counts keyed by reviewer name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingResponse {
    pub id: i64,
    pub ratings: BTreeMap<String, i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub stars: i32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub reviewer: String,
    pub text: String,
    #[serde(default)]
    pub rating: Rating,
}

/// The reviews aggregate for one product.
///
/// `podname` and `clustername` identify the process that produced the
/// response; they are not part of the review data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewsResponse {
    pub id: String,
    #[serde(rename = "podname")]
    pub pod_name: String,
    #[serde(rename = "clustername")]
    pub cluster_name: String,
    pub reviews: Vec<Review>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn book_details_uses_isbn_keys() {
        let details = BookDetails {
            id: 3,
            author: "William Shakespeare".to_string(),
            year: 1595,
            kind: "paperback".to_string(),
            pages: 200,
            publisher: "PublisherA".to_string(),
            language: "English".to_string(),
            isbn_10: "1234567890".to_string(),
            isbn_13: "123-1234567890".to_string(),
        };

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["ISBN-10"], "1234567890");
        assert_eq!(json["ISBN-13"], "123-1234567890");
        assert_eq!(json["type"], "paperback");
    }

    #[test]
    fn reviews_response_uses_short_identity_keys() {
        let body = r#"{"id":"0","podname":"pod-a","clustername":"east","reviews":[
            {"reviewer":"Reviewer1","text":"Fun","rating":{"stars":5,"color":"black"}},
            {"reviewer":"Reviewer2","text":"Dull"}
        ]}"#;

        let response: ReviewsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.pod_name, "pod-a");
        assert_eq!(response.cluster_name, "east");
        assert_eq!(response.reviews[0].rating.stars, 5);
        assert_eq!(response.reviews[1].rating, Rating::default());
    }
}
