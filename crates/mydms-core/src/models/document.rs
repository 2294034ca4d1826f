use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// Layout used for every timestamp exchanged with clients, e.g. `2024-01-31T10:15:00+01:00`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Separator of the canonical tag and sender display strings
pub const LIST_SEPARATOR: &str = ";";

/// Upload tokens that mean "keep the existing file"
pub const NO_UPLOAD_TOKEN: &str = "-";

/// Persistent document row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct Document {
    pub id: String,
    pub alt_id: String,
    pub title: String,
    pub file_name: String,
    pub preview_link: Option<String>,
    pub amount: f32,
    pub tag_list: String,
    pub sender_list: String,
    pub created: DateTime<Utc>,
    pub modified: Option<DateTime<Utc>>,
}

/// Document as exchanged over the API, both request and response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDto {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub alternative_id: String,
    #[validate(length(min = 1, message = "a document needs a title"))]
    pub title: String,
    #[serde(default)]
    pub amount: f32,
    #[serde(default)]
    pub created: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(default)]
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_file_token: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub senders: Vec<String>,
}

impl DocumentDto {
    /// The staging token of a newly attached upload, if any
    pub fn upload_token(&self) -> Option<&str> {
        match self.upload_file_token.as_deref() {
            None | Some("") | Some(NO_UPLOAD_TOKEN) => None,
            Some(token) => Some(token),
        }
    }
}

impl From<Document> for DocumentDto {
    fn from(doc: Document) -> Self {
        DocumentDto {
            id: doc.id,
            alternative_id: doc.alt_id,
            title: doc.title,
            amount: doc.amount,
            created: format_timestamp(&doc.created),
            modified: doc.modified.as_ref().map(format_timestamp),
            file_name: doc.file_name,
            preview_link: doc.preview_link,
            upload_file_token: None,
            tags: split_list(&doc.tag_list),
            senders: split_list(&doc.sender_list),
        }
    }
}

/// Search criteria for documents; every field is optional
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    pub title: Option<String>,
    pub tag: Option<String>,
    pub sender: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

/// Document fields a search result may be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    Title,
    Created,
    Modified,
}

impl OrderField {
    pub fn column(&self) -> &'static str {
        match self {
            OrderField::Title => "title",
            OrderField::Created => "created",
            OrderField::Modified => "modified",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: OrderField,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn new(field: OrderField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Newest documents first, ties broken by title
    pub fn default_order() -> Vec<OrderBy> {
        vec![
            OrderBy::new(OrderField::Created, SortDirection::Desc),
            OrderBy::new(OrderField::Title, SortDirection::Asc),
        ]
    }
}

/// One page of a document search
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PagedDocuments {
    pub documents: Vec<DocumentDto>,
    pub total_entries: i64,
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a client-supplied timestamp; `None` for anything not in [`TIMESTAMP_FORMAT`]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::<FixedOffset>::parse_from_str(value.trim(), TIMESTAMP_FORMAT)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Split a canonical display string; the empty string yields an empty list
pub fn split_list(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value.split(LIST_SEPARATOR).map(str::to_string).collect()
}

pub fn join_list(names: &[String]) -> String {
    names.join(LIST_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_document() -> Document {
        Document {
            id: "D1".to_string(),
            alt_id: "abcd1234".to_string(),
            title: "Jan invoice".to_string(),
            file_name: "/2024_01_31/invoice.pdf".to_string(),
            preview_link: Some("L3ByZXZpZXc=".to_string()),
            amount: 12.5,
            tag_list: "work;2024".to_string(),
            sender_list: "ACME".to_string(),
            created: Utc.with_ymd_and_hms(2024, 1, 31, 10, 15, 0).unwrap(),
            modified: None,
        }
    }

    #[test]
    fn test_document_to_dto() {
        let dto = DocumentDto::from(sample_document());
        assert_eq!(dto.alternative_id, "abcd1234");
        assert_eq!(dto.tags, vec!["work", "2024"]);
        assert_eq!(dto.senders, vec!["ACME"]);
        assert_eq!(dto.created, "2024-01-31T10:15:00+00:00");
        assert!(dto.modified.is_none());
    }

    #[test]
    fn test_dto_json_shape() {
        let json = serde_json::to_value(DocumentDto::from(sample_document())).unwrap();
        assert_eq!(json["alternativeId"], "abcd1234");
        assert_eq!(json["fileName"], "/2024_01_31/invoice.pdf");
        assert!(json.get("modified").is_none());
        assert!(json.get("uploadFileToken").is_none());
    }

    #[test]
    fn test_upload_token() {
        let mut dto = DocumentDto::default();
        assert_eq!(dto.upload_token(), None);
        dto.upload_file_token = Some("-".to_string());
        assert_eq!(dto.upload_token(), None);
        dto.upload_file_token = Some(String::new());
        assert_eq!(dto.upload_token(), None);
        dto.upload_file_token = Some("T1".to_string());
        assert_eq!(dto.upload_token(), Some("T1"));
    }

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp("2024-01-31T10:15:00+01:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 31, 9, 15, 0).unwrap());
        assert!(parse_timestamp("2024-01-31").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_split_list() {
        assert!(split_list("").is_empty());
        assert_eq!(split_list("a;b"), vec!["a", "b"]);
        assert_eq!(join_list(&split_list("a;b")), "a;b");
    }
}
