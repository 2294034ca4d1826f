//! HTML sanitizing of user-generated content
//!
//! Every user-controlled string is passed through an allow-list HTML policy before it
//! is persisted and again before it is returned to a client. Scripts, styles and
//! event-handler attributes never survive.

use crate::models::DocumentDto;

/// Apply the user-generated-content policy to a single value
pub fn sanitize(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    ammonia::clean(value)
}

fn sanitize_all(values: &[String]) -> Vec<String> {
    values.iter().map(|v| sanitize(v)).collect()
}

/// Sanitize every string field of a document
pub fn sanitize_document(dto: DocumentDto) -> DocumentDto {
    DocumentDto {
        id: dto.id,
        alternative_id: sanitize(&dto.alternative_id),
        title: sanitize(&dto.title),
        amount: dto.amount,
        created: sanitize(&dto.created),
        modified: dto.modified.as_deref().map(sanitize),
        file_name: sanitize(&dto.file_name),
        preview_link: dto.preview_link.as_deref().map(sanitize),
        upload_file_token: dto.upload_file_token.as_deref().map(sanitize),
        tags: sanitize_all(&dto.tags),
        senders: sanitize_all(&dto.senders),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_is_removed() {
        let out = sanitize("Invoice<script>alert('x')</script>");
        assert_eq!(out, "Invoice");
    }

    #[test]
    fn test_event_handler_is_removed() {
        let out = sanitize(r#"<a href="https://example.com" onclick="steal()">link</a>"#);
        assert!(!out.contains("onclick"));
        assert!(out.contains("link"));
    }

    #[test]
    fn test_style_is_removed() {
        let out = sanitize("<style>body{display:none}</style>title");
        assert_eq!(out, "title");
    }

    #[test]
    fn test_plain_values_are_unchanged() {
        assert_eq!(sanitize("Jan invoice"), "Jan invoice");
        assert_eq!(sanitize("/2024_01_31/invoice.pdf"), "/2024_01_31/invoice.pdf");
        assert_eq!(sanitize("2024-01-31T10:15:00+01:00"), "2024-01-31T10:15:00+01:00");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_sanitize_document_covers_lists() {
        let dto = DocumentDto {
            title: "<b onmouseover=\"x()\">t</b>".to_string(),
            tags: vec!["work".to_string(), "<script>x</script>ok".to_string()],
            senders: vec!["<img src=x onerror=alert(1)>ACME".to_string()],
            upload_file_token: Some("T1".to_string()),
            ..Default::default()
        };
        let clean = sanitize_document(dto);
        assert!(!clean.title.contains("onmouseover"));
        assert_eq!(clean.tags, vec!["work", "ok"]);
        assert!(!clean.senders[0].contains("onerror"));
        assert_eq!(clean.upload_file_token.as_deref(), Some("T1"));
    }

    #[test]
    fn test_sanitize_document_keeps_id() {
        let dto = DocumentDto {
            id: "a&b<c".to_string(),
            title: "t&u".to_string(),
            ..Default::default()
        };
        let clean = sanitize_document(dto);
        assert_eq!(clean.id, "a&b<c");
        assert_ne!(clean.title, "t&u");
    }
}
