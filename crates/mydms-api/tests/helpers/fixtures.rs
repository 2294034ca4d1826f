use axum_test::multipart::{MultipartForm, Part};
use serde_json::{json, Value};

pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n% test document\n%%EOF\n";

pub fn pdf_form(file_name: &str) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from_static(PDF_BYTES))
        .file_name(file_name.to_string())
        .mime_type("application/pdf");
    MultipartForm::new().add_part("file", part)
}

pub fn document(title: &str, tags: &[&str], senders: &[&str]) -> Value {
    json!({
        "title": title,
        "amount": 12.5,
        "tags": tags,
        "senders": senders,
    })
}
