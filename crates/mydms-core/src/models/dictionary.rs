use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// A tag or sender row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct DictionaryEntry {
    pub id: i32,
    pub name: String,
}

/// The two name dictionaries documents refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryKind {
    Tag,
    Sender,
}

impl DictionaryKind {
    pub fn table(&self) -> &'static str {
        match self {
            DictionaryKind::Tag => "tags",
            DictionaryKind::Sender => "senders",
        }
    }

    /// Link table connecting documents to entries of this dictionary
    pub fn link_table(&self) -> &'static str {
        match self {
            DictionaryKind::Tag => "document_tags",
            DictionaryKind::Sender => "document_senders",
        }
    }

    pub fn link_column(&self) -> &'static str {
        match self {
            DictionaryKind::Tag => "tag_id",
            DictionaryKind::Sender => "sender_id",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DictionaryKind::Tag => "tag",
            DictionaryKind::Sender => "sender",
        }
    }
}

/// Result of resolving a list of names against a dictionary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedNames {
    pub ids: Vec<i32>,
    /// Names joined by `;` in input order
    pub display: String,
}
