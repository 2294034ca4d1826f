//! Identifier generation for documents and staged uploads

use rand::distr::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

pub const ALT_ID_LENGTH: usize = 8;

/// New 36-character document or staging id (UUID v4)
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// New short alternative id drawn from the 62-character alphanumeric alphabet
pub fn new_alt_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ALT_ID_LENGTH)
        .map(char::from)
        .collect()
}
