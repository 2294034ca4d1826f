//! API constants

/// Versioned prefix of every API route
pub const API_PREFIX: &str = "/api/v1";

/// Upper bound for one document save or delete, including all storage calls
pub const REQUEST_DEADLINE_SECS: u64 = 30;

/// Allowance on top of the maximum upload size for the multipart envelope
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
