//! Default limits applied while parsing relation documents.
//!
//! These are the defaults of [`ParseOptions`](crate::codec::ParseOptions);
//! callers can tighten or relax them per parse.

/// Maximum number of characters (Unicode scalar values) in a tag key or value.
pub const MAX_TAG_LENGTH: usize = 255;

/// Maximum number of members in one relation version.
pub const MAX_MEMBERS: usize = 32_000;

/// Maximum size of an input document in bytes.
pub const MAX_DOCUMENT_LEN: usize = 16 * 1024 * 1024;

/// Maximum element nesting depth of an input document; the root is at depth 1.
pub const MAX_DEPTH: usize = 64;

/// Version assigned to a relation parsed for creation without a version.
pub const DEFAULT_VERSION: u64 = 1;
