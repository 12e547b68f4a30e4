//! # geodict Configuration Constants
//!
//! This module centralizes all configuration constants, grouping interdependent
//! values together and documenting their relationships. Constants that depend
//! on each other are co-located to prevent mismatch bugs.
//!
//! ## Dependency Graph
//!
//! ```text
//! PAGE_SIZE (500,000 records)
//!       │
//!       ├─> page_index = pos / PAGE_SIZE, slot = pos % PAGE_SIZE
//!       │
//!       └─> TreeBuilder output buffer (flushed every PAGE_SIZE records,
//!             so every page except the last is written exactly once)
//!
//! PAGE_HEADER_SIZE (32 bytes)
//!       │
//!       └─> PAGE_OFFSET_SIZE (4 bytes per record slot, follows the header)
//!
//! PAGE_CACHE_CAPACITY (10 mappings)
//!       │
//!       └─> MIN_PAGE_CACHE_CAPACITY (floor for caller-supplied values)
//!
//! ROOT_ID (0)
//!       │
//!       └─> UNRESOLVED_SIBLING (0): a real sibling is always > its node id,
//!             so the root id doubles as the "not yet resolved" marker
//!
//! MAX_NODE_ID (u32::MAX - 1)
//!       │
//!       └─> the id after the last node is still a valid u32 sibling value
//! ```
//!
//! ## Usage
//!
//! Import constants from this module rather than defining them locally:
//!
//! ```ignore
//! use crate::config::{PAGE_SIZE, UNKNOWN_COORDINATE};
//! ```

// ============================================================================
// PAGE LAYOUT CONSTANTS
// These define the on-disk page structure shared by every paged table
// ============================================================================

/// Number of records held by one page file.
pub const PAGE_SIZE: usize = 500_000;

/// Size of the fixed page header in bytes.
pub const PAGE_HEADER_SIZE: usize = 32;

/// Size of one entry of the record offset table that follows the header.
pub const PAGE_OFFSET_SIZE: usize = 4;

/// Magic bytes at the start of every page file.
pub const PAGE_MAGIC: &[u8; 8] = b"GEODPAGE";

/// Binary page format version. Bumped when the page framing changes; record
/// layouts carry their own schema version in the table descriptor.
pub const FORMAT_VERSION: u32 = 1;

const _: () = assert!(PAGE_SIZE > 0, "PAGE_SIZE must be positive");

const _: () = assert!(
    PAGE_SIZE <= u32::MAX as usize,
    "record slots are addressed with u32 offsets"
);

const _: () = assert!(
    PAGE_HEADER_SIZE % PAGE_OFFSET_SIZE == 0,
    "offset table must start on an entry boundary"
);

// ============================================================================
// PAGE CACHE CONFIGURATION
// ============================================================================

/// Default number of page files mapped at the same time.
pub const PAGE_CACHE_CAPACITY: usize = 10;

/// Smallest cache capacity accepted from callers.
pub const MIN_PAGE_CACHE_CAPACITY: usize = 1;

const _: () = assert!(PAGE_CACHE_CAPACITY >= MIN_PAGE_CACHE_CAPACITY);

// ============================================================================
// ADDRESS TREE CONSTANTS
// ============================================================================

/// Id of the virtual root node. Always stored at position 0.
pub const ROOT_ID: u32 = 0;

/// Placeholder written into `sibling_id` until the node's subtree is closed.
pub const UNRESOLVED_SIBLING: u32 = ROOT_ID;

/// Largest id the tree builder allocates.
pub const MAX_NODE_ID: u32 = u32::MAX - 1;

/// Coordinate value meaning "no known point".
pub const UNKNOWN_COORDINATE: f64 = 999.9;

/// Priority assigned to lines without a `!PP` marker. Lower is preferred.
pub const DEFAULT_PRIORITY: u8 = 99;

// ============================================================================
// STORE DIRECTORY LAYOUT
// ============================================================================

/// Table holding the address tree.
pub const NODE_TABLE: &str = "address_node";

/// Table mapping address trie ids to node id lists.
pub const TRIE_NODE_TABLE: &str = "trie_node";

/// Table mapping note trie ids to node id lists.
pub const NOTE_NODE_TABLE: &str = "note_node";

/// Dataset provenance table.
pub const DATASET_TABLE: &str = "dataset";

/// Static trie over address labels.
pub const TRIE_FILE: &str = "address.trie";

/// Static trie over note tokens.
pub const NOTE_TRIE_FILE: &str = "note.trie";

/// Per-table descriptor file name.
pub const DESCRIPTOR_FILE: &str = "config.json";
