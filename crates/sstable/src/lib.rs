//! # SSTable — immutable sorted runs on disk
//!
//! An SSTable run is a directory of six files describing one sorted,
//! immutable set of records:
//!
//! ```text
//! Data/SSTable/Level{L}/SSTable{n}/
//!   usertable-{L}-Data.db       records in key order
//!   usertable-{L}-Index.db      key_size | key | data_offset per record
//!   usertable-{L}-Summary.db    first/last key + key -> index-offset map
//!   usertable-{L}-Filter.db     serialized bloom filter
//!   usertable-{L}-Metadata.txt  preorder Merkle hash dump over the values
//!   usertable-{L}-TOC.db        manifest naming the five files above
//! ```
//!
//! Data, Index and Summary iterate the same key order. A run is never
//! mutated after its directory is renamed into place — it is only ever
//! merged into a new run at the next level and then deleted.
//!
//! | Module     | Purpose                                                |
//! |------------|--------------------------------------------------------|
//! | [`layout`] | directory tree, file names, run numbering, TOC         |
//! | [`write`]  | `RunBuilder` + memtable flush                          |
//! | [`read`]   | Filter/Summary/Index/Data lookup chain                 |
//! | [`merge`]  | two-way merge of run pairs for compaction              |

pub mod layout;
pub mod merge;
pub mod read;
pub mod write;

pub use layout::FileKind;
pub use merge::merge_runs;
pub use read::{read_data, read_filter, read_index, read_summary};
pub use write::{flush_memtable, RunBuilder};

#[cfg(test)]
mod tests;
