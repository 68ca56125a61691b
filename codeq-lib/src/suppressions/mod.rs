//! Source-level suppression discovery and binding
//!
//! Developers acknowledge accepted maintainability violations in C# source
//! with `SuppressMessage` attributes. This module finds those attributes,
//! names the declaration each one applies to using the same canonical FQN the
//! parsers produce, and binds them to the merged tree so threshold evaluation
//! can treat the suppressed metrics as acceptable.
//!
//! # Implementation Model
//!
//! Discovery is a lightweight lexical scan rather than a compiler front end:
//! a tokenizer that understands comments and every string literal form feeds
//! a declaration scanner that tracks namespaces and nested types. Only rules
//! with a fixed metric mapping are kept. Results are cached in a JSON file so
//! runs without access to the sources can still bind the last known set.

mod analyzer;
mod binder;
mod cache;
mod lexer;
mod rule_map;
mod scanner;

pub use analyzer::{SourceFolder, analyze_source_folders};
pub use binder::bind_suppressions;
pub use cache::{load_cache, save_cache};
pub use rule_map::{metric_for_rule_id, metric_for_suppression, rule_id};
