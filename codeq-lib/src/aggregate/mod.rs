//! Cross-document validation and the merged symbol tree
//!
//! Documents from all three parser families are first checked for identity
//! collisions within each family, then merged into one
//! Solution → Assembly → Namespace → Type → Member tree keyed by normalized
//! FQN.
//!
//! # Implementation Model
//!
//! The tree is an arena of [`TreeNode`] values indexed by `(kind, FQN)`.
//! Because every metric identifier belongs to exactly one parser family,
//! merging is a disjoint union of metric maps. Documents are still merged in
//! a canonical order so fields fixed by the first contributor (member kind,
//! source location) are deterministic.
//!
//! After all elements are placed, findings that only carry a file and line
//! are attributed to the member declared closest above them, and violation
//! counts are added to the own count of every ancestor.

mod attribution;
mod node;
mod tree;
mod validator;

pub use node::{NodeId, TreeNode};
pub use tree::{AggregationTree, build_tree};
pub use validator::{SymbolCollision, find_symbol_collisions, try_validate_unique_symbols};
