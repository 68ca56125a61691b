//! Canonical symbol names shared by every input dialect
//!
//! Coverage, code metrics, and static-analysis tools all describe the same
//! types and members, but each spells them differently: return types may or
//! may not be present, parameter lists use CLR or C# type names, generic
//! arguments show up as `<T>` or as backtick arity, and nested types are joined
//! with `/`, `+`, or `.`.
//!
//! # Implementation Model
//!
//! Every parser funnels names through the functions in this module so that the
//! same logical element ends up with a byte-identical fully qualified name
//! (FQN), regardless of which tool reported it. The canonical form:
//!
//! - drops return types and modifiers,
//! - replaces the contents of the outermost parameter list with `...`,
//! - strips generic argument lists and arity markers from type and method names,
//! - joins nested types with `+`,
//! - keeps special names (`.ctor`, `.cctor`, operators, compiler-generated names)
//!   verbatim.
//!
//! Four reserved sentinel tokens stand in for names a tool did not provide and
//! are never altered by normalization.

mod normalizer;
mod scan;
mod sentinels;

pub use normalizer::{
    combine_member_fqn, extract_method_name, normalize_fully_qualified_method_name, normalize_method_signature,
    normalize_qualified_type_name, normalize_type_name, simple_type_name,
};
pub use sentinels::{GLOBAL_NAMESPACE, UNKNOWN_ASSEMBLY, UNKNOWN_MEMBER, UNKNOWN_TYPE, is_sentinel};
