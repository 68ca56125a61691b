/// Placeholder for a type whose name was not reported.
pub const UNKNOWN_TYPE: &str = "<UnknownType>";

/// Placeholder for a member whose name was not reported.
pub const UNKNOWN_MEMBER: &str = "<UnknownMember>";

/// Placeholder for an assembly whose name was not reported.
pub const UNKNOWN_ASSEMBLY: &str = "<UnknownAssembly>";

/// Name used for types declared outside of any namespace.
pub const GLOBAL_NAMESPACE: &str = "<GlobalNamespace>";

const SENTINELS: [&str; 4] = [UNKNOWN_TYPE, UNKNOWN_MEMBER, UNKNOWN_ASSEMBLY, GLOBAL_NAMESPACE];

/// Returns `true` if `name` is one of the reserved placeholder tokens.
#[must_use]
pub fn is_sentinel(name: &str) -> bool {
    SENTINELS.contains(&name)
}
