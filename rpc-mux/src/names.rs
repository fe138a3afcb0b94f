//! `"iface@forwarder"` name-sugar parsing.
//!
//! Only the LAST `@` in a name is a separator; earlier `@`s stay part of the
//! interface name, so `"a@b@c"` means interface `"a@b"` via forwarder `"c"`.
//! A leading `@` yields an empty interface name, which callers must reject
//! with `UNKNOWN_INTERFACE`.

/// Splits `name` into `(interface, forwarder)` at the last `@`, if any.
pub(crate) fn split_forward_name(name: &str) -> (String, Option<String>) {
    match name.rfind('@') {
        Some(at) => (name[..at].to_string(), Some(name[at + 1..].to_string())),
        None => (name.to_string(), None),
    }
}
