//! Built-in type aliases.
//!
//! Primitives and prelude types are always rendered by their short name,
//! even when full names are requested. `alloc::vec::Vec<u8>` renders as
//! `Vec<u8>` the same way `core::primitive::u8` renders as `u8`.

use crate::descriptor::TypePath;

/// Primitive type names.
pub const PRIMITIVES: &[&str] = &[
    "bool", "char", "str", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64",
    "u128", "usize", "f32", "f64",
];

/// Fully-qualified prelude types and the alias they render as.
const PRELUDE: &[(&str, &str)] = &[
    ("alloc::string::String", "String"),
    ("alloc::vec::Vec", "Vec"),
    ("alloc::boxed::Box", "Box"),
    ("core::option::Option", "Option"),
    ("core::result::Result", "Result"),
    ("std::string::String", "String"),
    ("std::vec::Vec", "Vec"),
    ("std::boxed::Box", "Box"),
    ("std::option::Option", "Option"),
    ("std::result::Result", "Result"),
];

/// Returns the built-in alias for a path, if it has one.
///
/// Only paths without an enclosing-type chain qualify; generic arguments
/// on the path are ignored for the lookup.
pub fn builtin_alias(path: &TypePath) -> Option<&'static str> {
    let [segment] = path.segments.as_slice() else {
        return None;
    };

    match path.namespace.as_slice() {
        [] => PRIMITIVES.iter().copied().find(|p| *p == segment.name),
        [root, module] if (root == "core" || root == "std") && module == "primitive" => {
            PRIMITIVES.iter().copied().find(|p| *p == segment.name)
        }
        _ => {
            let qualified = path.qualified_name();
            PRELUDE
                .iter()
                .find(|(full, _)| *full == qualified)
                .map(|(_, alias)| *alias)
        }
    }
}
