//! Type descriptor model.
//!
//! A [`TypeDescriptor`] is an immutable tree describing a type: its
//! namespace, its enclosing-type chain, generic arguments at every level,
//! and structural forms such as arrays, references and tuples.
//!
//! Descriptors are usually obtained from [`TypeDescriptor::of`], which
//! parses the output of [`std::any::type_name`], but they can also be
//! assembled by hand. Hand-built descriptors may contain unbound generic
//! parameters ([`TypeDescriptor::Param`]), which is how open generic
//! types are represented.
//!
//! # Example
//!
//! ```
//! use lintel_typename::{GenericArg, PathSegment, TypeDescriptor, TypePath};
//!
//! // alloc::vec::Vec<T>
//! let open_vec = TypeDescriptor::Path(TypePath::new(
//!     ["alloc", "vec"],
//!     vec![PathSegment::generic("Vec", vec![GenericArg::param("T")])],
//! ));
//!
//! assert!(open_vec.is_open());
//! assert_eq!(open_vec.to_string(), "Vec<_>");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypeNameError;
use crate::format::{format_type_name, TypeNameOptions};
use crate::parse::parse_type_name;

/// A runtime description of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDescriptor {
    /// A named type, possibly nested inside enclosing types.
    Path(TypePath),

    /// An unbound generic parameter such as `T`.
    Param {
        /// The parameter name.
        name: String,
    },

    /// A fixed-length array, `[T; N]`.
    Array {
        /// The element type.
        element: Box<TypeDescriptor>,
        /// The array length.
        len: ArrayLen,
    },

    /// A slice, `[T]`.
    Slice {
        /// The element type.
        element: Box<TypeDescriptor>,
    },

    /// A reference, `&T` or `&mut T`.
    Reference {
        /// Whether the reference is mutable.
        mutable: bool,
        /// The referenced type.
        referent: Box<TypeDescriptor>,
    },

    /// A raw pointer, `*const T` or `*mut T`.
    Pointer {
        /// Whether the pointer is `*mut`.
        mutable: bool,
        /// The pointed-to type.
        pointee: Box<TypeDescriptor>,
    },

    /// A tuple. The unit type is the empty tuple.
    Tuple {
        /// The tuple element types.
        elements: Vec<TypeDescriptor>,
    },

    /// A trait object, `dyn A + B`.
    TraitObject {
        /// The trait bounds, in declaration order.
        bounds: Vec<TypePath>,
    },

    /// A function pointer, `unsafe extern "C" fn(A) -> B`.
    FnPointer {
        /// Whether the function is `unsafe`.
        is_unsafe: bool,
        /// The declared ABI, if any (`"C"`).
        abi: Option<String>,
        /// The parameter types.
        inputs: Vec<TypeDescriptor>,
        /// The return type; `None` for `()`.
        output: Option<Box<TypeDescriptor>>,
    },

    /// A qualified associated type, `<T as Trait>::Name`.
    QualifiedPath {
        /// The self type.
        self_ty: Box<TypeDescriptor>,
        /// The trait the associated type belongs to.
        trait_path: TypePath,
        /// The associated item name.
        name: String,
    },

    /// The never type, `!`.
    Never,
}

/// The length of an array type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayLen {
    /// A concrete length.
    Fixed(usize),
    /// An unbound const generic parameter such as `N`.
    Param(String),
}

/// A possibly-nested named type.
///
/// The namespace is the module path. The segments are the enclosing-type
/// chain followed by the type itself, so the last segment is always the
/// type being described.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypePath {
    /// Module path segments, outermost first.
    pub namespace: Vec<String>,
    /// Enclosing types followed by the type itself. Never empty.
    pub segments: Vec<PathSegment>,
}

/// One segment of a [`TypePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathSegment {
    /// The segment name, without generic arguments.
    pub name: String,
    /// Generic arguments attached to this segment.
    pub args: GenericArgs,
}

/// Generic arguments of a path segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenericArgs {
    /// No arguments.
    #[default]
    None,
    /// `<A, B, 3, Item = C>`.
    AngleBracketed(Vec<GenericArg>),
    /// `Fn(A, B) -> C` sugar.
    Parenthesized {
        /// The argument types.
        inputs: Vec<TypeDescriptor>,
        /// The return type, if written.
        output: Option<Box<TypeDescriptor>>,
    },
}

/// A single generic argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenericArg {
    /// A type argument.
    Type(TypeDescriptor),
    /// A const argument. Either a literal (`16`) or a parameter name (`N`).
    Const(String),
    /// A lifetime argument, including the leading quote.
    Lifetime(String),
    /// An associated type binding, `Item = T`.
    Binding {
        /// The associated type name.
        name: String,
        /// The bound type.
        ty: TypeDescriptor,
    },
}

impl TypeDescriptor {
    /// Describes `T` by parsing [`std::any::type_name`].
    ///
    /// This never fails. Names the parser does not understand are kept
    /// verbatim as a single-segment path.
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        Self::from_type_name(std::any::type_name::<T>())
    }

    /// Describes a type from a raw type-name string, falling back to an
    /// opaque single-segment path when it cannot be parsed.
    #[must_use]
    pub fn from_type_name(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_else(|_| Self::named(raw))
    }

    /// Parses a type-name string.
    pub fn parse(input: &str) -> Result<Self, TypeNameError> {
        parse_type_name(input)
    }

    /// A plain named type with no namespace (`i32`, `MyType`).
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Path(TypePath::simple(name))
    }

    /// An unbound generic parameter.
    #[must_use]
    pub fn param(name: impl Into<String>) -> Self {
        Self::Param { name: name.into() }
    }

    /// A fixed-length array of `element`.
    #[must_use]
    pub fn array(element: Self, len: usize) -> Self {
        Self::Array {
            element: Box::new(element),
            len: ArrayLen::Fixed(len),
        }
    }

    /// A slice of `element`.
    #[must_use]
    pub fn slice(element: Self) -> Self {
        Self::Slice {
            element: Box::new(element),
        }
    }

    /// A shared reference to `referent`.
    #[must_use]
    pub fn reference(referent: Self) -> Self {
        Self::Reference {
            mutable: false,
            referent: Box::new(referent),
        }
    }

    /// A tuple of `elements`.
    #[must_use]
    pub fn tuple(elements: Vec<Self>) -> Self {
        Self::Tuple { elements }
    }

    /// The unit type `()`.
    #[must_use]
    pub fn unit() -> Self {
        Self::Tuple {
            elements: Vec::new(),
        }
    }

    /// Returns the number of array or slice layers wrapping the
    /// innermost element type. Zero for non-array types.
    #[must_use]
    pub fn rank(&self) -> usize {
        let mut rank = 0;
        let mut current = self;
        while let Self::Array { element, .. } | Self::Slice { element } = current {
            rank += 1;
            current = &**element;
        }
        rank
    }

    /// Returns the innermost element type of an array or slice, or the
    /// type itself otherwise.
    #[must_use]
    pub fn element_type(&self) -> &Self {
        let mut current = self;
        while let Self::Array { element, .. } | Self::Slice { element } = current {
            current = &**element;
        }
        current
    }

    /// Returns `true` if any part of this type is an unbound generic
    /// parameter.
    #[must_use]
    pub fn is_open(&self) -> bool {
        match self {
            Self::Param { .. } => true,
            Self::Path(path) => path.is_open(),
            Self::Array { element, len } => {
                matches!(len, ArrayLen::Param(_)) || element.is_open()
            }
            Self::Slice { element } => element.is_open(),
            Self::Reference { referent, .. } => referent.is_open(),
            Self::Pointer { pointee, .. } => pointee.is_open(),
            Self::Tuple { elements } => elements.iter().any(Self::is_open),
            Self::TraitObject { bounds } => bounds.iter().any(TypePath::is_open),
            Self::FnPointer { inputs, output, .. } => {
                inputs.iter().any(Self::is_open) || output.as_ref().is_some_and(|o| o.is_open())
            }
            Self::QualifiedPath {
                self_ty,
                trait_path,
                ..
            } => self_ty.is_open() || trait_path.is_open(),
            Self::Never => false,
        }
    }

    /// Formats this descriptor with the given options.
    #[must_use]
    pub fn display_name(&self, options: &TypeNameOptions) -> String {
        format_type_name(self, options)
    }

    /// Formats this descriptor without its namespace.
    #[must_use]
    pub fn short_name(&self) -> String {
        format_type_name(self, &TypeNameOptions::short())
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_type_name(self, &TypeNameOptions::default()))
    }
}

impl std::str::FromStr for TypeDescriptor {
    type Err = TypeNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TypePath {
    /// Creates a path from a namespace and its segments.
    #[must_use]
    pub fn new<I, S>(namespace: I, segments: Vec<PathSegment>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            namespace: namespace.into_iter().map(Into::into).collect(),
            segments,
        }
    }

    /// A single-segment path with no namespace and no arguments.
    #[must_use]
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            namespace: Vec::new(),
            segments: vec![PathSegment::new(name)],
        }
    }

    /// The last segment, i.e. the type itself.
    ///
    /// Returns `None` only for a malformed path with no segments.
    #[must_use]
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// The enclosing-type chain, outermost first.
    #[must_use]
    pub fn enclosing(&self) -> &[PathSegment] {
        match self.segments.split_last() {
            Some((_, enclosing)) => enclosing,
            None => &[],
        }
    }

    /// The fully-qualified path without generic arguments, joined by `::`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        self.namespace
            .iter()
            .map(String::as_str)
            .chain(self.segments.iter().map(|s| s.name.as_str()))
            .collect::<Vec<_>>()
            .join("::")
    }

    fn is_open(&self) -> bool {
        self.segments.iter().any(|segment| match &segment.args {
            GenericArgs::None => false,
            GenericArgs::AngleBracketed(args) => args.iter().any(|arg| match arg {
                GenericArg::Type(ty) | GenericArg::Binding { ty, .. } => ty.is_open(),
                GenericArg::Const(value) => !is_const_literal(value),
                GenericArg::Lifetime(_) => false,
            }),
            GenericArgs::Parenthesized { inputs, output } => {
                inputs.iter().any(TypeDescriptor::is_open)
                    || output.as_ref().is_some_and(|o| o.is_open())
            }
        })
    }
}

impl PathSegment {
    /// A segment without generic arguments.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: GenericArgs::None,
        }
    }

    /// A segment with angle-bracketed generic arguments.
    #[must_use]
    pub fn generic(name: impl Into<String>, args: Vec<GenericArg>) -> Self {
        Self {
            name: name.into(),
            args: if args.is_empty() {
                GenericArgs::None
            } else {
                GenericArgs::AngleBracketed(args)
            },
        }
    }
}

impl GenericArg {
    /// A type argument.
    #[must_use]
    pub fn ty(descriptor: TypeDescriptor) -> Self {
        Self::Type(descriptor)
    }

    /// An unbound generic type parameter argument.
    #[must_use]
    pub fn param(name: impl Into<String>) -> Self {
        Self::Type(TypeDescriptor::param(name))
    }
}

impl From<TypeDescriptor> for GenericArg {
    fn from(descriptor: TypeDescriptor) -> Self {
        Self::Type(descriptor)
    }
}

/// Returns `true` for const arguments that are literal values rather than
/// parameter names.
pub(crate) fn is_const_literal(value: &str) -> bool {
    value
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '\'' || c == '"' || c == '{')
        || value == "true"
        || value == "false"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_of_nested_arrays() {
        let ty = TypeDescriptor::slice(TypeDescriptor::array(
            TypeDescriptor::array(TypeDescriptor::named("u8"), 2),
            3,
        ));
        assert_eq!(ty.rank(), 3);
        assert_eq!(ty.element_type(), &TypeDescriptor::named("u8"));
    }

    #[test]
    fn test_rank_of_scalar() {
        let ty = TypeDescriptor::named("i32");
        assert_eq!(ty.rank(), 0);
        assert_eq!(ty.element_type(), &ty);
    }

    #[test]
    fn test_reference_to_array_is_not_an_array() {
        let ty = TypeDescriptor::reference(TypeDescriptor::slice(TypeDescriptor::named("u8")));
        assert_eq!(ty.rank(), 0);
    }

    #[test]
    fn test_is_open() {
        let closed = TypeDescriptor::Path(TypePath::new(
            ["alloc", "vec"],
            vec![PathSegment::generic(
                "Vec",
                vec![GenericArg::ty(TypeDescriptor::named("u8"))],
            )],
        ));
        assert!(!closed.is_open());

        let open = TypeDescriptor::Path(TypePath::new(
            ["alloc", "vec"],
            vec![PathSegment::generic("Vec", vec![GenericArg::param("T")])],
        ));
        assert!(open.is_open());

        let open_len = TypeDescriptor::Array {
            element: Box::new(TypeDescriptor::named("u8")),
            len: ArrayLen::Param("N".to_string()),
        };
        assert!(open_len.is_open());
    }

    #[test]
    fn test_const_literal_detection() {
        assert!(is_const_literal("16"));
        assert!(is_const_literal("-1"));
        assert!(is_const_literal("true"));
        assert!(!is_const_literal("N"));
    }

    #[test]
    fn test_enclosing_chain() {
        let path = TypePath::new(
            ["my_crate"],
            vec![PathSegment::new("Outer"), PathSegment::new("Inner")],
        );
        assert_eq!(path.enclosing().len(), 1);
        assert_eq!(path.enclosing()[0].name, "Outer");
        assert_eq!(path.last().map(|s| s.name.as_str()), Some("Inner"));
        assert_eq!(path.qualified_name(), "my_crate::Outer::Inner");
    }

    #[test]
    fn test_generic_with_no_args_is_plain_segment() {
        let segment = PathSegment::generic("Marker", Vec::new());
        assert_eq!(segment.args, GenericArgs::None);
    }

    #[test]
    fn test_of_unit() {
        assert_eq!(TypeDescriptor::of::<()>(), TypeDescriptor::unit());
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let json = serde_json::to_value(TypeDescriptor::param("T")).unwrap();
        assert_eq!(json["kind"], "param");
        assert_eq!(json["name"], "T");
    }
}
