//! Display-name formatting.
//!
//! [`format_type_name`] renders a [`TypeDescriptor`] into a readable
//! string. The rendering is controlled by [`TypeNameOptions`]:
//!
//! | Option                            | Default | Effect                                   |
//! |-----------------------------------|---------|------------------------------------------|
//! | `full_name`                       | `true`  | prefix the module path                   |
//! | `include_generic_parameter_names` | `false` | open parameters render by name, not `_`  |
//! | `include_generic_parameters`      | `true`  | render `<...>` argument lists            |
//! | `nested_type_delimiter`           | `"::"`  | joins enclosing types                    |
//!
//! # Example
//!
//! ```
//! use lintel_typename::{TypeDescriptor, TypeNameOptions};
//!
//! let ty = TypeDescriptor::parse(
//!     "std::collections::hash::map::HashMap<alloc::string::String, alloc::vec::Vec<u8>>",
//! )
//! .unwrap();
//!
//! assert_eq!(
//!     ty.display_name(&TypeNameOptions::default()),
//!     "std::collections::hash::map::HashMap<String, Vec<u8>>"
//! );
//! assert_eq!(ty.short_name(), "HashMap<String, Vec<u8>>");
//! ```

use crate::aliases::builtin_alias;
use crate::descriptor::{
    is_const_literal, ArrayLen, GenericArg, GenericArgs, TypeDescriptor, TypePath,
};

/// Options controlling how type names are rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNameOptions {
    /// Whether to include the namespace (module path).
    pub full_name: bool,

    /// Whether unbound generic parameters render by name.
    ///
    /// When `false`, `Vec<T>` renders as `Vec<_>`.
    pub include_generic_parameter_names: bool,

    /// Whether generic argument lists are rendered at all.
    pub include_generic_parameters: bool,

    /// Delimiter placed between an enclosing type and its nested type.
    pub nested_type_delimiter: String,
}

impl Default for TypeNameOptions {
    fn default() -> Self {
        Self {
            full_name: true,
            include_generic_parameter_names: false,
            include_generic_parameters: true,
            nested_type_delimiter: "::".to_string(),
        }
    }
}

impl TypeNameOptions {
    /// Default options with the namespace omitted.
    #[must_use]
    pub fn short() -> Self {
        Self {
            full_name: false,
            ..Self::default()
        }
    }

    /// Sets whether the namespace is included.
    #[must_use]
    pub fn full_name(mut self, full_name: bool) -> Self {
        self.full_name = full_name;
        self
    }

    /// Sets whether unbound generic parameters render by name.
    #[must_use]
    pub fn include_generic_parameter_names(mut self, include: bool) -> Self {
        self.include_generic_parameter_names = include;
        self
    }

    /// Sets whether generic argument lists are rendered.
    #[must_use]
    pub fn include_generic_parameters(mut self, include: bool) -> Self {
        self.include_generic_parameters = include;
        self
    }

    /// Sets the delimiter between enclosing and nested types.
    #[must_use]
    pub fn nested_type_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.nested_type_delimiter = delimiter.into();
        self
    }
}

/// Renders a type descriptor into a display string.
#[must_use]
pub fn format_type_name(ty: &TypeDescriptor, options: &TypeNameOptions) -> String {
    let mut out = String::new();
    write_type(&mut out, ty, options);
    out
}

/// Renders the display name of `T` with default options.
#[must_use]
pub fn type_display_name<T: ?Sized>() -> String {
    format_type_name(&TypeDescriptor::of::<T>(), &TypeNameOptions::default())
}

/// Renders the display name of `T` without its namespace.
#[must_use]
pub fn short_type_name<T: ?Sized>() -> String {
    format_type_name(&TypeDescriptor::of::<T>(), &TypeNameOptions::short())
}

fn write_type(out: &mut String, ty: &TypeDescriptor, options: &TypeNameOptions) {
    match ty {
        TypeDescriptor::Path(path) => write_path(out, path, options),
        TypeDescriptor::Param { name } => write_param(out, name, options),
        TypeDescriptor::Array { element, len } => {
            out.push('[');
            write_type(out, element, options);
            out.push_str("; ");
            match len {
                ArrayLen::Fixed(n) => out.push_str(&n.to_string()),
                ArrayLen::Param(name) => write_param(out, name, options),
            }
            out.push(']');
        }
        TypeDescriptor::Slice { element } => {
            out.push('[');
            write_type(out, element, options);
            out.push(']');
        }
        TypeDescriptor::Reference { mutable, referent } => {
            out.push('&');
            if *mutable {
                out.push_str("mut ");
            }
            write_pointee(out, referent, options);
        }
        TypeDescriptor::Pointer { mutable, pointee } => {
            out.push_str(if *mutable { "*mut " } else { "*const " });
            write_pointee(out, pointee, options);
        }
        TypeDescriptor::Tuple { elements } => {
            out.push('(');
            write_list(out, elements, options);
            if elements.len() == 1 {
                out.push(',');
            }
            out.push(')');
        }
        TypeDescriptor::TraitObject { bounds } => {
            out.push_str("dyn ");
            for (i, bound) in bounds.iter().enumerate() {
                if i > 0 {
                    out.push_str(" + ");
                }
                write_path(out, bound, options);
            }
        }
        TypeDescriptor::FnPointer {
            is_unsafe,
            abi,
            inputs,
            output,
        } => {
            if *is_unsafe {
                out.push_str("unsafe ");
            }
            if let Some(abi) = abi {
                out.push_str("extern \"");
                out.push_str(abi);
                out.push_str("\" ");
            }
            out.push_str("fn(");
            write_list(out, inputs, options);
            out.push(')');
            write_output(out, output.as_deref(), options);
        }
        TypeDescriptor::QualifiedPath {
            self_ty,
            trait_path,
            name,
        } => {
            out.push('<');
            write_type(out, self_ty, options);
            out.push_str(" as ");
            write_path(out, trait_path, options);
            out.push_str(">::");
            out.push_str(name);
        }
        TypeDescriptor::Never => out.push('!'),
    }
}

/// Writes the target of a reference or pointer, parenthesizing trait
/// objects with more than one bound.
fn write_pointee(out: &mut String, ty: &TypeDescriptor, options: &TypeNameOptions) {
    if matches!(ty, TypeDescriptor::TraitObject { bounds } if bounds.len() > 1) {
        out.push('(');
        write_type(out, ty, options);
        out.push(')');
    } else {
        write_type(out, ty, options);
    }
}

fn write_path(out: &mut String, path: &TypePath, options: &TypeNameOptions) {
    if let Some(alias) = builtin_alias(path) {
        out.push_str(alias);
        if let Some(segment) = path.last() {
            write_args(out, &segment.args, options);
        }
        return;
    }

    if options.full_name {
        for module in &path.namespace {
            out.push_str(module);
            out.push_str("::");
        }
    }

    for (i, segment) in path.segments.iter().enumerate() {
        if i > 0 {
            out.push_str(&options.nested_type_delimiter);
        }
        out.push_str(&segment.name);
        write_args(out, &segment.args, options);
    }
}

fn write_args(out: &mut String, args: &GenericArgs, options: &TypeNameOptions) {
    match args {
        GenericArgs::None => {}
        GenericArgs::AngleBracketed(args) => {
            if !options.include_generic_parameters {
                return;
            }
            out.push('<');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                match arg {
                    GenericArg::Type(ty) => write_type(out, ty, options),
                    GenericArg::Const(value) if is_const_literal(value) => out.push_str(value),
                    GenericArg::Const(name) => write_param(out, name, options),
                    GenericArg::Lifetime(lifetime) => out.push_str(lifetime),
                    GenericArg::Binding { name, ty } => {
                        out.push_str(name);
                        out.push_str(" = ");
                        write_type(out, ty, options);
                    }
                }
            }
            out.push('>');
        }
        GenericArgs::Parenthesized { inputs, output } => {
            out.push('(');
            write_list(out, inputs, options);
            out.push(')');
            write_output(out, output.as_deref(), options);
        }
    }
}

fn write_param(out: &mut String, name: &str, options: &TypeNameOptions) {
    if options.include_generic_parameter_names {
        out.push_str(name);
    } else {
        out.push('_');
    }
}

fn write_list(out: &mut String, types: &[TypeDescriptor], options: &TypeNameOptions) {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_type(out, ty, options);
    }
}

fn write_output(out: &mut String, output: Option<&TypeDescriptor>, options: &TypeNameOptions) {
    if let Some(output) = output {
        out.push_str(" -> ");
        write_type(out, output, options);
    }
}
