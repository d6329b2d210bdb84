//! Parser for type-name strings.
//!
//! The grammar covers everything [`std::any::type_name`] produces on
//! stable Rust: paths with generic arguments, arrays, slices, references,
//! raw pointers, tuples, trait objects, function pointers, qualified
//! associated types and the never type.
//!
//! Paths are split into a namespace and an enclosing-type chain: the last
//! segment is the type itself, and of the preceding segments everything
//! from the first uppercase (or generic) segment onward is treated as an
//! enclosing type. `my_crate::Outer::Inner` therefore has namespace
//! `my_crate` and enclosing chain `Outer`.

use crate::descriptor::{ArrayLen, GenericArg, GenericArgs, PathSegment, TypeDescriptor, TypePath};
use crate::error::TypeNameError;

/// Deepest type nesting the parser descends into before giving up.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Parses a complete type-name string into a [`TypeDescriptor`].
pub fn parse_type_name(input: &str) -> Result<TypeDescriptor, TypeNameError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(TypeNameError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        input_len: input.len(),
    };
    let ty = parser.parse_type()?;

    match parser.peek() {
        None => Ok(ty),
        Some(token) => Err(TypeNameError::TrailingInput {
            position: token.offset,
        }),
    }
}

// ============================================================================
// Lexer
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind<'a> {
    Ident(&'a str),
    Lifetime(&'a str),
    Char(&'a str),
    Int(&'a str),
    Str(&'a str),
    PathSep,
    Lt,
    Gt,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semi,
    Amp,
    Star,
    Arrow,
    Plus,
    Bang,
    Eq,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    kind: Kind<'a>,
    offset: usize,
}

impl Kind<'_> {
    fn text(&self) -> String {
        match self {
            Self::Ident(s) | Self::Lifetime(s) | Self::Char(s) | Self::Int(s) => (*s).to_string(),
            Self::Str(s) => format!("\"{s}\""),
            Self::PathSep => "::".to_string(),
            Self::Lt => "<".to_string(),
            Self::Gt => ">".to_string(),
            Self::Comma => ",".to_string(),
            Self::LParen => "(".to_string(),
            Self::RParen => ")".to_string(),
            Self::LBracket => "[".to_string(),
            Self::RBracket => "]".to_string(),
            Self::Semi => ";".to_string(),
            Self::Amp => "&".to_string(),
            Self::Star => "*".to_string(),
            Self::Arrow => "->".to_string(),
            Self::Plus => "+".to_string(),
            Self::Bang => "!".to_string(),
            Self::Eq => "=".to_string(),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '#'
}

fn tokenize(input: &str) -> Result<Vec<Token<'_>>, TypeNameError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let single = |kind| Token {
            kind,
            offset: start,
        };

        let token = match c {
            '<' => single(Kind::Lt),
            '>' => single(Kind::Gt),
            ',' => single(Kind::Comma),
            '(' => single(Kind::LParen),
            ')' => single(Kind::RParen),
            '[' => single(Kind::LBracket),
            ']' => single(Kind::RBracket),
            ';' => single(Kind::Semi),
            '&' => single(Kind::Amp),
            '*' => single(Kind::Star),
            '+' => single(Kind::Plus),
            '!' => single(Kind::Bang),
            '=' => single(Kind::Eq),
            ':' => {
                if bytes.get(start + 1) == Some(&b':') {
                    chars.next();
                    single(Kind::PathSep)
                } else {
                    return Err(unexpected_char(':', start));
                }
            }
            '-' => match bytes.get(start + 1) {
                Some(b'>') => {
                    chars.next();
                    single(Kind::Arrow)
                }
                Some(b) if b.is_ascii_digit() => {
                    chars.next();
                    let end = take_while(&mut chars, |c| c.is_ascii_alphanumeric() || c == '_');
                    tokens.push(Token {
                        kind: Kind::Int(&input[start..end.unwrap_or(input.len())]),
                        offset: start,
                    });
                    continue;
                }
                _ => return Err(unexpected_char('-', start)),
            },
            '"' => {
                chars.next();
                let mut end = None;
                for (i, c) in chars.by_ref() {
                    if c == '"' {
                        end = Some(i);
                        break;
                    }
                }
                let end = end.ok_or(TypeNameError::UnterminatedLiteral { position: start })?;
                tokens.push(Token {
                    kind: Kind::Str(&input[start + 1..end]),
                    offset: start,
                });
                continue;
            }
            '\'' => {
                if let Some(end) = char_literal_end(input, start) {
                    while chars.peek().is_some_and(|&(i, _)| i < end) {
                        chars.next();
                    }
                    tokens.push(Token {
                        kind: Kind::Char(&input[start..end]),
                        offset: start,
                    });
                    continue;
                }
                let end = take_while(&mut chars, is_ident_char).unwrap_or(input.len());
                if end == start + 1 {
                    return Err(unexpected_char('\'', start));
                }
                tokens.push(Token {
                    kind: Kind::Lifetime(&input[start..end]),
                    offset: start,
                });
                continue;
            }
            '{' => {
                // Compiler-generated names such as `{{closure}}`.
                let mut depth = 0usize;
                let mut end = None;
                for (i, c) in chars.by_ref() {
                    match c {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                end = Some(i + 1);
                                break;
                            }
                        }
                        _ => {}
                    }
                }
                let end = end.ok_or(TypeNameError::UnexpectedEnd {
                    expected: "closing `}`",
                })?;
                tokens.push(Token {
                    kind: Kind::Ident(&input[start..end]),
                    offset: start,
                });
                continue;
            }
            c if c.is_ascii_digit() => {
                let end = take_while(&mut chars, |c| c.is_ascii_alphanumeric() || c == '_')
                    .unwrap_or(input.len());
                tokens.push(Token {
                    kind: Kind::Int(&input[start..end]),
                    offset: start,
                });
                continue;
            }
            c if is_ident_char(c) => {
                let end = take_while(&mut chars, is_ident_char).unwrap_or(input.len());
                tokens.push(Token {
                    kind: Kind::Ident(&input[start..end]),
                    offset: start,
                });
                continue;
            }
            other => return Err(unexpected_char(other, start)),
        };

        chars.next();
        tokens.push(token);
    }

    Ok(tokens)
}

/// Advances past the current character and every following character
/// matching `pred`. Returns the offset of the first non-matching
/// character, or `None` at end of input.
fn take_while<I>(chars: &mut std::iter::Peekable<I>, pred: impl Fn(char) -> bool) -> Option<usize>
where
    I: Iterator<Item = (usize, char)>,
{
    chars.next();
    while let Some(&(i, c)) = chars.peek() {
        if !pred(c) {
            return Some(i);
        }
        chars.next();
    }
    None
}

/// Returns the end offset of a char literal (`'x'`, `'\n'`, `'\u{1f600}'`)
/// opening at `start`, or `None` when the quote starts a lifetime.
fn char_literal_end(input: &str, start: usize) -> Option<usize> {
    let body = start + 1;
    let mut chars = input[body..].char_indices();
    let (_, first) = chars.next()?;

    if first == '\\' {
        chars.next()?;
        return chars
            .find(|&(_, c)| c == '\'')
            .map(|(i, _)| body + i + 1);
    }

    match chars.next()? {
        (i, '\'') => Some(body + i + 1),
        _ => None,
    }
}

fn unexpected_char(c: char, position: usize) -> TypeNameError {
    TypeNameError::UnexpectedToken {
        found: c.to_string(),
        position,
        expected: "a type",
    }
}

// ============================================================================
// Parser
// ============================================================================

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    depth: usize,
    input_len: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_kind(&self) -> Option<Kind<'a>> {
        self.peek().map(|t| t.kind)
    }

    fn peek_nth_kind(&self, n: usize) -> Option<Kind<'a>> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn bump(&mut self) -> Option<Token<'a>> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: Kind<'a>) -> bool {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_kind() == Some(Kind::Ident(keyword)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: Kind<'a>, expected: &'static str) -> Result<(), TypeNameError> {
        match self.bump() {
            Some(token) if token.kind == kind => Ok(()),
            Some(token) => Err(Self::unexpected(token, expected)),
            None => Err(TypeNameError::UnexpectedEnd { expected }),
        }
    }

    fn expect_ident(&mut self, expected: &'static str) -> Result<&'a str, TypeNameError> {
        match self.bump() {
            Some(Token {
                kind: Kind::Ident(name),
                ..
            }) => Ok(name),
            Some(token) => Err(Self::unexpected(token, expected)),
            None => Err(TypeNameError::UnexpectedEnd { expected }),
        }
    }

    fn unexpected(token: Token<'_>, expected: &'static str) -> TypeNameError {
        TypeNameError::UnexpectedToken {
            found: token.kind.text(),
            position: token.offset,
            expected,
        }
    }

    /// Every recursive production passes through here, so the depth
    /// check bounds the whole descent.
    fn parse_type(&mut self) -> Result<TypeDescriptor, TypeNameError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(TypeNameError::NestingTooDeep {
                position: self.peek().map_or(self.input_len, |t| t.offset),
                limit: MAX_NESTING_DEPTH,
            });
        }

        self.depth += 1;
        let ty = self.parse_type_inner();
        self.depth -= 1;
        ty
    }

    fn parse_type_inner(&mut self) -> Result<TypeDescriptor, TypeNameError> {
        let Some(token) = self.peek() else {
            return Err(TypeNameError::UnexpectedEnd { expected: "a type" });
        };

        match token.kind {
            Kind::Bang => {
                self.bump();
                Ok(TypeDescriptor::Never)
            }
            Kind::LParen => self.parse_tuple(),
            Kind::LBracket => self.parse_array(),
            Kind::Amp => {
                self.bump();
                if matches!(self.peek_kind(), Some(Kind::Lifetime(_))) {
                    self.bump();
                }
                let mutable = self.eat_keyword("mut");
                Ok(TypeDescriptor::Reference {
                    mutable,
                    referent: Box::new(self.parse_type()?),
                })
            }
            Kind::Star => {
                self.bump();
                let mutable = match self.expect_ident("`const` or `mut`")? {
                    "mut" => true,
                    "const" => false,
                    _ => return Err(Self::unexpected(token, "`const` or `mut`")),
                };
                Ok(TypeDescriptor::Pointer {
                    mutable,
                    pointee: Box::new(self.parse_type()?),
                })
            }
            Kind::Lt => self.parse_qualified_path(),
            Kind::Ident("dyn") => {
                self.bump();
                self.parse_trait_object()
            }
            Kind::Ident("unsafe" | "extern" | "fn" | "for") => self.parse_fn_pointer(),
            Kind::Ident("_") => {
                self.bump();
                Ok(TypeDescriptor::param("_"))
            }
            Kind::Ident(_) => Ok(TypeDescriptor::Path(self.parse_path()?)),
            _ => Err(Self::unexpected(token, "a type")),
        }
    }

    fn parse_tuple(&mut self) -> Result<TypeDescriptor, TypeNameError> {
        self.expect(Kind::LParen, "`(`")?;
        let mut elements = Vec::new();
        let mut trailing_comma = false;

        while !self.eat(Kind::RParen) {
            elements.push(self.parse_type()?);
            trailing_comma = self.eat(Kind::Comma);
            if !trailing_comma {
                self.expect(Kind::RParen, "`,` or `)`")?;
                break;
            }
        }

        // `(T)` is a parenthesized type, `(T,)` is a one-element tuple.
        if elements.len() == 1 && !trailing_comma {
            return Ok(elements.remove(0));
        }
        Ok(TypeDescriptor::Tuple { elements })
    }

    fn parse_array(&mut self) -> Result<TypeDescriptor, TypeNameError> {
        self.expect(Kind::LBracket, "`[`")?;
        let element = Box::new(self.parse_type()?);

        if !self.eat(Kind::Semi) {
            self.expect(Kind::RBracket, "`;` or `]`")?;
            return Ok(TypeDescriptor::Slice { element });
        }

        let len = match self.bump() {
            Some(Token {
                kind: Kind::Int(value),
                offset,
            }) => {
                let digits: String = value.chars().filter(|c| *c != '_').collect();
                let digits = digits.trim_end_matches("usize");
                ArrayLen::Fixed(digits.parse().map_err(|_| TypeNameError::UnexpectedToken {
                    found: value.to_string(),
                    position: offset,
                    expected: "an array length",
                })?)
            }
            Some(Token {
                kind: Kind::Ident(name),
                ..
            }) => ArrayLen::Param(name.to_string()),
            Some(token) => return Err(Self::unexpected(token, "an array length")),
            None => {
                return Err(TypeNameError::UnexpectedEnd {
                    expected: "an array length",
                })
            }
        };

        self.expect(Kind::RBracket, "`]`")?;
        Ok(TypeDescriptor::Array { element, len })
    }

    fn parse_qualified_path(&mut self) -> Result<TypeDescriptor, TypeNameError> {
        self.expect(Kind::Lt, "`<`")?;
        let self_ty = Box::new(self.parse_type()?);
        self.expect(Kind::Ident("as"), "`as`")?;
        let trait_path = self.parse_path()?;
        self.expect(Kind::Gt, "`>`")?;
        self.expect(Kind::PathSep, "`::`")?;
        let name = self.expect_ident("an associated type name")?.to_string();

        Ok(TypeDescriptor::QualifiedPath {
            self_ty,
            trait_path,
            name,
        })
    }

    fn parse_trait_object(&mut self) -> Result<TypeDescriptor, TypeNameError> {
        let mut bounds = Vec::new();
        loop {
            match self.peek_kind() {
                Some(Kind::Lifetime(_)) => {
                    self.bump();
                }
                _ => {
                    self.skip_higher_ranked()?;
                    bounds.push(self.parse_path()?);
                }
            }
            if !self.eat(Kind::Plus) {
                break;
            }
        }
        Ok(TypeDescriptor::TraitObject { bounds })
    }

    fn parse_fn_pointer(&mut self) -> Result<TypeDescriptor, TypeNameError> {
        self.skip_higher_ranked()?;
        let is_unsafe = self.eat_keyword("unsafe");
        let abi = if self.eat_keyword("extern") {
            match self.peek_kind() {
                Some(Kind::Str(abi)) => {
                    self.bump();
                    Some(abi.to_string())
                }
                _ => Some("C".to_string()),
            }
        } else {
            None
        };

        self.expect(Kind::Ident("fn"), "`fn`")?;
        let inputs = self.parse_parenthesized_inputs()?;
        let output = self.parse_return_type()?;

        Ok(TypeDescriptor::FnPointer {
            is_unsafe,
            abi,
            inputs,
            output,
        })
    }

    /// Skips a `for<'a, 'b>` binder.
    fn skip_higher_ranked(&mut self) -> Result<(), TypeNameError> {
        if self.peek_kind() == Some(Kind::Ident("for")) && self.peek_nth_kind(1) == Some(Kind::Lt)
        {
            self.pos += 2;
            while !self.eat(Kind::Gt) {
                match self.bump() {
                    Some(Token {
                        kind: Kind::Lifetime(_) | Kind::Comma,
                        ..
                    }) => {}
                    Some(token) => return Err(Self::unexpected(token, "a lifetime")),
                    None => return Err(TypeNameError::UnexpectedEnd { expected: "`>`" }),
                }
            }
        }
        Ok(())
    }

    fn parse_parenthesized_inputs(&mut self) -> Result<Vec<TypeDescriptor>, TypeNameError> {
        self.expect(Kind::LParen, "`(`")?;
        let mut inputs = Vec::new();
        while !self.eat(Kind::RParen) {
            inputs.push(self.parse_type()?);
            if !self.eat(Kind::Comma) {
                self.expect(Kind::RParen, "`,` or `)`")?;
                break;
            }
        }
        Ok(inputs)
    }

    fn parse_return_type(&mut self) -> Result<Option<Box<TypeDescriptor>>, TypeNameError> {
        if self.eat(Kind::Arrow) {
            Ok(Some(Box::new(self.parse_type()?)))
        } else {
            Ok(None)
        }
    }

    fn parse_path(&mut self) -> Result<TypePath, TypeNameError> {
        let mut segments = Vec::new();

        loop {
            let name = self.expect_ident("a path segment")?.to_string();
            let args = match self.peek_kind() {
                Some(Kind::Lt) => GenericArgs::AngleBracketed(self.parse_angle_args()?),
                Some(Kind::LParen) => GenericArgs::Parenthesized {
                    inputs: self.parse_parenthesized_inputs()?,
                    output: self.parse_return_type()?,
                },
                _ => GenericArgs::None,
            };
            segments.push(PathSegment { name, args });

            if !self.eat(Kind::PathSep) {
                break;
            }
        }

        Ok(split_namespace(segments))
    }

    fn parse_angle_args(&mut self) -> Result<Vec<GenericArg>, TypeNameError> {
        self.expect(Kind::Lt, "`<`")?;
        let mut args = Vec::new();

        while !self.eat(Kind::Gt) {
            let arg = match self.peek_kind() {
                Some(Kind::Lifetime(lifetime)) => {
                    self.bump();
                    GenericArg::Lifetime(lifetime.to_string())
                }
                Some(Kind::Int(value) | Kind::Char(value)) => {
                    self.bump();
                    GenericArg::Const(value.to_string())
                }
                Some(Kind::Ident(value @ ("true" | "false"))) => {
                    self.bump();
                    GenericArg::Const(value.to_string())
                }
                Some(Kind::Ident(name)) if self.peek_nth_kind(1) == Some(Kind::Eq) => {
                    self.pos += 2;
                    GenericArg::Binding {
                        name: name.to_string(),
                        ty: self.parse_type()?,
                    }
                }
                _ => GenericArg::Type(self.parse_type()?),
            };
            args.push(arg);

            if !self.eat(Kind::Comma) {
                self.expect(Kind::Gt, "`,` or `>`")?;
                break;
            }
        }

        Ok(args)
    }
}

/// Splits raw path segments into namespace and enclosing chain.
fn split_namespace(mut segments: Vec<PathSegment>) -> TypePath {
    let type_start = segments[..segments.len().saturating_sub(1)]
        .iter()
        .position(|segment| {
            segment.args != GenericArgs::None
                || segment.name.chars().next().is_some_and(char::is_uppercase)
        })
        .unwrap_or(segments.len().saturating_sub(1));

    let type_segments = segments.split_off(type_start);
    TypePath {
        namespace: segments.into_iter().map(|s| s.name).collect(),
        segments: type_segments,
    }
}
