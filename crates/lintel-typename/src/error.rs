//! Type-name parsing errors.

use thiserror::Error;

/// Errors produced while parsing a type-name string.
///
/// Positions are byte offsets into the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeNameError {
    /// The input was empty or only whitespace.
    #[error("empty type name")]
    Empty,

    /// The input ended while a type was still being parsed.
    #[error("unexpected end of type name, expected {expected}")]
    UnexpectedEnd {
        /// What the parser was looking for.
        expected: &'static str,
    },

    /// A token appeared where it is not allowed.
    #[error("unexpected `{found}` at position {position}, expected {expected}")]
    UnexpectedToken {
        /// The offending token text.
        found: String,
        /// Byte offset of the token.
        position: usize,
        /// What the parser was looking for.
        expected: &'static str,
    },

    /// A complete type was parsed but input remained.
    #[error("trailing input at position {position}")]
    TrailingInput {
        /// Byte offset of the first unconsumed token.
        position: usize,
    },

    /// A string literal (`extern "C"`) was not closed.
    #[error("unterminated string literal starting at position {position}")]
    UnterminatedLiteral {
        /// Byte offset of the opening quote.
        position: usize,
    },

    /// Types were nested deeper than the parser allows.
    #[error("type nesting exceeds {limit} levels at position {position}")]
    NestingTooDeep {
        /// Byte offset of the token that would open the next level.
        position: usize,
        /// The nesting limit.
        limit: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TypeNameError::UnexpectedToken {
            found: ">".to_string(),
            position: 4,
            expected: "a type",
        };
        assert_eq!(err.to_string(), "unexpected `>` at position 4, expected a type");
    }

    #[test]
    fn test_trailing_input_display() {
        let err = TypeNameError::TrailingInput { position: 7 };
        assert!(err.to_string().contains('7'));
    }
}
