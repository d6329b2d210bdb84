//! Properties of the error model.

use lintel_core::{FieldErrors, LintelError};
use proptest::prelude::*;

/// Leaf errors, tagged by message so the selected one can be identified.
fn leaf() -> impl Strategy<Value = LintelError> {
    prop_oneof![
        "[a-z]{1,12}".prop_map(LintelError::bad_request),
        "[a-z]{1,12}".prop_map(LintelError::internal),
        "[a-z]{1,12}".prop_map(LintelError::panic),
    ]
}

/// Arbitrarily nested aggregates, possibly containing empty ones.
fn nested() -> impl Strategy<Value = LintelError> {
    leaf().prop_recursive(4, 32, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(LintelError::aggregate)
    })
}

/// Follows first children by hand, the way a reader would.
fn first_leaf(error: &LintelError) -> &LintelError {
    match error {
        LintelError::Aggregate { errors } if !errors.is_empty() => first_leaf(&errors[0]),
        other => other,
    }
}

proptest! {
    #[test]
    fn innermost_follows_first_children(error in nested()) {
        let expected = first_leaf(&error);
        let innermost = error.innermost();

        prop_assert_eq!(innermost.kind(), expected.kind());
        prop_assert_eq!(innermost.message(), expected.message());
    }

    #[test]
    fn into_innermost_matches_innermost(error in nested()) {
        let kind = error.innermost().kind();
        let message = error.innermost().message();

        let owned = error.into_innermost();
        prop_assert_eq!(owned.kind(), kind);
        prop_assert_eq!(owned.message(), message);
    }

    #[test]
    fn innermost_is_never_a_non_empty_aggregate(error in nested()) {
        if let LintelError::Aggregate { errors } = error.innermost() {
            prop_assert!(errors.is_empty());
        }
    }

    #[test]
    fn field_errors_keep_every_message(
        entries in prop::collection::vec(("[a-z]{1,6}", "[a-z ]{1,20}"), 0..16)
    ) {
        let mut errors = FieldErrors::new();
        for (field, message) in &entries {
            errors.add(field.clone(), message.clone());
        }

        let total: usize = errors.fields.values().map(Vec::len).sum();
        prop_assert_eq!(total, entries.len());

        let json = serde_json::to_value(&errors).unwrap();
        let object = json.as_object().unwrap();
        prop_assert_eq!(object.len(), errors.len());
    }
}

#[test]
fn bad_request_body_shape() {
    let error = LintelError::aggregate([LintelError::bad_request_with_fields(
        "Invalid order",
        FieldErrors::new().with("lines[0].sku", "unknown sku"),
    )]);

    let body = error.innermost().to_bad_request_body();
    assert_eq!(
        serde_json::to_value(body).unwrap(),
        serde_json::json!({
            "message": "Invalid order",
            "errors": {"lines[0].sku": ["unknown sku"]}
        })
    );
}
