use std::fmt;

/// The expression type lattice.
///
/// `Value` is the top type: every other type is a subtype of it. `Array`
/// carries an item type and an optional fixed length; an array type with no
/// length constraint accepts arrays of any length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Null,
    Boolean,
    Number,
    String,
    Color,
    Object,
    Value,
    Array(Box<Type>, Option<usize>),
}

impl Type {
    /// An array type with no length constraint.
    pub fn array(item: Type) -> Type {
        Type::Array(Box::new(item), None)
    }

    /// An array type with a fixed length.
    pub fn array_n(item: Type, n: usize) -> Type {
        Type::Array(Box::new(item), Some(n))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Null => write!(f, "Null"),
            Type::Boolean => write!(f, "Boolean"),
            Type::Number => write!(f, "Number"),
            Type::String => write!(f, "String"),
            Type::Color => write!(f, "Color"),
            Type::Object => write!(f, "Object"),
            Type::Value => write!(f, "Value"),
            Type::Array(item, n) => match (item.as_ref(), n) {
                (Type::Value, None) => write!(f, "Array"),
                (item, None) => write!(f, "Array<{}>", item),
                (item, Some(n)) => write!(f, "Array<{}, {}>", item, n),
            },
        }
    }
}

/// Checks that `actual` is a subtype of `expected`.
///
/// Returns `None` on success, or the error message to report. The check is
/// pure and total: `T <: Value` for every `T`, `T <: T`, and
/// `Array(A, n) <: Array(B, m)` iff `A <: B` and `m` is unspecified or
/// `n == m`.
pub fn check_subtype(expected: &Type, actual: &Type) -> Option<String> {
    let ok = match (expected, actual) {
        (Type::Value, _) => true,
        (Type::Array(expected_item, expected_n), Type::Array(actual_item, actual_n)) => {
            check_subtype(expected_item, actual_item).is_none()
                && (expected_n.is_none() || expected_n == actual_n)
        }
        _ => expected == actual,
    };

    if ok {
        None
    } else {
        Some(format!("Expected {} but found {} instead.", expected, actual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_type_is_a_subtype_of_value() {
        for t in [
            Type::Null,
            Type::Boolean,
            Type::Number,
            Type::String,
            Type::Color,
            Type::Object,
            Type::Value,
            Type::array(Type::Number),
            Type::array_n(Type::String, 3),
        ] {
            assert_eq!(check_subtype(&Type::Value, &t), None);
        }
    }

    #[test]
    fn subtyping_is_reflexive() {
        let t = Type::array_n(Type::Number, 2);
        assert_eq!(check_subtype(&t, &t), None);
    }

    #[test]
    fn array_length_constraint() {
        // Unconstrained expected length accepts any actual length.
        assert_eq!(
            check_subtype(&Type::array(Type::Number), &Type::array_n(Type::Number, 4)),
            None
        );
        // A fixed expected length must match exactly.
        assert!(
            check_subtype(&Type::array_n(Type::Number, 3), &Type::array_n(Type::Number, 4))
                .is_some()
        );
        // Item types must be subtypes.
        assert!(check_subtype(&Type::array(Type::Number), &Type::array(Type::String)).is_some());
        assert_eq!(
            check_subtype(&Type::array(Type::Value), &Type::array(Type::String)),
            None
        );
    }

    #[test]
    fn value_is_not_a_subtype_of_primitives() {
        let err = check_subtype(&Type::Number, &Type::Value).unwrap();
        assert_eq!(err, "Expected Number but found Value instead.");
    }

    #[test]
    fn display_forms() {
        assert_eq!(Type::array(Type::Value).to_string(), "Array");
        assert_eq!(Type::array(Type::Number).to_string(), "Array<Number>");
        assert_eq!(Type::array_n(Type::Number, 3).to_string(), "Array<Number, 3>");
    }
}
