use super::error::FilterError;

const OPENING: char = '(';
const CLOSING: char = ')';

/// Check the parenthesis structure of a filter before any semantic work
pub fn validate(filter: &str) -> Result<(), FilterError> {
    if !filter.starts_with(OPENING) || !filter.ends_with(CLOSING) {
        return Err(FilterError::MissingEnclosingParentheses {
            filter: filter.to_string(),
        });
    }

    let opening = filter.chars().filter(|c| *c == OPENING).count();
    let closing = filter.chars().filter(|c| *c == CLOSING).count();
    if opening != closing {
        return Err(FilterError::UnbalancedParentheses {
            filter: filter.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_missing_enclosing_parentheses() {
        for filter in ["(WhenChanged=*", "WhenChanged=*)", "WhenChanged=*", ""] {
            assert!(
                matches!(
                    validate(filter),
                    Err(FilterError::MissingEnclosingParentheses { .. })
                ),
                "expected missing parentheses error for {filter:?}"
            );
        }
    }

    #[test]
    fn test_rejects_unbalanced_parentheses() {
        let result = validate("(&(civility=*)(!(WhenChanged=*))");
        assert!(matches!(
            result,
            Err(FilterError::UnbalancedParentheses { .. })
        ));
    }

    #[test]
    fn test_accepts_balanced_filter() {
        assert!(validate("(&(sn=doe)(!(version>=5)))").is_ok());
    }
}
