use super::error::FilterError;
use crate::record::Schema;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Optional group-opening markers, one comparison, optional closing parens.
/// Operator alternatives are ordered longest first.
static COMPARISON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<markers>(?:\([&|!])*)(?P<expression>\((?P<property>[\w:]+)(?P<operator>>=|<=|~=|>|<|=)(?P<value>[*a-z0-9\s]+)\))\)*",
    )
    .expect("valid comparison regex")
});

pub const NEGATION_MARKER: char = '!';
pub const WILDCARD: &str = "*";

/// Comparison operators recognised inside an atomic comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equal,
    Approximate,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::Approximate => "~=",
            Operator::Less => "<",
            Operator::LessOrEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterOrEqual => ">=",
        }
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(Operator::Equal),
            "~=" => Ok(Operator::Approximate),
            "<" => Ok(Operator::Less),
            "<=" => Ok(Operator::LessOrEqual),
            ">" => Ok(Operator::Greater),
            ">=" => Ok(Operator::GreaterOrEqual),
            other => Err(format!("unknown comparison operator '{other}'")),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single `property operator value` leaf test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicComparison {
    /// Canonical field name of the target record type
    pub property: String,
    pub operator: Operator,
    /// Lower-cased literal, never empty
    pub value: String,
    pub negated: bool,
}

impl AtomicComparison {
    pub fn is_presence(&self) -> bool {
        self.operator == Operator::Equal && self.value == WILDCARD
    }

    pub fn has_wildcard(&self) -> bool {
        self.value.contains(WILDCARD)
    }
}

/// One matched leaf together with the parentheses around it
#[derive(Debug, Clone)]
pub struct Extracted {
    /// Run of `(&`, `(|`, `(!` opening groups right before the comparison
    pub markers: String,
    /// Number of groups closed right after the comparison
    pub closing: usize,
    pub comparison: AtomicComparison,
}

/// Every atomic comparison of a filter, in text order
#[derive(Debug, Clone)]
pub struct Extraction {
    pub comparisons: Vec<Extracted>,
}

/// Scan a filter for atomic comparisons.
///
/// The matches must tile the lower-cased text exactly; anything the grammar
/// does not model (empty values, stray characters, bare parentheses) leaves a
/// gap and the filter is rejected as malformed.
pub fn extract(filter: &str, schema: &Schema) -> Result<Extraction, FilterError> {
    let text = filter.to_lowercase();
    let mut comparisons = Vec::new();
    let mut reconstructed = 0;

    for captures in COMPARISON_RE.captures_iter(&text) {
        let (Some(whole), Some(expression)) = (captures.get(0), captures.name("expression")) else {
            continue;
        };
        if whole.start() != reconstructed {
            return Err(malformed(filter));
        }
        reconstructed = whole.end();

        let markers = captures
            .name("markers")
            .map(|m| m.as_str())
            .unwrap_or_default();
        let property = captures
            .name("property")
            .map(|m| m.as_str())
            .unwrap_or_default();
        let operator = captures
            .name("operator")
            .and_then(|m| m.as_str().parse::<Operator>().ok())
            .ok_or_else(|| malformed(filter))?;
        let value = captures
            .name("value")
            .map(|m| m.as_str())
            .unwrap_or_default();

        let canonical = schema
            .resolve(property)
            .ok_or_else(|| FilterError::UnknownProperty {
                property: property.to_string(),
                filter: filter.to_string(),
            })?;

        comparisons.push(Extracted {
            markers: markers.to_string(),
            closing: whole.end() - expression.end(),
            comparison: AtomicComparison {
                property: canonical.to_string(),
                operator,
                value: value.to_string(),
                negated: markers.contains(NEGATION_MARKER),
            },
        });
    }

    if reconstructed != text.len() || comparisons.is_empty() {
        return Err(malformed(filter));
    }

    log::debug!(
        "extracted {} comparison(s) from filter {}",
        comparisons.len(),
        filter
    );

    Ok(Extraction { comparisons })
}

fn malformed(filter: &str) -> FilterError {
    FilterError::Malformed {
        filter: filter.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new(["Sn", "GivenName", "Version", "WhenChanged", "Civility"])
    }

    #[test]
    fn test_matches_carry_their_group_parentheses() {
        let filter = "(&(WhenChanged=*)(|(sn=Vandenbussche)(!(Version>=5))))";
        let extraction = extract(filter, &schema()).unwrap();

        assert_eq!(extraction.comparisons.len(), 3);

        let first = &extraction.comparisons[0];
        assert_eq!(first.markers, "(&");
        assert_eq!(first.closing, 0);
        assert_eq!(first.comparison.property, "WhenChanged");
        assert!(first.comparison.is_presence());

        let second = &extraction.comparisons[1];
        assert_eq!(second.markers, "(|");
        assert_eq!(second.comparison.value, "vandenbussche");
        assert!(!second.comparison.negated);

        let third = &extraction.comparisons[2];
        assert_eq!(third.comparison.operator, Operator::GreaterOrEqual);
        assert_eq!(third.comparison.value, "5");
        assert!(third.comparison.negated);
        assert_eq!(third.markers, "(!");
        assert_eq!(third.closing, 3);
    }

    #[test]
    fn test_operators_prefer_longest_match() {
        let cases = [
            ("(version>=5)", Operator::GreaterOrEqual),
            ("(version<=5)", Operator::LessOrEqual),
            ("(sn~=doe)", Operator::Approximate),
            ("(version>5)", Operator::Greater),
            ("(version<5)", Operator::Less),
            ("(sn=doe)", Operator::Equal),
        ];
        for (filter, expected) in cases {
            let extraction = extract(filter, &schema()).unwrap();
            assert_eq!(extraction.comparisons[0].comparison.operator, expected);
        }
    }

    #[test]
    fn test_empty_value_is_malformed() {
        for filter in ["(civility=)", "(|(civility=*)(WhenChanged=))"] {
            assert!(
                matches!(extract(filter, &schema()), Err(FilterError::Malformed { .. })),
                "expected malformed error for {filter}"
            );
        }
    }

    #[test]
    fn test_unmodelled_characters_are_malformed() {
        for filter in ["(sn=o'neil)", "((sn=doe))", "(&(sn=doe) )", "(sn=doe)x"] {
            assert!(
                matches!(extract(filter, &schema()), Err(FilterError::Malformed { .. })),
                "expected malformed error for {filter}"
            );
        }
    }

    #[test]
    fn test_unknown_property_is_rejected() {
        let result = extract("(mail=*)", &schema());
        assert!(matches!(
            result,
            Err(FilterError::UnknownProperty { ref property, .. }) if property == "mail"
        ));
    }

    #[test]
    fn test_value_keeps_inner_whitespace() {
        let extraction = extract("(sn=van den bussche)", &schema()).unwrap();
        assert_eq!(extraction.comparisons[0].comparison.value, "van den bussche");
    }
}
