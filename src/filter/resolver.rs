use super::error::FilterError;
use super::expr::Expr;
use super::extract::Extraction;

/// Deepest group nesting a filter may use
pub const MAX_DEPTH: usize = 64;

/// Logical operator of a parenthesized group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOperator {
    And,
    Or,
    Not,
}

impl GroupOperator {
    fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            b'&' => Some(GroupOperator::And),
            b'|' => Some(GroupOperator::Or),
            b'!' => Some(GroupOperator::Not),
            _ => None,
        }
    }

    /// AND/OR only collapse over two or more operands
    fn collapsible(self, children: usize) -> bool {
        match self {
            GroupOperator::Not => children > 0,
            GroupOperator::And | GroupOperator::Or => children >= 2,
        }
    }
}

/// Group skeleton of a filter; leaves point at extracted comparisons by
/// their position in the extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(usize),
    Group {
        operator: GroupOperator,
        children: Vec<Node>,
    },
}

struct SkeletonBuilder<'a> {
    open: Vec<(GroupOperator, Vec<Node>)>,
    root: Option<Node>,
    filter: &'a str,
}

impl SkeletonBuilder<'_> {
    fn unresolvable(&self) -> FilterError {
        FilterError::Unresolvable {
            filter: self.filter.to_string(),
        }
    }

    fn open_groups(&mut self, markers: &str) -> Result<(), FilterError> {
        // markers come in pairs: `(` then the operator
        for marker in markers.bytes().skip(1).step_by(2) {
            let operator = GroupOperator::from_marker(marker).ok_or_else(|| self.unresolvable())?;
            if self.open.len() >= MAX_DEPTH {
                return Err(FilterError::TooDeep {
                    max_depth: MAX_DEPTH,
                    filter: self.filter.to_string(),
                });
            }
            self.open.push((operator, Vec::new()));
        }
        Ok(())
    }

    fn attach(&mut self, node: Node) -> Result<(), FilterError> {
        if let Some((_, children)) = self.open.last_mut() {
            children.push(node);
        } else if self.root.is_none() {
            self.root = Some(node);
        } else {
            return Err(self.unresolvable());
        }
        Ok(())
    }

    fn close_groups(&mut self, closing: usize) -> Result<(), FilterError> {
        for _ in 0..closing {
            let (operator, children) = self.open.pop().ok_or_else(|| self.unresolvable())?;
            if !operator.collapsible(children.len()) {
                return Err(self.unresolvable());
            }
            self.attach(Node::Group { operator, children })?;
        }
        Ok(())
    }
}

/// Rebuild the group structure of an extracted filter from the parentheses
/// each comparison opens before it and closes after it
pub fn parse_skeleton(extraction: &Extraction, filter: &str) -> Result<Node, FilterError> {
    let mut builder = SkeletonBuilder {
        open: Vec::new(),
        root: None,
        filter,
    };

    for (index, extracted) in extraction.comparisons.iter().enumerate() {
        // nothing may follow a finished root
        if builder.root.is_some() {
            return Err(builder.unresolvable());
        }
        builder.open_groups(&extracted.markers)?;
        builder.attach(Node::Leaf(index))?;
        builder.close_groups(extracted.closing)?;
    }

    match builder.root.take() {
        Some(root) if builder.open.is_empty() => Ok(root),
        _ => Err(builder.unresolvable()),
    }
}

/// Set each comparison's negation from the number of NOT groups above it
pub fn assign_negation(node: &Node, negated: bool, extraction: &mut Extraction) {
    match node {
        Node::Leaf(index) => {
            if let Some(extracted) = extraction.comparisons.get_mut(*index) {
                extracted.comparison.negated = negated;
            }
        }
        Node::Group { operator, children } => {
            let negated = negated ^ (*operator == GroupOperator::Not);
            for child in children {
                assign_negation(child, negated, extraction);
            }
        }
    }
}

/// Fragments under assembly, addressed by integer key
#[derive(Debug, Default)]
struct FragmentArena {
    slots: Vec<Option<Expr>>,
}

impl FragmentArena {
    fn insert(&mut self, expr: Expr) -> usize {
        self.slots.push(Some(expr));
        self.slots.len() - 1
    }

    fn take(&mut self, key: usize) -> Option<Expr> {
        self.slots.get_mut(key).and_then(Option::take)
    }

    fn into_root(self) -> Option<Expr> {
        let mut remaining = self.slots.into_iter().flatten();
        let root = remaining.next()?;
        remaining.next().is_none().then_some(root)
    }
}

struct GroupResolver<'a> {
    arena: FragmentArena,
    filter: &'a str,
}

impl GroupResolver<'_> {
    fn collapse(&mut self, node: &Node, negated: bool) -> Result<usize, FilterError> {
        let (operator, children) = match node {
            Node::Leaf(key) => return Ok(*key),
            Node::Group { operator, children } => (*operator, children),
        };

        // NOT reads as the negated conjunction of its children; under an odd
        // number of negations AND and OR swap (De Morgan)
        let negated_children = negated ^ (operator == GroupOperator::Not);
        let conjunction = (operator != GroupOperator::Or) ^ negated_children;

        let keys = children
            .iter()
            .map(|child| self.collapse(child, negated_children))
            .collect::<Result<Vec<_>, _>>()?;

        if let [key] = keys.as_slice() {
            return Ok(*key);
        }

        let mut fragments = Vec::with_capacity(keys.len());
        for key in keys {
            fragments.push(self.arena.take(key).ok_or_else(|| FilterError::Unresolvable {
                filter: self.filter.to_string(),
            })?);
        }

        Ok(self.arena.insert(if conjunction {
            Expr::And(fragments)
        } else {
            Expr::Or(fragments)
        }))
    }
}

/// Fold the skeleton bottom-up over the compiled leaves.
///
/// `leaves[i]` is the fragment of comparison `i`; it gets key `i`. Every
/// group consumes its children's keys and yields a new one until a single
/// root is left.
pub fn resolve(skeleton: &Node, leaves: Vec<Expr>, filter: &str) -> Result<Expr, FilterError> {
    let mut resolver = GroupResolver {
        arena: FragmentArena {
            slots: leaves.into_iter().map(Some).collect(),
        },
        filter,
    };

    resolver.collapse(skeleton, false)?;
    resolver
        .arena
        .into_root()
        .ok_or_else(|| FilterError::Unresolvable {
            filter: filter.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::extract::extract;
    use crate::record::Schema;

    fn schema() -> Schema {
        Schema::new(["a", "b", "c", "d"])
    }

    fn skeleton(filter: &str) -> Result<Node, FilterError> {
        let extraction = extract(filter, &schema())?;
        parse_skeleton(&extraction, filter)
    }

    fn leaf(name: &str) -> Expr {
        Expr::Present {
            field: name.to_string(),
        }
    }

    #[test]
    fn test_skeleton_follows_nesting() {
        let node = skeleton("(&(a=1)(|(b=2)(c=3)))").unwrap();
        assert_eq!(
            node,
            Node::Group {
                operator: GroupOperator::And,
                children: vec![
                    Node::Leaf(0),
                    Node::Group {
                        operator: GroupOperator::Or,
                        children: vec![Node::Leaf(1), Node::Leaf(2)],
                    },
                ],
            }
        );
    }

    #[test]
    fn test_skeleton_is_rebuilt_from_marker_runs() {
        let filter = "(|(!(a=1))(&(b=2)(c=3)))";
        let extraction = extract(filter, &schema()).unwrap();
        let runs: Vec<(&str, usize)> = extraction
            .comparisons
            .iter()
            .map(|e| (e.markers.as_str(), e.closing))
            .collect();
        assert_eq!(runs, vec![("(|(!", 1), ("(&", 0), ("", 2)]);

        assert_eq!(
            parse_skeleton(&extraction, filter).unwrap(),
            Node::Group {
                operator: GroupOperator::Or,
                children: vec![
                    Node::Group {
                        operator: GroupOperator::Not,
                        children: vec![Node::Leaf(0)],
                    },
                    Node::Group {
                        operator: GroupOperator::And,
                        children: vec![Node::Leaf(1), Node::Leaf(2)],
                    },
                ],
            }
        );
    }

    #[test]
    fn test_single_comparison_is_its_own_root() {
        assert_eq!(skeleton("(a=1)").unwrap(), Node::Leaf(0));
    }

    #[test]
    fn test_single_operand_and_or_cannot_collapse() {
        for filter in ["(&(a=1))", "(|(a=1))", "(&(a=1)(|(&(b=1)(c=1))))"] {
            assert!(
                matches!(skeleton(filter), Err(FilterError::Unresolvable { .. })),
                "expected unresolvable for {filter}"
            );
        }
    }

    #[test]
    fn test_trailing_siblings_at_root_cannot_collapse() {
        assert!(matches!(
            skeleton("(a=1)(b=2)"),
            Err(FilterError::Unresolvable { .. })
        ));
    }

    #[test]
    fn test_nesting_depth_is_bounded() {
        let depth = MAX_DEPTH + 1;
        let filter = format!("{}(a=1){}", "(!".repeat(depth), ")".repeat(depth));
        assert!(matches!(
            skeleton(&filter),
            Err(FilterError::TooDeep { .. })
        ));
    }

    #[test]
    fn test_negation_counts_enclosing_not_groups() {
        let filter = "(&(a=1)(!(b=2))(!(!(c=3)))(!(|(d=4)(a=5))))";
        let mut extraction = extract(filter, &schema()).unwrap();
        let node = parse_skeleton(&extraction, filter).unwrap();
        assign_negation(&node, false, &mut extraction);

        let negated: Vec<bool> = extraction
            .comparisons
            .iter()
            .map(|e| e.comparison.negated)
            .collect();
        assert_eq!(negated, vec![false, true, false, true, true]);
    }

    #[test]
    fn test_resolve_joins_left_to_right() {
        let node = skeleton("(&(a=1)(|(b=2)(c=3)))").unwrap();
        let expr = resolve(&node, vec![leaf("a"), leaf("b"), leaf("c")], "f").unwrap();
        assert_eq!(
            expr,
            Expr::And(vec![leaf("a"), Expr::Or(vec![leaf("b"), leaf("c")])])
        );
    }

    #[test]
    fn test_not_over_group_applies_de_morgan() {
        let node = skeleton("(!(&(a=1)(b=2)))").unwrap();
        let expr = resolve(&node, vec![leaf("a"), leaf("b")], "f").unwrap();
        assert_eq!(expr, Expr::Or(vec![leaf("a"), leaf("b")]));

        let node = skeleton("(!(a=1)(b=2))").unwrap();
        let expr = resolve(&node, vec![leaf("a"), leaf("b")], "f").unwrap();
        assert_eq!(expr, Expr::Or(vec![leaf("a"), leaf("b")]));

        let node = skeleton("(!(!(|(a=1)(b=2))))").unwrap();
        let expr = resolve(&node, vec![leaf("a"), leaf("b")], "f").unwrap();
        assert_eq!(expr, Expr::Or(vec![leaf("a"), leaf("b")]));
    }

    #[test]
    fn test_leftover_fragments_are_unresolvable() {
        let err = resolve(&Node::Leaf(0), vec![leaf("a"), leaf("b")], "f").unwrap_err();
        assert!(matches!(err, FilterError::Unresolvable { .. }));
    }
}
