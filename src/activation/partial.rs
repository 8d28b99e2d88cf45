//! Partial activations and attribute patterns (spec §3: `AttributePattern`,
//! §4.3: "Unknown integration (partial activation)").

use std::fmt;

/// One step of a pattern's qualifier prefix: either a wildcard (matches
/// any concrete qualifier at that position) or a concrete typed value
/// that must match by type and value.
#[derive(Clone, Debug, PartialEq)]
pub enum PatternQualifier {
    Wildcard,
    String(String),
    Int(i64),
    Uint(u64),
    Bool(bool),
}

/// A concrete qualifier value, used both to describe an attribute
/// pattern's fixed steps and to compare against an actual attribute's
/// resolved qualifier chain. `crate::attribute::Qualifier` converts into
/// this type at match time (field names compare as strings).
#[derive(Clone, Debug, PartialEq)]
pub enum QualifierValue {
    String(String),
    Int(i64),
    Uint(u64),
    Bool(bool),
}

impl PatternQualifier {
    /// Wildcard matches anything; a concrete qualifier matches iff it is
    /// equal by type and value (spec §3 `AttributePattern` semantics).
    pub fn matches(&self, actual: &QualifierValue) -> bool {
        match (self, actual) {
            (PatternQualifier::Wildcard, _) => true,
            (PatternQualifier::String(p), QualifierValue::String(a)) => p == a,
            (PatternQualifier::Int(p), QualifierValue::Int(a)) => p == a,
            (PatternQualifier::Uint(p), QualifierValue::Uint(a)) => p == a,
            (PatternQualifier::Bool(p), QualifierValue::Bool(a)) => p == a,
            _ => false,
        }
    }
}

impl fmt::Display for PatternQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternQualifier::Wildcard => write!(f, "*"),
            PatternQualifier::String(s) => write!(f, "{s:?}"),
            PatternQualifier::Int(i) => write!(f, "{i}"),
            PatternQualifier::Uint(u) => write!(f, "{u}u"),
            PatternQualifier::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// A `(variable, qualifiers)` pair describing an attribute path known to
/// be unknown, or unknown past a given prefix (spec §3).
#[derive(Clone, Debug, PartialEq)]
pub struct AttributePattern {
    pub variable: String,
    pub qualifiers: Vec<PatternQualifier>,
}

impl AttributePattern {
    pub fn new(variable: impl Into<String>) -> AttributePatternBuilder {
        AttributePatternBuilder {
            pattern: AttributePattern {
                variable: variable.into(),
                qualifiers: Vec::new(),
            },
        }
    }

    /// Spec §3: "A pattern matches an attribute A iff A's variable equals
    /// the pattern variable AND, for each qualifier position up to
    /// min(len(A.qualifiers), len(pattern.qualifiers)), the pattern
    /// element matches". Extra qualifiers on either side beyond the
    /// shorter length are ignored.
    ///
    /// Returns the number of qualifiers that matched (the "depth"), used
    /// by the resolver to prefer the most specific of several matching
    /// patterns (spec §4.3, §9 open question (b)).
    pub fn match_depth(&self, variable: &str, actual_qualifiers: &[QualifierValue]) -> Option<usize> {
        if self.variable != variable {
            return None;
        }
        let depth = self.qualifiers.len().min(actual_qualifiers.len());
        for i in 0..depth {
            if !self.qualifiers[i].matches(&actual_qualifiers[i]) {
                return None;
            }
        }
        Some(depth)
    }
}

impl fmt::Display for AttributePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.variable)?;
        for q in &self.qualifiers {
            write!(f, ".{q}")?;
        }
        Ok(())
    }
}

/// Fluent builder for [`AttributePattern`] (spec §6: `new(variable).field(s)
/// | index(i) | indexUint(u) | indexBool(b) | wildcard()`).
pub struct AttributePatternBuilder {
    pattern: AttributePattern,
}

impl AttributePatternBuilder {
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.pattern.qualifiers.push(PatternQualifier::String(name.into()));
        self
    }

    pub fn index(mut self, i: i64) -> Self {
        self.pattern.qualifiers.push(PatternQualifier::Int(i));
        self
    }

    pub fn index_uint(mut self, u: u64) -> Self {
        self.pattern.qualifiers.push(PatternQualifier::Uint(u));
        self
    }

    pub fn index_bool(mut self, b: bool) -> Self {
        self.pattern.qualifiers.push(PatternQualifier::Bool(b));
        self
    }

    pub fn wildcard(mut self) -> Self {
        self.pattern.qualifiers.push(PatternQualifier::Wildcard);
        self
    }

    pub fn build(self) -> AttributePattern {
        self.pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_match_ignores_extra_qualifiers() {
        let pattern = AttributePattern::new("a").index(0).build();
        let actual = vec![QualifierValue::Int(0), QualifierValue::String("c".into())];
        assert_eq!(pattern.match_depth("a", &actual), Some(1));
    }

    #[test]
    fn wildcard_matches_any_value() {
        let pattern = AttributePattern::new("a").wildcard().build();
        assert_eq!(pattern.match_depth("a", &[QualifierValue::Bool(false)]), Some(1));
    }

    #[test]
    fn variable_mismatch_does_not_match() {
        let pattern = AttributePattern::new("a").build();
        assert_eq!(pattern.match_depth("b", &[]), None);
    }

    #[test]
    fn longer_matching_prefix_wins_between_two_patterns() {
        let shallow = AttributePattern::new("a").build();
        let deep = AttributePattern::new("a").field("b").build();
        let actual = vec![QualifierValue::String("b".into())];
        let shallow_depth = shallow.match_depth("a", &actual).unwrap();
        let deep_depth = deep.match_depth("a", &actual).unwrap();
        assert!(deep_depth > shallow_depth);
    }
}
