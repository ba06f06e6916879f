//! Test class filter chain
//!
//! A descriptor is accepted only if every filter in the chain accepts it.
//! User patterns come first: exclude, then include, then the structural
//! checks. Exclude therefore vetoes explicit includes.
//!
//! Patterns use shell wildcard rules: `*`, `?` and `[...]` are special,
//! braces and backslashes match themselves.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::error::{ProjectError, Result};

use super::{ClassDescriptor, CLASS_SUFFIX};

/// A compiled set of glob patterns matched against fully-qualified class names
#[derive(Debug, Clone)]
pub struct PatternSet {
    set: GlobSet,
}

impl PatternSet {
    /// Compile patterns. Returns `None` for an empty list, which means
    /// "no patterns configured" rather than "nothing matches".
    pub fn new(patterns: &[String]) -> Result<Option<Self>> {
        if patterns.is_empty() {
            return Ok(None);
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = GlobBuilder::new(&literal_braces(pattern))
                .backslash_escape(false)
                .build()
                .map_err(|e| ProjectError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.kind().to_string(),
                })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|e| ProjectError::InvalidPattern {
            pattern: patterns.join(" "),
            message: e.to_string(),
        })?;

        Ok(Some(Self { set }))
    }

    /// Whether the name matches at least one pattern (anchored, whole string)
    pub fn is_match(&self, class_name: &str) -> bool {
        self.set.is_match(class_name)
    }
}

/// Wraps braces outside character classes in a class of their own so
/// globset does not read them as alternation.
fn literal_braces(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '[' => {
                out.push('[');
                if let Some(&negate) = chars.peek().filter(|&&n| n == '!' || n == '^') {
                    out.push(negate);
                    chars.next();
                }
                // a leading `]` is a member, not the end of the class
                if chars.peek() == Some(&']') {
                    out.push(']');
                    chars.next();
                }
                for member in chars.by_ref() {
                    out.push(member);
                    if member == ']' {
                        break;
                    }
                }
            }
            '{' | '}' => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            _ => out.push(c),
        }
    }
    out
}

/// A single predicate over class descriptors
#[derive(Debug, Clone)]
pub enum ClassFilter {
    /// Reject classes whose name matches any pattern
    Exclude(PatternSet),
    /// Accept only classes whose name matches at least one pattern
    Include(PatternSet),
    /// Surefire-style naming convention: `Test*`, `*Test`, `*TestCase`,
    /// top-level classes only
    TestName,
    /// Reject interfaces and abstract classes
    Concrete,
}

impl ClassFilter {
    /// Whether the descriptor passes this filter
    pub fn accept(&self, class: &ClassDescriptor) -> bool {
        match self {
            Self::Exclude(patterns) => !patterns.is_match(&class.class_name),
            Self::Include(patterns) => patterns.is_match(&class.class_name),
            Self::TestName => is_test_class_name(class.file_name()),
            Self::Concrete => !(class.is_interface || class.is_abstract),
        }
    }

    /// Short name used in log output
    pub fn name(&self) -> &'static str {
        match self {
            Self::Exclude(_) => "exclude-patterns",
            Self::Include(_) => "include-patterns",
            Self::TestName => "test-name",
            Self::Concrete => "concrete",
        }
    }
}

fn is_test_class_name(file_name: &str) -> bool {
    if file_name.contains('$') {
        return false;
    }
    let Some(stem) = file_name.strip_suffix(CLASS_SUFFIX) else {
        return false;
    };
    stem.starts_with("Test") || stem.ends_with("Test") || stem.ends_with("TestCase")
}

/// Ordered conjunction of class filters, built once
#[derive(Debug, Clone)]
pub struct FilterChain {
    filters: Vec<ClassFilter>,
}

impl FilterChain {
    /// Build the default chain with optional user include/exclude patterns
    pub fn new(include_patterns: &[String], exclude_patterns: &[String]) -> Result<Self> {
        let exclude = PatternSet::new(exclude_patterns)?.map(ClassFilter::Exclude);
        let include = PatternSet::new(include_patterns)?.map(ClassFilter::Include);

        let filters: Vec<ClassFilter> = [exclude, include]
            .into_iter()
            .flatten()
            .chain([ClassFilter::TestName, ClassFilter::Concrete])
            .collect();

        debug!(
            filters = ?filters.iter().map(ClassFilter::name).collect::<Vec<_>>(),
            "built class filter chain"
        );
        Ok(Self { filters })
    }

    /// Whether the descriptor passes every filter
    pub fn accept(&self, class: &ClassDescriptor) -> bool {
        self.filters.iter().all(|f| f.accept(class))
    }

    /// Filters in evaluation order
    pub fn filters(&self) -> &[ClassFilter] {
        &self.filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn class(fqcn: &str) -> ClassDescriptor {
        let simple = fqcn.rsplit('.').next().unwrap();
        ClassDescriptor {
            path: PathBuf::from(format!("/p/target/test-classes/{}.class", simple)),
            class_name: fqcn.to_string(),
            is_interface: false,
            is_abstract: false,
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_name_heuristic() {
        assert!(is_test_class_name("TestWidget.class"));
        assert!(is_test_class_name("WidgetTest.class"));
        assert!(is_test_class_name("WidgetTestCase.class"));
        assert!(!is_test_class_name("Widget.class"));
        assert!(!is_test_class_name("WidgetTests.class"));
        assert!(!is_test_class_name("WidgetTest$Inner.class"));
        assert!(!is_test_class_name("WidgetTest.java"));
    }

    #[test]
    fn test_concrete_filter() {
        let mut c = class("com.acme.WidgetTest");
        assert!(ClassFilter::Concrete.accept(&c));
        c.is_abstract = true;
        assert!(!ClassFilter::Concrete.accept(&c));
        c.is_abstract = false;
        c.is_interface = true;
        assert!(!ClassFilter::Concrete.accept(&c));
    }

    #[test]
    fn test_include_patterns_are_anchored() {
        let set = PatternSet::new(&strings(&["com.acme.*Test"])).unwrap().unwrap();
        assert!(set.is_match("com.acme.WidgetTest"));
        assert!(set.is_match("com.acme.sub.WidgetTest"));
        assert!(!set.is_match("org.com.acme.WidgetTest"));
        assert!(!set.is_match("com.acme.WidgetTestCase"));
    }

    #[test]
    fn test_single_char_wildcard() {
        let set = PatternSet::new(&strings(&["a.Test?"])).unwrap().unwrap();
        assert!(set.is_match("a.TestA"));
        assert!(!set.is_match("a.TestAB"));
        assert!(!set.is_match("a.Test"));
    }

    #[test]
    fn test_braces_and_backslashes_are_literal() {
        let set = PatternSet::new(&strings(&["com.acme.{Fast,Slow}Test"])).unwrap().unwrap();
        assert!(set.is_match("com.acme.{Fast,Slow}Test"));
        assert!(!set.is_match("com.acme.FastTest"));

        let set = PatternSet::new(&strings(&["a\\*"])).unwrap().unwrap();
        assert!(set.is_match("a\\Test"));
        assert!(!set.is_match("a*"));
    }

    #[test]
    fn test_braces_inside_class_untouched() {
        assert_eq!(literal_braces("a[{]b{c}"), "a[{]b[{]c[}]");
        assert_eq!(literal_braces("a[]}]"), "a[]}]");
        let set = PatternSet::new(&strings(&["a.[!{]Test"])).unwrap().unwrap();
        assert!(set.is_match("a.XTest"));
        assert!(!set.is_match("a.{Test"));
    }

    #[test]
    fn test_empty_patterns_build_no_filter() {
        assert!(PatternSet::new(&[]).unwrap().is_none());
        let chain = FilterChain::new(&[], &[]).unwrap();
        assert_eq!(chain.filters().len(), 2);
    }

    #[test]
    fn test_chain_order() {
        let chain = FilterChain::new(&strings(&["*"]), &strings(&["*Slow*"])).unwrap();
        let names: Vec<_> = chain.filters().iter().map(ClassFilter::name).collect();
        assert_eq!(
            names,
            vec!["exclude-patterns", "include-patterns", "test-name", "concrete"]
        );
    }

    #[test]
    fn test_exclude_vetoes_include() {
        let chain = FilterChain::new(
            &strings(&["com.acme.*"]),
            &strings(&["com.acme.SlowTest"]),
        )
        .unwrap();
        assert!(chain.accept(&class("com.acme.FastTest")));
        assert!(!chain.accept(&class("com.acme.SlowTest")));
    }

    #[test]
    fn test_include_restricts() {
        let chain = FilterChain::new(&strings(&["com.acme.*Test"]), &[]).unwrap();
        assert!(chain.accept(&class("com.acme.FastTest")));
        assert!(!chain.accept(&class("org.other.FastTest")));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = FilterChain::new(&strings(&["com.[acme"]), &[]).unwrap_err();
        assert!(err.to_string().contains("com.[acme"));
    }
}
