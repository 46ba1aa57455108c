use crate::core::placeholder::{contains_placeholder_marker, find_placeholder};
use crate::domain::model::{PropertyMapping, PropertyValue};
use crate::utils::error::{PropsError, ResolveError, Result};
use std::collections::BTreeMap;

pub const MAX_RESOLVE_DEPTH: usize = 10;

/// What to do with a placeholder whose key is absent and which has no default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPolicy {
    /// Fail with `UnresolvedPlaceholder`.
    #[default]
    Fail,
    /// Leave the placeholder text in place.
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    pub max_depth: usize,
    pub on_missing: MissingPolicy,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_RESOLVE_DEPTH,
            on_missing: MissingPolicy::Fail,
        }
    }
}

/// Per-value bookkeeping. Cloned on every descent so sibling references never
/// see each other's chain. `root` is the placeholder that left the top-level value.
#[derive(Debug, Clone)]
struct ResolutionState {
    root: String,
    chain: Vec<String>,
    depth: usize,
}

impl ResolutionState {
    fn for_key(key: &str) -> Self {
        Self {
            root: String::new(),
            chain: vec![key.to_string()],
            depth: 0,
        }
    }

    fn descend(
        &self,
        key: &str,
        placeholder: &str,
        max_depth: usize,
    ) -> std::result::Result<Self, ResolveError> {
        let root = if self.depth == 0 {
            placeholder.to_string()
        } else {
            self.root.clone()
        };

        if self.chain.iter().any(|entered| entered == key) {
            return Err(ResolveError::CyclicReference {
                root,
                chain: self.chain.clone(),
            });
        }

        let mut chain = self.chain.clone();
        chain.push(key.to_string());
        if chain.len() > max_depth {
            return Err(ResolveError::MaxDepthExceeded {
                root,
                chain,
                max_depth,
            });
        }

        Ok(Self {
            root,
            chain,
            depth: self.depth + 1,
        })
    }
}

/// Outcome of resolving every key independently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub resolved: PropertyMapping,
    pub failures: BTreeMap<String, ResolveError>,
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// The resolved mapping, or the failure of the first failing key.
    pub fn into_result(self) -> Result<PropertyMapping> {
        match self.failures.into_iter().next() {
            Some((key, source)) => Err(PropsError::Resolve { key, source }),
            None => Ok(self.resolved),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resolver {
    options: ResolverOptions,
}

impl Resolver {
    pub fn new(options: ResolverOptions) -> Self {
        Self { options }
    }

    /// Resolves every value, failing on the first key (in key order) that cannot
    /// be resolved. The input is left untouched.
    pub fn resolve(&self, mapping: &PropertyMapping) -> Result<PropertyMapping> {
        mapping
            .iter()
            .map(|(key, value)| {
                self.resolve_entry(mapping, key, value)
                    .map(|resolved| (key.clone(), resolved))
                    .map_err(|source| PropsError::Resolve {
                        key: key.clone(),
                        source,
                    })
            })
            .collect()
    }

    /// Resolves every value independently, attributing each failure to its key.
    pub fn resolve_each(&self, mapping: &PropertyMapping) -> Resolution {
        let mut resolution = Resolution::default();
        for (key, value) in mapping {
            match self.resolve_entry(mapping, key, value) {
                Ok(resolved) => {
                    resolution.resolved.insert(key.clone(), resolved);
                }
                Err(e) => {
                    tracing::debug!("Property '{}' failed to resolve: {}", key, e);
                    resolution.failures.insert(key.clone(), e);
                }
            }
        }
        resolution
    }

    /// Resolves a single key. `Ok(None)` when the key is not in the mapping.
    pub fn resolve_key(
        &self,
        mapping: &PropertyMapping,
        key: &str,
    ) -> std::result::Result<Option<PropertyValue>, ResolveError> {
        mapping
            .get(key)
            .map(|value| self.resolve_entry(mapping, key, value))
            .transpose()
    }

    fn resolve_entry(
        &self,
        mapping: &PropertyMapping,
        key: &str,
        value: &PropertyValue,
    ) -> std::result::Result<PropertyValue, ResolveError> {
        let state = ResolutionState::for_key(key);
        self.expand(mapping, value, &state)
    }

    fn expand(
        &self,
        mapping: &PropertyMapping,
        value: &PropertyValue,
        state: &ResolutionState,
    ) -> std::result::Result<PropertyValue, ResolveError> {
        let original = match value {
            PropertyValue::String(s) if contains_placeholder_marker(s) => s,
            other => return Ok(other.clone()),
        };

        let mut working = original.clone();
        let mut from = 0;
        while let Some(placeholder) = find_placeholder(&working, from)? {
            let key = placeholder.key(&working);
            let sole = placeholder.is_sole_content(&working);

            let substitution = match mapping.get(key) {
                Some(referenced) => {
                    let next = state.descend(
                        key,
                        placeholder.text(&working),
                        self.options.max_depth,
                    )?;
                    Some(self.expand(mapping, referenced, &next)?)
                }
                None => placeholder.default_value(&working).map(PropertyValue::from),
            };

            match substitution {
                Some(resolved) if sole => return Ok(resolved),
                Some(resolved) => {
                    tracing::trace!(
                        "Depth {}: {} -> {}",
                        state.depth,
                        placeholder.text(&working),
                        resolved
                    );
                    working.replace_range(
                        placeholder.outer.start..placeholder.outer.end,
                        &resolved.to_string(),
                    );
                    from = 0;
                }
                None if sole => return Ok(PropertyValue::String(String::new())),
                None => match self.options.on_missing {
                    MissingPolicy::Fail => {
                        return Err(ResolveError::UnresolvedPlaceholder {
                            placeholder: placeholder.expression(&working).to_string(),
                            value: original.clone(),
                        });
                    }
                    MissingPolicy::Keep => from = placeholder.outer.end,
                },
            }
        }

        Ok(PropertyValue::String(working))
    }
}

/// Resolves `mapping` with default options.
pub fn resolve(mapping: &PropertyMapping) -> Result<PropertyMapping> {
    Resolver::default().resolve(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::mapping_from;

    fn resolved(pairs: &[(&str, &str)]) -> PropertyMapping {
        resolve(&mapping_from(pairs.iter().copied())).unwrap()
    }

    fn failure(pairs: &[(&str, &str)], key: &str) -> ResolveError {
        Resolver::default()
            .resolve_key(&mapping_from(pairs.iter().copied()), key)
            .unwrap_err()
    }

    /// `k1 -> k2 -> ... -> kn`, with `kn` a literal.
    fn chain_of(n: usize) -> PropertyMapping {
        let mut mapping = PropertyMapping::new();
        for i in 1..n {
            mapping.insert(format!("k{}", i), format!("${{k{}}}", i + 1).into());
        }
        mapping.insert(format!("k{}", n), "end".into());
        mapping
    }

    #[test]
    fn test_values_without_placeholders_are_unchanged() {
        let mapping = mapping_from([("a", "plain"), ("b", "cost 5$"), ("c", "")]);
        assert_eq!(resolve(&mapping).unwrap(), mapping);
    }

    #[test]
    fn test_default_value_fallback() {
        let result = resolved(&[("a", "${missing:fallback}")]);
        assert_eq!(result["a"], PropertyValue::from("fallback"));
    }

    #[test]
    fn test_default_keeps_colons() {
        let result = resolved(&[("a", "${missing:my:default:string:property}")]);
        assert_eq!(result["a"], PropertyValue::from("my:default:string:property"));
    }

    #[test]
    fn test_sole_missing_placeholder_is_empty() {
        let result = resolved(&[("a", "${missing}")]);
        assert_eq!(result["a"], PropertyValue::from(""));
    }

    #[test]
    fn test_embedded_missing_placeholder_fails() {
        let err = failure(&[("a", "x-${missing}")], "a");
        assert_eq!(
            err,
            ResolveError::UnresolvedPlaceholder {
                placeholder: "missing".to_string(),
                value: "x-${missing}".to_string(),
            }
        );
    }

    #[test]
    fn test_recursive_concatenation() {
        let result = resolved(&[("first", "1"), ("second", "${first}2"), ("a", "${second}")]);
        assert_eq!(result["a"], PropertyValue::from("12"));
        assert_eq!(result["second"], PropertyValue::from("12"));
    }

    #[test]
    fn test_several_placeholders_in_one_value() {
        let result = resolved(&[
            ("host", "localhost"),
            ("port", "8080"),
            ("url", "http://${host}:${port}/api"),
        ]);
        assert_eq!(result["url"], PropertyValue::from("http://localhost:8080/api"));
    }

    #[test]
    fn test_nested_placeholder_selects_key() {
        let result = resolved(&[
            ("env", "prod"),
            ("db.prod", "prod-db"),
            ("db", "${db.${env}}"),
        ]);
        assert_eq!(result["db"], PropertyValue::from("prod-db"));
    }

    #[test]
    fn test_bare_placeholders() {
        let result = resolved(&[("name", "world"), ("greeting", "hello $name !")]);
        assert_eq!(result["greeting"], PropertyValue::from("hello world !"));
    }

    #[test]
    fn test_direct_cycle_reports_chain() {
        let err = failure(&[("one", "${two}"), ("two", "${one}")], "one");
        assert_eq!(
            err,
            ResolveError::CyclicReference {
                root: "${two}".to_string(),
                chain: vec!["one".to_string(), "two".to_string()],
            }
        );
        assert_eq!(
            err.to_string(),
            "Infinite loop in property interpolation of ${two}: one->two"
        );
    }

    #[test]
    fn test_self_reference_is_cycle() {
        let err = failure(&[("a", "x${a}")], "a");
        assert!(matches!(err, ResolveError::CyclicReference { .. }));
    }

    #[test]
    fn test_cycle_names_placeholder_inside_text() {
        let err = failure(
            &[("one", "x-${two}"), ("two", "${three}"), ("three", "${one}")],
            "one",
        );
        assert_eq!(
            err.to_string(),
            "Infinite loop in property interpolation of ${two}: one->two->three"
        );
    }

    #[test]
    fn test_ten_distinct_levels_succeed() {
        let result = resolve(&chain_of(10)).unwrap();
        assert_eq!(result["k1"], PropertyValue::from("end"));
    }

    #[test]
    fn test_eleventh_level_exceeds_depth() {
        let err = Resolver::default()
            .resolve_key(&chain_of(11), "k1")
            .unwrap_err();
        match err {
            ResolveError::MaxDepthExceeded {
                chain, max_depth, ..
            } => {
                assert_eq!(max_depth, MAX_RESOLVE_DEPTH);
                assert_eq!(chain.len(), 11);
            }
            other => panic!("expected depth failure, got {:?}", other),
        }
    }

    #[test]
    fn test_depth_bound_is_configurable() {
        let resolver = Resolver::new(ResolverOptions {
            max_depth: 3,
            ..ResolverOptions::default()
        });
        assert!(resolver.resolve_key(&chain_of(3), "k1").is_ok());
        assert!(resolver.resolve_key(&chain_of(4), "k1").is_err());
    }

    #[test]
    fn test_sole_substitution_preserves_type() {
        let mut mapping = mapping_from([("n", "${num}"), ("label", "n=${num}")]);
        mapping.insert("num".to_string(), PropertyValue::Integer(5));

        let result = resolve(&mapping).unwrap();
        assert_eq!(result["n"], PropertyValue::Integer(5));
        assert_eq!(result["label"], PropertyValue::from("n=5"));
    }

    #[test]
    fn test_float_spliced_into_text_keeps_fraction() {
        let mut mapping = mapping_from([("label", "app-${version}")]);
        mapping.insert("version".to_string(), PropertyValue::Float(1.0));

        let result = resolve(&mapping).unwrap();
        assert_eq!(result["label"], PropertyValue::from("app-1.0"));
    }

    #[test]
    fn test_dollar_runs_resolve_as_literal_text() {
        let mapping = mapping_from([
            ("short", "$".repeat(64)),
            ("long", format!("{} ${{b}}", "$".repeat(50_000))),
            ("b", "B".to_string()),
        ]);
        let started = std::time::Instant::now();
        let result = resolve(&mapping).unwrap();

        assert!(started.elapsed() < std::time::Duration::from_secs(5));
        assert_eq!(result["short"], mapping["short"]);
        assert_eq!(
            result["long"],
            PropertyValue::from(format!("{} B", "$".repeat(50_000)))
        );
    }

    #[test]
    fn test_typed_values_pass_through() {
        let mut mapping = PropertyMapping::new();
        mapping.insert("flag".to_string(), PropertyValue::Bool(true));
        mapping.insert("ratio".to_string(), PropertyValue::Float(0.25));
        assert_eq!(resolve(&mapping).unwrap(), mapping);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mapping = mapping_from([
            ("first", "1"),
            ("second", "${first}2"),
            ("third", "${missing:3}"),
        ]);
        let once = resolve(&mapping).unwrap();
        assert_eq!(resolve(&once).unwrap(), once);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let mapping = mapping_from([("a", "${b}"), ("b", "value")]);
        let snapshot = mapping.clone();
        let _ = resolve(&mapping).unwrap();
        assert_eq!(mapping, snapshot);
    }

    #[test]
    fn test_syntax_error_for_unclosed_brace() {
        let err = failure(&[("a", "${open")], "a");
        assert_eq!(
            err,
            ResolveError::SyntaxError {
                value: "${open".to_string()
            }
        );
    }

    #[test]
    fn test_resolve_each_attributes_failures() {
        let mapping = mapping_from([
            ("good", "${base}/ok"),
            ("base", "root"),
            ("bad", "x-${missing}"),
            ("loop", "${loop}"),
        ]);
        let resolution = Resolver::default().resolve_each(&mapping);

        assert!(!resolution.is_complete());
        assert_eq!(resolution.resolved["good"], PropertyValue::from("root/ok"));
        assert!(matches!(
            resolution.failures["bad"],
            ResolveError::UnresolvedPlaceholder { .. }
        ));
        assert!(matches!(
            resolution.failures["loop"],
            ResolveError::CyclicReference { .. }
        ));

        let err = resolution.into_result().unwrap_err();
        assert!(matches!(err, PropsError::Resolve { ref key, .. } if key == "bad"));
    }

    #[test]
    fn test_resolve_key_absent() {
        let mapping = mapping_from([("a", "1")]);
        assert_eq!(Resolver::default().resolve_key(&mapping, "b").unwrap(), None);
    }

    #[test]
    fn test_keep_policy_leaves_placeholder() {
        let resolver = Resolver::new(ResolverOptions {
            on_missing: MissingPolicy::Keep,
            ..ResolverOptions::default()
        });
        let mapping = mapping_from([("a", "x-${missing}-${b}"), ("b", "B")]);
        let result = resolver.resolve(&mapping).unwrap();
        assert_eq!(result["a"], PropertyValue::from("x-${missing}-B"));
    }
}
