// ─── Platform Rule Evaluation ───
// Decides whether a library applies to a platform from its declarative rules.

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use super::descriptor::PlatformDescriptor;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    #[serde(alias = "deny")]
    Disallow,
}

/// Platform-match predicate. Absent fields do not constrain the match.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct OsPredicate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
}

impl OsPredicate {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Every present pattern must match the whole platform string.
    pub fn matches(&self, platform: &PlatformDescriptor) -> bool {
        let name_ok = match &self.name {
            None => true,
            Some(pattern) => platform
                .os
                .rule_names()
                .iter()
                .any(|name| full_match(pattern, name)),
        };
        let version_ok = match &self.version {
            None => true,
            Some(pattern) => full_match(pattern, &platform.os_version),
        };
        let arch_ok = match &self.arch {
            None => true,
            Some(pattern) => full_match(pattern, &platform.arch),
        };
        name_ok && version_ok && arch_ok
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PlatformRule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsPredicate>,
}

impl PlatformRule {
    pub fn allow() -> Self {
        Self {
            action: RuleAction::Allow,
            os: None,
        }
    }

    pub fn deny() -> Self {
        Self {
            action: RuleAction::Disallow,
            os: None,
        }
    }

    pub fn when(mut self, os: OsPredicate) -> Self {
        self.os = Some(os);
        self
    }
}

/// Evaluate `rules` for `platform`.
///
/// Precedence, highest first: a matching OS-specific deny, a matching
/// OS-specific allow, a generic deny, a generic allow. Rules that exist but
/// match nothing leave the library out; an empty rule list applies everywhere.
pub fn evaluate(rules: &[PlatformRule], platform: &PlatformDescriptor) -> bool {
    if rules.is_empty() {
        return true;
    }

    let specific = |action: RuleAction| {
        rules.iter().any(|rule| {
            rule.action == action && rule.os.as_ref().is_some_and(|os| os.matches(platform))
        })
    };
    let generic = |action: RuleAction| {
        rules
            .iter()
            .any(|rule| rule.action == action && rule.os.is_none())
    };

    if specific(RuleAction::Disallow) {
        false
    } else if specific(RuleAction::Allow) {
        true
    } else if generic(RuleAction::Disallow) {
        false
    } else {
        generic(RuleAction::Allow)
    }
}

/// Compiled rule patterns, keyed by source. `None` marks a pattern that is
/// not a valid regex and is compared literally instead.
static PATTERNS: LazyLock<Mutex<HashMap<String, Option<Regex>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Whether `pattern` matches the whole of `value`.
fn full_match(pattern: &str, value: &str) -> bool {
    let compiled = {
        let mut cache = PATTERNS.lock().unwrap_or_else(|p| p.into_inner());
        cache
            .entry(pattern.to_string())
            .or_insert_with(|| match Regex::new(&format!("^(?:{pattern})$")) {
                Ok(re) => Some(re),
                Err(e) => {
                    debug!("Rule pattern {:?} is not a regex ({}), comparing literally", pattern, e);
                    None
                }
            })
            .clone()
    };
    match compiled {
        Some(re) => re.is_match(value),
        None => pattern == value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::OsFamily;

    fn windows() -> PlatformDescriptor {
        PlatformDescriptor::new(OsFamily::Windows, "10.0", "x86_64")
    }

    fn linux() -> PlatformDescriptor {
        PlatformDescriptor::new(OsFamily::Linux, "6.1.0", "x86_64")
    }

    fn macos() -> PlatformDescriptor {
        PlatformDescriptor::new(OsFamily::MacOs, "14.2", "aarch64")
    }

    #[test]
    fn empty_rules_apply_everywhere() {
        assert!(evaluate(&[], &windows()));
        assert!(evaluate(&[], &linux()));
        assert!(evaluate(&[], &macos()));
    }

    #[test]
    fn specific_deny_beats_generic_allow() {
        let rules = vec![
            PlatformRule::deny().when(OsPredicate::named("windows")),
            PlatformRule::allow(),
        ];
        assert!(!evaluate(&rules, &windows()));
        assert!(evaluate(&rules, &linux()));
    }

    #[test]
    fn unmatched_specific_allow_is_closed() {
        let rules = vec![PlatformRule::allow().when(OsPredicate::named("windows"))];
        assert!(!evaluate(&rules, &linux()));
        assert!(evaluate(&rules, &windows()));
    }

    #[test]
    fn specific_allow_beats_generic_deny() {
        let rules = vec![
            PlatformRule::deny(),
            PlatformRule::allow().when(OsPredicate::named("linux")),
        ];
        assert!(evaluate(&rules, &linux()));
        assert!(!evaluate(&rules, &windows()));
    }

    #[test]
    fn order_does_not_matter() {
        let a = vec![
            PlatformRule::allow(),
            PlatformRule::deny().when(OsPredicate::named("osx")),
        ];
        let b: Vec<_> = a.iter().cloned().rev().collect();
        assert_eq!(evaluate(&a, &macos()), evaluate(&b, &macos()));
        assert!(!evaluate(&a, &macos()));
    }

    #[test]
    fn macos_matches_either_name() {
        let osx = vec![PlatformRule::allow().when(OsPredicate::named("osx"))];
        let modern = vec![PlatformRule::allow().when(OsPredicate::named("macos"))];
        assert!(evaluate(&osx, &macos()));
        assert!(evaluate(&modern, &macos()));
    }

    #[test]
    fn version_and_arch_constrain_the_match() {
        let rule = PlatformRule::deny().when(OsPredicate {
            name: Some("osx".into()),
            version: Some(r"^10\.5\.\d$".into()),
            arch: None,
        });
        let rules = vec![PlatformRule::allow(), rule];
        assert!(evaluate(&rules, &macos()));

        let old_mac = PlatformDescriptor::new(OsFamily::MacOs, "10.5.8", "x86_64");
        assert!(!evaluate(&rules, &old_mac));

        let x86_only = vec![PlatformRule::allow().when(OsPredicate {
            name: Some("windows".into()),
            version: None,
            arch: Some("x86".into()),
        })];
        assert!(!evaluate(&x86_only, &windows()));
        let win32 = PlatformDescriptor::new(OsFamily::Windows, "10.0", "x86");
        assert!(evaluate(&x86_only, &win32));
    }

    #[test]
    fn version_pattern_must_cover_whole_string() {
        let rules = vec![PlatformRule::allow().when(OsPredicate {
            name: Some("windows".into()),
            version: Some(r"10\.".into()),
            arch: None,
        })];
        let win110 = PlatformDescriptor::new(OsFamily::Windows, "110.0", "x86_64");
        assert!(!evaluate(&rules, &win110));
        assert!(!evaluate(&rules, &windows()));

        let open_ended = vec![PlatformRule::allow().when(OsPredicate {
            name: Some("windows".into()),
            version: Some(r"10\..*".into()),
            arch: None,
        })];
        assert!(evaluate(&open_ended, &windows()));
        assert!(!evaluate(&open_ended, &win110));
    }

    #[test]
    fn compiled_patterns_are_reused() {
        let platform = linux();
        assert!(full_match("lin.x", &platform.os.to_string()));
        assert!(full_match("lin.x", "linux"));
        let cache = PATTERNS.lock().unwrap();
        assert!(cache.get("lin.x").is_some_and(|re| re.is_some()));
    }

    #[test]
    fn invalid_pattern_compares_literally() {
        assert!(full_match("win(", "win("));
        assert!(!full_match("win(", "windows"));
    }

    #[test]
    fn patterns_are_case_sensitive() {
        let rules = vec![PlatformRule::allow().when(OsPredicate::named("Windows"))];
        assert!(!evaluate(&rules, &windows()));
    }

    #[test]
    fn deserializes_upstream_rule_shape() {
        let rules: Vec<PlatformRule> = serde_json::from_value(serde_json::json!([
            {"action": "allow"},
            {"action": "disallow", "os": {"name": "osx"}}
        ]))
        .unwrap();
        assert_eq!(rules[0], PlatformRule::allow());
        assert_eq!(
            rules[1],
            PlatformRule::deny().when(OsPredicate::named("osx"))
        );
    }
}
