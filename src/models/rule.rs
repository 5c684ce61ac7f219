use serde::{Deserialize, Serialize};

/// Relative floating placement requested by a rule's `area` token.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Area {
    Center,
    Left,
    Right,
    Top,
    Bottom,
}

impl Area {
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "center" => Some(Self::Center),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }
}

/// A placement rule consulted once, at adoption.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Rule {
    pub class: Option<String>,
    pub title: Option<String>,
    pub workspace: Option<usize>,
    pub monitor: Option<usize>,
    pub floating: Option<bool>,
    pub area: Option<Area>,
}

impl Rule {
    /// Exact-equality match on class (and title, when the rule carries one).
    /// A window missing a field never matches a rule that specifies it.
    #[must_use]
    pub fn matches(&self, class: Option<&str>, title: Option<&str>) -> bool {
        if let Some(wanted) = &self.class {
            match class {
                Some(c) if c == wanted => {}
                _ => return false,
            }
        }
        if let Some(wanted) = &self.title {
            match title {
                Some(t) if t == wanted => {}
                _ => return false,
            }
        }
        self.class.is_some() || self.title.is_some()
    }
}

/// First match wins; insertion order is preserved.
pub fn first_match<'a>(
    rules: &'a [Rule],
    class: Option<&str>,
    title: Option<&str>,
) -> Option<&'a Rule> {
    rules.iter().find(|r| r.matches(class, title))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_rule(class: &str, workspace: usize) -> Rule {
        Rule {
            class: Some(class.to_string()),
            workspace: Some(workspace),
            ..Rule::default()
        }
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = vec![class_rule("Firefox", 2), class_rule("Firefox", 5)];
        let hit = first_match(&rules, Some("Firefox"), None).unwrap();
        assert_eq!(hit.workspace, Some(2));
    }

    #[test]
    fn title_must_also_match_when_specified() {
        let rule = Rule {
            class: Some("Xterm".into()),
            title: Some("scratch".into()),
            ..Rule::default()
        };
        assert!(rule.matches(Some("Xterm"), Some("scratch")));
        assert!(!rule.matches(Some("Xterm"), Some("shell")));
        assert!(!rule.matches(Some("Xterm"), None));
    }

    #[test]
    fn windows_without_a_class_never_match_class_rules() {
        let rules = vec![class_rule("Firefox", 2)];
        assert!(first_match(&rules, None, None).is_none());
        assert!(first_match(&rules, None, Some("Firefox")).is_none());
    }

    #[test]
    fn empty_rule_matches_nothing() {
        assert!(!Rule::default().matches(Some("Xterm"), Some("shell")));
    }
}
