//! # Alias Rules
//!
//! People rarely write an address exactly the way the registry does. County
//! names are usually left out, designated-city wards are written without
//! the city, and `大字`/`字` prefixes come and go. An [`AliasTable`] turns the
//! registry path of a node into every alternative path that should also
//! find it.
//!
//! Rules are applied to the original path and to every path produced by an
//! earlier rule, so they compose:
//!
//! ```text
//! 北海道 / 余市郡 / 余市町 / 大字黒川町
//!   OmitLevel(COUNTY)      -> 北海道 / 余市町 / 大字黒川町
//!   TrimPrefix("大字")      -> 北海道 / 余市郡 / 余市町 / 黒川町
//!                          -> 北海道 / 余市町 / 黒川町
//! ```
//!
//! Every resulting path is then registered with all of its suffix
//! truncations by the label collector.

use crate::address::{AddressLevel, Standardizer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasRule {
    /// Drop every element at `level`.
    OmitLevel(AddressLevel),
    /// Drop an element at `level` when the element after it is at `next`.
    OmitWhenFollowedBy {
        level: AddressLevel,
        next: AddressLevel,
    },
    /// Replace `name` at `level` with an informal alternative.
    Substitute {
        level: AddressLevel,
        name: String,
        alternative: String,
    },
    /// Strip a leading `prefix` from any element that starts with it.
    TrimPrefix(String),
}

/// One element of a standardized ancestor path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathElement {
    pub level: AddressLevel,
    pub name: String,
}

impl PathElement {
    pub fn new(level: AddressLevel, name: &str) -> Self {
        Self {
            level,
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    rules: Vec<AliasRule>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// County omission, designated-city ward shortcut and `大字`/`字`
    /// trimming.
    pub fn standard() -> Self {
        Self::new()
            .with_rule(AliasRule::OmitLevel(AddressLevel::COUNTY))
            .with_rule(AliasRule::OmitWhenFollowedBy {
                level: AddressLevel::CITY,
                next: AddressLevel::WARD,
            })
            .with_rule(AliasRule::TrimPrefix("大字".to_string()))
            .with_rule(AliasRule::TrimPrefix("字".to_string()))
    }

    pub fn with_rule(mut self, rule: AliasRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[AliasRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns a copy whose rule strings are standardized, so they compare
    /// equal to `name_index` values.
    pub fn standardized(&self, standardizer: &dyn Standardizer) -> Self {
        let rules = self
            .rules
            .iter()
            .map(|rule| match rule {
                AliasRule::Substitute {
                    level,
                    name,
                    alternative,
                } => AliasRule::Substitute {
                    level: *level,
                    name: standardizer.standardize(name),
                    alternative: standardizer.standardize(alternative),
                },
                AliasRule::TrimPrefix(prefix) => {
                    AliasRule::TrimPrefix(standardizer.standardize(prefix))
                }
                other => other.clone(),
            })
            .collect();
        Self { rules }
    }

    /// The original path followed by every distinct alternative produced by
    /// the rules.
    pub fn expand(&self, path: &[PathElement]) -> Vec<Vec<PathElement>> {
        let mut paths = vec![path.to_vec()];

        for rule in &self.rules {
            let produced: Vec<Vec<PathElement>> =
                paths.iter().filter_map(|p| apply_rule(rule, p)).collect();
            for candidate in produced {
                if !paths.contains(&candidate) {
                    paths.push(candidate);
                }
            }
        }

        paths
    }
}

/// Applies one rule. Omission rules never drop the last element: that is
/// the node the path leads to.
fn apply_rule(rule: &AliasRule, path: &[PathElement]) -> Option<Vec<PathElement>> {
    let last = path.len().checked_sub(1)?;
    let result: Vec<PathElement> = match rule {
        AliasRule::OmitLevel(level) => path
            .iter()
            .enumerate()
            .filter(|(i, e)| *i == last || e.level != *level)
            .map(|(_, e)| e.clone())
            .collect(),
        AliasRule::OmitWhenFollowedBy { level, next } => path
            .iter()
            .enumerate()
            .filter(|(i, e)| {
                *i == last
                    || e.level != *level
                    || !path.get(i + 1).is_some_and(|n| n.level == *next)
            })
            .map(|(_, e)| e.clone())
            .collect(),
        AliasRule::Substitute {
            level,
            name,
            alternative,
        } => path
            .iter()
            .map(|e| {
                if e.level == *level && e.name == *name {
                    PathElement::new(e.level, alternative)
                } else {
                    e.clone()
                }
            })
            .collect(),
        AliasRule::TrimPrefix(prefix) => path
            .iter()
            .map(|e| match e.name.strip_prefix(prefix.as_str()) {
                Some(rest) if !rest.is_empty() => PathElement::new(e.level, rest),
                _ => e.clone(),
            })
            .collect(),
    };

    if result.is_empty() || result == path {
        None
    } else {
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::NfkcStandardizer;

    fn names(path: &[PathElement]) -> Vec<&str> {
        path.iter().map(|e| e.name.as_str()).collect()
    }

    fn path(elements: &[(&str, AddressLevel)]) -> Vec<PathElement> {
        elements
            .iter()
            .map(|(name, level)| PathElement::new(*level, name))
            .collect()
    }

    #[test]
    fn county_and_prefix_rules_compose() {
        let p = path(&[
            ("北海道", AddressLevel::PREF),
            ("余市郡", AddressLevel::COUNTY),
            ("余市町", AddressLevel::CITY),
            ("大字黒川町", AddressLevel::OAZA),
        ]);
        let expanded = AliasTable::standard().expand(&p);
        let expanded: Vec<Vec<&str>> = expanded.iter().map(|p| names(p)).collect();

        assert_eq!(
            expanded,
            vec![
                vec!["北海道", "余市郡", "余市町", "大字黒川町"],
                vec!["北海道", "余市町", "大字黒川町"],
                vec!["北海道", "余市郡", "余市町", "黒川町"],
                vec!["北海道", "余市町", "黒川町"],
            ]
        );
    }

    #[test]
    fn designated_city_ward_shortcut() {
        let p = path(&[
            ("神奈川県", AddressLevel::PREF),
            ("横浜市", AddressLevel::CITY),
            ("中区", AddressLevel::WARD),
        ]);
        let expanded = AliasTable::standard().expand(&p);
        assert!(expanded.iter().any(|p| names(p) == ["神奈川県", "中区"]));

        let no_ward = path(&[
            ("神奈川県", AddressLevel::PREF),
            ("横浜市", AddressLevel::CITY),
        ]);
        assert_eq!(AliasTable::standard().expand(&no_ward).len(), 1);
    }

    #[test]
    fn omission_keeps_the_labelled_node() {
        let county = path(&[
            ("東京都", AddressLevel::PREF),
            ("西多摩郡", AddressLevel::COUNTY),
        ]);
        let expanded = AliasTable::standard().expand(&county);
        assert_eq!(expanded, vec![county]);

        let table = AliasTable::new().with_rule(AliasRule::OmitLevel(AddressLevel::PREF));
        assert_eq!(table.expand(&path(&[("東京都", AddressLevel::PREF)])).len(), 1);
    }

    #[test]
    fn substitute_uses_standardized_strings() {
        let table = AliasTable::new()
            .with_rule(AliasRule::Substitute {
                level: AddressLevel::CITY,
                name: "龍ケ崎市".to_string(),
                alternative: "竜ヶ崎市".to_string(),
            })
            .standardized(&NfkcStandardizer);

        let p = path(&[("茨城県", AddressLevel::PREF), ("龍ケ崎市", AddressLevel::CITY)]);
        let expanded = table.expand(&p);
        assert_eq!(names(&expanded[1]), ["茨城県", "竜ケ崎市"]);
    }

    #[test]
    fn bare_prefix_is_not_trimmed_to_nothing() {
        let p = path(&[("字", AddressLevel::AZA)]);
        assert_eq!(AliasTable::standard().expand(&p).len(), 1);
    }
}
