//! Shape checks for `postValidate` configs.

use crate::messages as msg;
use crate::options::{PostValidate, PostValidateConfig};
use crate::validator::Definitions;
use std::collections::{BTreeMap, BTreeSet, HashSet};

enum Issue {
    Properties(String),
    Validator(&'static str),
}

/// Returns every reason to reject `post_validate`, in config order.
pub(crate) fn check(post_validate: &PostValidate, definitions: &Definitions) -> Vec<String> {
    match post_validate {
        PostValidate::Single(config) => config_issues(config, definitions)
            .into_iter()
            .map(|issue| match issue {
                Issue::Properties(reason) => reason,
                Issue::Validator(reason) => reason.to_string(),
            })
            .collect(),
        PostValidate::Many(configs) if configs.is_empty() => {
            vec![msg::POST_VALIDATE_EMPTY.to_string()]
        }
        PostValidate::Many(configs) => check_many(configs, definitions),
    }
}

fn check_many(configs: &[PostValidateConfig], definitions: &Definitions) -> Vec<String> {
    let mut by_index: BTreeMap<usize, Vec<String>> = BTreeMap::new();

    for (index, config) in configs.iter().enumerate() {
        for issue in config_issues(config, definitions) {
            let reason = match issue {
                Issue::Properties(reason) => msg::config_reason(index, &reason),
                Issue::Validator(reason) => msg::config_validator_reason(index, reason),
            };
            by_index.entry(index).or_default().push(reason);
        }
    }

    let sets: Vec<Option<BTreeSet<&str>>> = configs
        .iter()
        .map(|config| {
            (config.properties.len() >= 2)
                .then(|| config.properties.iter().map(String::as_str).collect())
        })
        .collect();

    for (i, left) in sets.iter().enumerate() {
        let Some(left) = left else { continue };
        for (j, right) in sets.iter().enumerate().skip(i + 1) {
            let Some(right) = right else { continue };
            if left == right {
                by_index.entry(i).or_default().push(msg::config_same_properties(i, j));
                by_index.entry(j).or_default().push(msg::config_same_properties(j, i));
            } else if left.is_subset(right) {
                by_index.entry(j).or_default().push(msg::config_superset(j, i));
            } else if right.is_subset(left) {
                by_index.entry(i).or_default().push(msg::config_superset(i, j));
            }
        }
    }

    by_index.into_values().flatten().collect()
}

fn config_issues(config: &PostValidateConfig, definitions: &Definitions) -> Vec<Issue> {
    let mut issues = Vec::new();

    if config.properties.len() < 2 {
        issues.push(Issue::Properties(msg::POST_VALIDATE_PROPERTIES.to_string()));
    } else {
        let mut seen = HashSet::new();
        let mut has_duplicates = false;
        for property in &config.properties {
            if !seen.insert(property.as_str()) {
                has_duplicates = true;
                continue;
            }
            if !can_post_validate(definitions, property) {
                issues.push(Issue::Properties(msg::cannot_post_validate(property)));
            }
        }
        if has_duplicates {
            issues.push(Issue::Properties(msg::POST_VALIDATE_DUPLICATES.to_string()));
        }
    }

    if config.validators.is_empty() {
        issues.push(Issue::Validator(msg::POST_VALIDATE_VALIDATOR));
    }
    issues
}

/// Inputs only: real settable properties and virtuals.
fn can_post_validate(definitions: &Definitions, property: &str) -> bool {
    definitions
        .get(property)
        .is_some_and(|d| !d.constant && !d.dependent && !d.side_effect)
}
