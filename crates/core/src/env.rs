// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment merging for build commands

use crate::registry::EnvOverride;
use std::collections::HashMap;

#[cfg(windows)]
const PATH_LIST_SEP: &str = ";";
#[cfg(not(windows))]
const PATH_LIST_SEP: &str = ":";

/// Merge a base environment with an ordered list of overrides.
///
/// Overrides apply in input order, each seeing the cumulative result of the
/// ones before it. The output order is not significant to its consumer.
pub fn merge_env<I>(base: I, overrides: &[EnvOverride]) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut merged: HashMap<String, String> = base.into_iter().collect();

    for item in overrides {
        let next = match merged.get(&item.name) {
            Some(existing) => {
                if item.prepend {
                    format!("{}{}{}", item.value, PATH_LIST_SEP, existing)
                } else {
                    format!("{}{}{}", existing, PATH_LIST_SEP, item.value)
                }
            }
            None => item.value.clone(),
        };
        merged.insert(item.name.clone(), next);
    }

    merged.into_iter().collect()
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
