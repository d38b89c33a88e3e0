// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Label selector matching with regular expression values.

use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

/// Label key to value pattern
pub type SelectorMap = BTreeMap<String, String>;

/// A selector with its patterns compiled once, for matching many label sets.
///
/// A missing selector matches everything. Otherwise every selector key must
/// be present and its value must contain a match for the key's pattern
/// (search, not full match). A pattern that fails to compile never matches.
#[derive(Debug, Clone)]
pub struct Selector {
    terms: Option<Vec<(String, Option<Regex>)>>,
}

impl Selector {
    pub fn new(selector: Option<&SelectorMap>) -> Self {
        let terms = selector.map(|selector| {
            selector
                .iter()
                .map(|(key, pattern)| (key.clone(), compile(pattern)))
                .collect()
        });
        Self { terms }
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        let Some(terms) = &self.terms else {
            return true;
        };

        terms.iter().all(|(key, re)| match (labels.get(key), re) {
            (Some(value), Some(re)) => re.is_match(value),
            _ => false,
        })
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            debug!("Selector pattern '{}' is not a valid regex: {}", pattern, e);
            None
        }
    }
}
