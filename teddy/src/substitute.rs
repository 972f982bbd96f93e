//! `{variable}` substitution
//!
//! Substitution repeats until a pass discovers exactly the tokens the
//! previous pass did, so values that themselves contain `{tokens}` are
//! expanded as well. A self-referential model never settles; the pass cap
//! turns that into a [`SubstitutionOutcome::Runaway`] instead of a hang.

use crate::model::{lookup, value_to_string, Model};
use indexmap::IndexSet;
use regex::{NoExpand, RegexBuilder};
use std::collections::HashSet;

pub const DEFAULT_MAX_PASSES: usize = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstitutionOutcome {
    Settled { passes: usize },
    Runaway { passes: usize },
}

#[derive(Debug, Clone)]
pub struct Substitution {
    pub text: String,
    pub outcome: SubstitutionOutcome,
    /// Tokens of the last pass that did not resolve, in order of appearance
    pub unresolved: IndexSet<String>,
}

impl Substitution {
    pub fn is_runaway(&self) -> bool {
        matches!(self.outcome, SubstitutionOutcome::Runaway { .. })
    }

    pub fn passes(&self) -> usize {
        match self.outcome {
            SubstitutionOutcome::Settled { passes } | SubstitutionOutcome::Runaway { passes } => {
                passes
            }
        }
    }
}

/// Lower-cased contents of every closed `{...}` in `text`, duplicates kept
pub fn scan_tokens(text: &str) -> Vec<String> {
    text.split('{')
        .skip(1)
        .filter_map(|part| part.find('}').map(|end| &part[..end]))
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
        .collect()
}

/// Replace every case-insensitive occurrence of `{token}` with `value`
pub fn render_var(text: &str, token: &str, value: &str) -> String {
    let pattern = format!(r"\{{{}\}}", regex::escape(token));
    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => re.replace_all(text, NoExpand(value)).into_owned(),
        Err(e) => {
            log::debug!("Falling back to exact replacement for {{{}}}: {}", token, e);
            text.replace(&format!("{{{}}}", token), value)
        }
    }
}

/// Substitute model values into `text` until it stops changing shape
pub fn substitute(text: &str, model: &Model, max_passes: usize) -> Substitution {
    let max_passes = max_passes.max(1);
    let mut text = text.to_string();
    let mut previous: Option<Vec<String>> = None;
    let mut unresolved = IndexSet::new();
    let mut passes = 0;

    loop {
        let tokens = scan_tokens(&text);
        let mut seen = HashSet::new();
        unresolved.clear();

        for token in &tokens {
            if !seen.insert(token.as_str()) {
                continue;
            }
            match lookup(model, token) {
                Some(value) => text = render_var(&text, token, &value_to_string(&value)),
                None => {
                    unresolved.insert(token.clone());
                }
            }
        }
        passes += 1;

        if previous.as_ref() == Some(&tokens) {
            return Substitution {
                text,
                outcome: SubstitutionOutcome::Settled { passes },
                unresolved,
            };
        }
        if passes >= max_passes {
            return Substitution {
                text,
                outcome: SubstitutionOutcome::Runaway { passes },
                unresolved,
            };
        }
        previous = Some(tokens);
    }
}
