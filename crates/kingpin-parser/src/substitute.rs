//! The Token Substituter (C1).
//!
//! One scanner, parameterized over a delimiter pair, drives both
//! substitution phases: document-time (`%NAME%`) and instantiation-time
//! (`{NAME}`). A hand-written character scan is enough here — the token
//! grammar is three productions (`%N%`, `%N|D%`, `\%N\%`) and pulling in a
//! parser-combinator crate for it would be reaching for a hammer.

use std::collections::HashMap;

use crate::err::{Error, Result};
use kingpin_core::Context;

/// Which delimiter pair a substitution pass scans for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// Document-time tokens: `%NAME%`, `%NAME|default%`, `\%NAME\%`.
    Document,
    /// Instantiation-time tokens: `{NAME}`, `{NAME|default}`, `\{NAME\}`.
    Instantiation,
}

impl Delimiter {
    fn chars(self) -> (char, char) {
        match self {
            Delimiter::Document => ('%', '%'),
            Delimiter::Instantiation => ('{', '}'),
        }
    }
}

/// Substitutes every non-escaped token reference in `input` using `tokens`
/// as the binding source, per §4.1.
///
/// Resolution order per token: `tokens[name]`, then the token's own inline
/// default, then `MissingToken`. All missing names across the whole input
/// are collected into a single error. Escape sequences are reduced to
/// their literal form in a final pass over the *output* so an escaped
/// token beside a real one is never mistaken for part of it during the
/// scan. Substitution is non-recursive: text produced by a replacement is
/// never rescanned.
pub fn substitute(input: &str, tokens: &Context, delim: Delimiter) -> Result<String> {
    let (open, close) = delim.chars();
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut missing = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' && i + 1 < chars.len() && chars[i + 1] == open {
            // Escape: `\%...\%` or `\{...\}`. Scan to the matching escaped
            // close and emit the literal body without touching bindings.
            if let Some(end) = find_escaped_close(&chars, i + 2, close) {
                out.push(open);
                out.extend(&chars[i + 2..end]);
                out.push(close);
                i = end + 2; // skip past `\<close>`
                continue;
            }
        }

        if c == open {
            if let Some(end) = find_close(&chars, i + 1, close) {
                let body: String = chars[i + 1..end].iter().collect();
                let (name, default) = split_default(&body);
                match tokens.get(name) {
                    Some(value) => out.push_str(value),
                    None => match default {
                        Some(d) => out.push_str(d),
                        None => missing.push(name.to_string()),
                    },
                }
                i = end + 1;
                continue;
            }
        }

        out.push(c);
        i += 1;
    }

    if !missing.is_empty() {
        missing.sort();
        missing.dedup();
        return Err(Error::MissingToken { names: missing });
    }

    Ok(out)
}

/// Finds the index of the unescaped `close` delimiter starting the search
/// at `from`. Token bodies never contain the delimiter themselves, so the
/// first occurrence terminates the token.
fn find_close(chars: &[char], from: usize, close: char) -> Option<usize> {
    (from..chars.len()).find(|&j| chars[j] == close)
}

/// Finds the index of a `\<close>` pair starting at `from`, used to close
/// an escape sequence opened by `\<open>`.
fn find_escaped_close(chars: &[char], from: usize, close: char) -> Option<usize> {
    let mut j = from;
    while j + 1 < chars.len() {
        if chars[j] == '\\' && chars[j + 1] == close {
            return Some(j);
        }
        j += 1;
    }
    None
}

/// Splits a token body `NAME` or `NAME|default` into its name and optional
/// inline default.
fn split_default(body: &str) -> (&str, Option<&str>) {
    match body.split_once('|') {
        Some((name, default)) => (name, Some(default)),
        None => (body, None),
    }
}

/// Applies [`substitute`] to a structured document by serializing to JSON
/// text, substituting, and re-parsing — deep substitution through nested
/// mappings and arrays without a tree walk (§4.1, §9).
pub fn substitute_value(
    value: &serde_json::Value,
    tokens: &Context,
    delim: Delimiter,
) -> Result<serde_json::Value> {
    let text = serde_json::to_string(value)?;
    let substituted = substitute(&text, tokens, delim)?;
    Ok(serde_json::from_str(&substituted)?)
}

/// Merges `tokens` over the process environment, with `tokens` winning on
/// collision — the binding source the Document Loader uses for phase 1
/// and the Macro actor uses for its sub-document's phase 1 (§4.2, §4.7).
pub fn env_overlaid(tokens: &HashMap<String, String>) -> Context {
    let mut merged: Context = std::env::vars().collect();
    merged.extend(tokens.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(pairs: &[(&str, &str)]) -> Context {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn identity_on_strings_without_delimiters() {
        let t = tokens(&[]);
        let s = "plain text, no markers here";
        assert_eq!(substitute(s, &t, Delimiter::Document).unwrap(), s);
        assert_eq!(substitute(s, &t, Delimiter::Instantiation).unwrap(), s);
    }

    #[test]
    fn resolves_bound_document_token() {
        let t = tokens(&[("NAME", "world")]);
        assert_eq!(
            substitute("hello %NAME%", &t, Delimiter::Document).unwrap(),
            "hello world"
        );
    }

    #[test]
    fn resolves_instantiation_token() {
        let t = tokens(&[("R", "x")]);
        assert_eq!(
            substitute("hello {R}", &t, Delimiter::Instantiation).unwrap(),
            "hello x"
        );
    }

    #[test]
    fn default_used_when_unbound() {
        let t = tokens(&[]);
        assert_eq!(substitute("%N|D%", &t, Delimiter::Document).unwrap(), "D");
    }

    #[test]
    fn binding_wins_over_default() {
        let t = tokens(&[("N", "V")]);
        assert_eq!(substitute("%N|D%", &t, Delimiter::Document).unwrap(), "V");
    }

    #[test]
    fn missing_token_without_default_is_an_error() {
        let t = tokens(&[]);
        let err = substitute("hi %NAME%", &t, Delimiter::Document).unwrap_err();
        match err {
            Error::MissingToken { names } => assert_eq!(names, vec!["NAME".to_string()]),
            other => panic!("expected MissingToken, got {other:?}"),
        }
    }

    #[test]
    fn missing_tokens_are_accumulated_in_one_report() {
        let t = tokens(&[]);
        let err = substitute("%A% and %B%", &t, Delimiter::Document).unwrap_err();
        match err {
            Error::MissingToken { names } => assert_eq!(names, vec!["A".to_string(), "B".to_string()]),
            other => panic!("expected MissingToken, got {other:?}"),
        }
    }

    #[test]
    fn escaped_token_yields_literal_and_consumes_no_binding() {
        let t = tokens(&[]);
        assert_eq!(
            substitute(r"\%X\%", &t, Delimiter::Document).unwrap(),
            "%X%"
        );
    }

    #[test]
    fn escaped_instantiation_token_yields_literal() {
        let t = tokens(&[]);
        assert_eq!(
            substitute(r"\{X\}", &t, Delimiter::Instantiation).unwrap(),
            "{X}"
        );
    }

    #[test]
    fn substitution_is_not_recursive() {
        let t = tokens(&[("A", "%B%"), ("B", "should-not-appear")]);
        assert_eq!(substitute("%A%", &t, Delimiter::Document).unwrap(), "%B%");
    }

    #[test]
    fn deep_substitution_through_nested_structure() {
        let t = tokens(&[("R", "x")]);
        let value = serde_json::json!({"a": ["hello {R}", {"b": "{R}-suffix"}]});
        let result = substitute_value(&value, &t, Delimiter::Instantiation).unwrap();
        assert_eq!(result, serde_json::json!({"a": ["hello x", {"b": "x-suffix"}]}));
    }

    proptest::proptest! {
        #[test]
        fn identity_on_arbitrary_strings_without_markers(s in "[a-zA-Z0-9 ,.!_-]*") {
            let t = tokens(&[]);
            proptest::prop_assert_eq!(substitute(&s, &t, Delimiter::Document).unwrap(), s);
        }
    }
}
