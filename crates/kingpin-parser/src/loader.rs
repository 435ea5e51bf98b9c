//! The Document Loader (C2): reads a document from a filesystem path or an
//! HTTP(S) URL, applies phase-1 substitution, and validates it against the
//! actor-node schema.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::err::{Error, Result};
use crate::schema::validate_tree;
use crate::substitute::{env_overlaid, substitute, Delimiter};

/// Source syntax a document is read as, independent of how it was fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Syntax {
    Json,
    Yaml,
}

/// Reads and phase-1-substitutes actor documents. Stateless — holds only
/// a `reqwest::Client` so repeated HTTP fetches reuse connections.
#[derive(Debug, Clone, Default)]
pub struct DocumentLoader {
    http: reqwest::Client,
}

impl DocumentLoader {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Loads the document named by `source` (a filesystem path or
    /// `http(s)://` URL), substitutes it against the caller's tokens
    /// merged over the process environment, and validates the result.
    ///
    /// `ftp://` and any other unrecognized scheme is `InvalidScriptName`,
    /// as is a file with no recognized extension when fetched with no
    /// sniffable syntax.
    #[instrument(skip(self, tokens), fields(source = %source))]
    pub async fn load(&self, source: &str, tokens: &HashMap<String, String>) -> Result<Value> {
        let value = self.load_unvalidated(source, tokens).await?;
        validate_tree(&value)?;
        debug!("document loaded and validated");
        Ok(value)
    }

    /// Like [`load`](Self::load), but skips actor-node schema validation.
    ///
    /// Used for references that aren't actor-node trees themselves, e.g. a
    /// `contexts` array loaded from a file (§4.6): the referenced document
    /// still gets phase-1 substitution against the caller's tokens, it's
    /// just not shaped like an actor.
    #[instrument(skip(self, tokens), fields(source = %source))]
    pub async fn load_unvalidated(&self, source: &str, tokens: &HashMap<String, String>) -> Result<Value> {
        let merged = env_overlaid(tokens);
        let (raw, syntax_hint) = self.read(source).await?;
        let substituted = substitute(&raw, &merged, Delimiter::Document)?;
        parse(&substituted, syntax_hint)
    }

    /// Reads the raw source text, returning it alongside a syntax hint
    /// derived from the extension (or `None` when the source must be
    /// sniffed, e.g. an extensionless URL).
    async fn read(&self, source: &str) -> Result<(String, Option<Syntax>)> {
        if let Some(scheme_rest) = source.split_once("://") {
            let scheme = scheme_rest.0.to_ascii_lowercase();
            return match scheme.as_str() {
                "http" | "https" => {
                    let text = self.http.get(source).send().await?.error_for_status()?.text().await?;
                    Ok((text, syntax_from_path(source)))
                }
                other => Err(Error::InvalidScriptName(format!("unsupported scheme: {other}"))),
            };
        }

        let syntax = syntax_from_path(source)
            .ok_or_else(|| Error::InvalidScriptName(format!("unrecognized extension: {source}")))?;
        let text = tokio::fs::read_to_string(source).await?;
        Ok((text, Some(syntax)))
    }
}

fn syntax_from_path(path: &str) -> Option<Syntax> {
    let lower = path.to_ascii_lowercase();
    if lower.ends_with(".json") {
        Some(Syntax::Json)
    } else if lower.ends_with(".yaml") || lower.ends_with(".yml") {
        Some(Syntax::Yaml)
    } else {
        None
    }
}

/// Parses `text` as the hinted syntax, or sniffs JSON-then-YAML when no
/// hint is available (an HTTP source with no recognizable extension).
fn parse(text: &str, hint: Option<Syntax>) -> Result<Value> {
    match hint {
        Some(Syntax::Json) => Ok(serde_json::from_str(text)?),
        Some(Syntax::Yaml) => Ok(serde_yaml::from_str(text)?),
        None => serde_json::from_str(text)
            .map_err(Error::from)
            .or_else(|_| serde_yaml::from_str(text).map_err(Error::from)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_sniffing_prefers_json_then_yaml() {
        assert_eq!(parse(r#"{"actor":"misc.Note"}"#, None).unwrap()["actor"], "misc.Note");
        assert_eq!(parse("actor: misc.Note\n", None).unwrap()["actor"], "misc.Note");
    }

    #[tokio::test]
    async fn ftp_scheme_is_rejected() {
        let loader = DocumentLoader::new();
        let err = loader.load("ftp://example.com/doc.yaml", &HashMap::new()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidScriptName(_)));
    }

    #[tokio::test]
    async fn unrecognized_extension_is_rejected() {
        let loader = DocumentLoader::new();
        let err = loader.load("/tmp/does-not-matter.txt", &HashMap::new()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidScriptName(_)));
    }

    #[tokio::test]
    async fn load_unvalidated_accepts_a_bare_array_that_load_would_reject() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        std::io::Write::write_all(&mut file, br#"[{"R": "%NAME%"}, {"R": "y"}]"#).unwrap();
        let path = file.path().to_str().unwrap();

        let loader = DocumentLoader::new();
        let tokens = HashMap::from([("NAME".to_string(), "x".to_string())]);

        // `load()` would reject this: it's not an actor node.
        assert!(loader.load(path, &tokens).await.is_err());

        let value = loader.load_unvalidated(path, &tokens).await.unwrap();
        assert_eq!(value, serde_json::json!([{"R": "x"}, {"R": "y"}]));
    }
}
