//! The CLI surface (§6): `--script`, ad-hoc `--actor`, `--dry`,
//! `--explain`, `--build-only`, per the "minimum viable" list.

use std::collections::HashMap;

use clap::Parser;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

#[derive(Debug, Parser)]
#[command(name = "kingpin", about = "Declarative deployment-automation engine", version)]
pub struct Cli {
    /// Run the document at PATH (filesystem path or http(s):// URL).
    #[arg(long, value_name = "PATH", conflicts_with = "actor")]
    pub script: Option<String>,

    /// Run a single ad-hoc actor by identifier instead of a script.
    #[arg(long, value_name = "ID")]
    pub actor: Option<String>,

    /// Populates `options` for an ad-hoc `--actor` run. Repeatable, `K=V`.
    #[arg(long = "option", value_name = "K=V")]
    pub options: Vec<String>,

    /// Populates top-level node keys (e.g. `desc`, `timeout`) for an
    /// ad-hoc `--actor` run. Repeatable, `K=V`.
    #[arg(long = "param", value_name = "K=V")]
    pub params: Vec<String>,

    /// A token override for phase-1 substitution, `NAME=VALUE`.
    /// Repeatable; explicit values win over the process environment.
    #[arg(long = "token", value_name = "NAME=VALUE")]
    pub tokens: Vec<String>,

    /// Run only the rehearsal pass.
    #[arg(long)]
    pub dry: bool,

    /// Construct the tree and exit 0 on success, without executing it.
    #[arg(long)]
    pub build_only: bool,

    /// Print the named actor's documentation and exit, instead of
    /// running anything.
    #[arg(long)]
    pub explain: bool,
}

impl Cli {
    /// Parses `--token NAME=VALUE` entries into a token-override map.
    pub fn token_overrides(&self) -> Result<HashMap<String, String>> {
        parse_pairs(&self.tokens, "--token")
    }

    /// Synthesizes the single-node document an ad-hoc `--actor` run
    /// builds, from `--actor`, `--option`, and `--param`.
    pub fn ad_hoc_document(&self) -> Result<Value> {
        let actor = self
            .actor
            .clone()
            .ok_or_else(|| Error::Usage("--actor is required without --script".to_string()))?;

        let mut node = Map::new();
        node.insert("actor".to_string(), Value::String(actor));

        let mut options = Map::new();
        for (key, value) in parse_pairs(&self.options, "--option")? {
            options.insert(key, Value::String(value));
        }
        if !options.is_empty() {
            node.insert("options".to_string(), Value::Object(options));
        }

        for (key, value) in parse_pairs(&self.params, "--param")? {
            node.insert(key, Value::String(value));
        }

        Ok(Value::Object(node))
    }
}

fn parse_pairs(entries: &[String], flag: &str) -> Result<HashMap<String, String>> {
    entries
        .iter()
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| Error::Usage(format!("{flag} expects K=V, got {entry:?}")))
        })
        .collect()
}
