//! Column rename middleware
//!
//! Exact renames are tried first, then regex renames in order. Results are
//! cached per source name.

use super::types::RowMiddleware;
use crate::error::{Error, Result};
use crate::model::Row;
use crate::types::CancelToken;
use regex::Regex;
use serde_yaml::Value as YamlValue;
use std::collections::HashMap;
use std::path::Path;

/// A compiled regex rename rule; the replacement may use `$1` style groups
#[derive(Debug, Clone)]
pub struct RegexRename {
    regex: Regex,
    replacement: String,
}

impl RegexRename {
    /// Compile a rename rule
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(pattern).map_err(|e| Error::invalid_regex(pattern, e))?,
            replacement: replacement.into(),
        })
    }

    fn apply(&self, name: &str) -> String {
        self.regex
            .replace_all(name, self.replacement.as_str())
            .into_owned()
    }
}

/// Renames fields; on collisions the first position keeps the last value
#[derive(Debug, Clone, Default)]
pub struct RenameColumnsMiddleware {
    renames: HashMap<String, String>,
    regex_renames: Vec<RegexRename>,
    cache: HashMap<String, String>,
}

impl RenameColumnsMiddleware {
    /// Create a rename middleware from exact and regex rules
    pub fn new(renames: HashMap<String, String>, regex_renames: Vec<RegexRename>) -> Self {
        Self {
            renames,
            regex_renames,
            cache: HashMap::new(),
        }
    }

    /// Load rules from a YAML document with `renames` and `regexpRenames` sections
    ///
    /// `regexpRenames` may be an ordered mapping or a list of single-entry
    /// mappings.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let doc: YamlValue = serde_yaml::from_str(content)?;
        let mut renames = HashMap::new();
        let mut regex_renames = Vec::new();

        let root = match doc {
            YamlValue::Mapping(root) => root,
            YamlValue::Null => return Ok(Self::default()),
            _ => return Err(Error::config("rename file must be a mapping")),
        };

        if let Some(section) = root.get("renames") {
            for (from, to) in yaml_pairs(section, "renames")? {
                renames.insert(from, to);
            }
        }
        if let Some(section) = root.get("regexpRenames") {
            for (pattern, replacement) in yaml_pairs(section, "regexpRenames")? {
                regex_renames.push(RegexRename::new(&pattern, replacement)?);
            }
        }

        Ok(Self::new(renames, regex_renames))
    }

    /// Load rules from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| Error::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_yaml(&content)
    }

    /// Split into exact and regex rules, for merging with other sources
    pub fn into_rules(self) -> (HashMap<String, String>, Vec<RegexRename>) {
        (self.renames, self.regex_renames)
    }

    /// Final name for a source field
    pub fn rename(&mut self, name: &str) -> String {
        if let Some(renamed) = self.cache.get(name) {
            return renamed.clone();
        }
        let renamed = self.compute(name);
        self.cache.insert(name.to_string(), renamed.clone());
        renamed
    }

    fn compute(&self, name: &str) -> String {
        if let Some(to) = self.renames.get(name) {
            return to.clone();
        }
        for rule in &self.regex_renames {
            let renamed = rule.apply(name);
            if renamed != name {
                return renamed;
            }
        }
        name.to_string()
    }
}

impl RowMiddleware for RenameColumnsMiddleware {
    fn name(&self) -> &'static str {
        "rename-columns"
    }

    fn process(&mut self, _ctx: &CancelToken, row: Row) -> Result<Vec<Row>> {
        if self.renames.is_empty() && self.regex_renames.is_empty() {
            return Ok(vec![row]);
        }
        let mut out = Row::with_capacity(row.len());
        for (key, value) in row {
            let renamed = self.rename(&key);
            out.set(renamed, value);
        }
        Ok(vec![out])
    }
}

/// Read an ordered list of string pairs from a mapping or a list of single-entry mappings
pub(crate) fn yaml_pairs(section: &YamlValue, name: &str) -> Result<Vec<(String, String)>> {
    let scalar = |v: &YamlValue| -> Result<String> {
        match v {
            YamlValue::String(s) => Ok(s.clone()),
            YamlValue::Number(n) => Ok(n.to_string()),
            YamlValue::Bool(b) => Ok(b.to_string()),
            other => Err(Error::invalid_value(
                name,
                format!("expected a scalar, got {other:?}"),
            )),
        }
    };

    match section {
        YamlValue::Null => Ok(Vec::new()),
        YamlValue::Mapping(map) => map
            .iter()
            .map(|(k, v)| Ok((scalar(k)?, scalar(v)?)))
            .collect(),
        YamlValue::Sequence(items) => {
            let mut pairs = Vec::with_capacity(items.len());
            for item in items {
                let YamlValue::Mapping(entry) = item else {
                    return Err(Error::invalid_value(name, "expected single-entry mappings"));
                };
                if entry.len() != 1 {
                    return Err(Error::invalid_value(name, "expected single-entry mappings"));
                }
                for (k, v) in entry {
                    pairs.push((scalar(k)?, scalar(v)?));
                }
            }
            Ok(pairs)
        }
        _ => Err(Error::invalid_value(name, "expected a mapping or a list")),
    }
}
