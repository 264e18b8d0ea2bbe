//! Value replace and skip middleware
//!
//! Per field, string values can be rewritten with literal and regex
//! replacements, or cause the whole row to be dropped.

use super::rename::yaml_pairs;
use super::types::RowMiddleware;
use crate::error::{Error, Result};
use crate::model::Row;
use crate::types::{CancelToken, JsonValue};
use regex::Regex;
use serde_yaml::Value as YamlValue;
use std::collections::HashMap;
use std::path::Path;

/// Rules applied to one field
#[derive(Debug, Clone, Default)]
pub struct FieldReplacements {
    /// Literal pattern to replacement, applied first, in order
    pub replace: Vec<(String, String)>,
    /// Regex to replacement, applied after the literal ones, in order
    pub regex_replace: Vec<(Regex, String)>,
    /// Drop the row when the value contains any of these
    pub skip: Vec<String>,
    /// Drop the row when the value matches any of these
    pub regex_skip: Vec<Regex>,
}

impl FieldReplacements {
    fn skips(&self, s: &str) -> bool {
        self.skip.iter().any(|p| s.contains(p.as_str()))
            || self.regex_skip.iter().any(|r| r.is_match(s))
    }

    fn rewrite(&self, s: &str) -> String {
        let mut out = s.to_string();
        for (pattern, replacement) in &self.replace {
            out = out.replace(pattern.as_str(), replacement);
        }
        for (regex, replacement) in &self.regex_replace {
            out = regex.replace_all(&out, replacement.as_str()).into_owned();
        }
        out
    }
}

/// Rewrites or skips rows based on per-field string rules
#[derive(Debug, Clone, Default)]
pub struct ReplaceMiddleware {
    fields: HashMap<String, FieldReplacements>,
}

impl ReplaceMiddleware {
    /// Create the middleware from per-field rules
    pub fn new(fields: HashMap<String, FieldReplacements>) -> Self {
        Self { fields }
    }

    /// Load rules from YAML
    ///
    /// ```yaml
    /// name:
    ///   replace: [{"foo": "bar"}]
    ///   regex_replace: [{"^a(.*)": "b$1"}]
    ///   skip: ["secret"]
    ///   regex_skip: ["^tmp-"]
    /// ```
    pub fn from_yaml(content: &str) -> Result<Self> {
        let doc: YamlValue = serde_yaml::from_str(content)?;
        let root = match doc {
            YamlValue::Mapping(root) => root,
            YamlValue::Null => return Ok(Self::default()),
            _ => return Err(Error::config("replace file must be a mapping")),
        };

        let mut fields = HashMap::new();
        for (field, rules) in &root {
            let field = field
                .as_str()
                .ok_or_else(|| Error::config("replace file keys must be field names"))?
                .to_string();
            let YamlValue::Mapping(rules) = rules else {
                return Err(Error::invalid_value(field, "expected a mapping of rules"));
            };

            let mut entry = FieldReplacements::default();
            for (kind, value) in rules {
                match kind.as_str().unwrap_or_default() {
                    "replace" => entry.replace = yaml_pairs(value, "replace")?,
                    "regex_replace" => {
                        for (pattern, replacement) in yaml_pairs(value, "regex_replace")? {
                            let regex = Regex::new(&pattern)
                                .map_err(|e| Error::invalid_regex(pattern.as_str(), e))?;
                            entry.regex_replace.push((regex, replacement));
                        }
                    }
                    "skip" => entry.skip = string_list(value, &field, "skip")?,
                    "regex_skip" => {
                        for pattern in string_list(value, &field, "regex_skip")? {
                            let regex = Regex::new(&pattern)
                                .map_err(|e| Error::invalid_regex(pattern.as_str(), e))?;
                            entry.regex_skip.push(regex);
                        }
                    }
                    other => {
                        return Err(Error::invalid_value(
                            field,
                            format!("unknown replace rule '{other}'"),
                        ))
                    }
                }
            }
            fields.insert(field, entry);
        }
        Ok(Self::new(fields))
    }

    /// Load rules from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| Error::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_yaml(&content)
    }
}

impl RowMiddleware for ReplaceMiddleware {
    fn name(&self) -> &'static str {
        "replace"
    }

    fn process(&mut self, _ctx: &CancelToken, mut row: Row) -> Result<Vec<Row>> {
        for (field, rules) in &self.fields {
            let Some(JsonValue::String(s)) = row.get(field) else {
                continue;
            };
            if rules.skips(s) {
                return Ok(Vec::new());
            }
            let rewritten = rules.rewrite(s);
            row.set(field.clone(), rewritten);
        }
        Ok(vec![row])
    }
}

fn string_list(value: &YamlValue, field: &str, kind: &str) -> Result<Vec<String>> {
    match value {
        YamlValue::Null => Ok(Vec::new()),
        YamlValue::Sequence(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(String::from).ok_or_else(|| {
                    Error::invalid_value(field, format!("{kind} entries must be strings"))
                })
            })
            .collect(),
        _ => Err(Error::invalid_value(field, format!("{kind} must be a list"))),
    }
}
