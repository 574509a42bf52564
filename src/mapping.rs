/*!
 * Scene/shot mapping table.
 *
 * A header-less CSV where the first column is a `scene/shot` key and the remaining columns
 * are the normalized scene-shot label and the type string, e.g.
 *
 * ```text
 * 048/0140,sc48_sh0140,plate_bg_v001
 * ```
 */

use log::warn;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::errors::MappingError;

/// A resolved mapping entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRecord {
    pub key: String,
    /// Normalized scene-shot label used in plate names
    pub label: String,
    /// Raw type string, e.g. `plate_bg_v001`
    pub type_string: String,
}

/// Positional tokens of a type string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTokens {
    pub variant: String,
    pub product_type: Option<String>,
    pub version_marker: Option<String>,
}

impl MappingRecord {
    /// Split the type string after trimming surrounding underscores.
    ///
    /// 1 token: variant. 2 tokens: variant, version marker. 3 tokens: variant, product type,
    /// version marker. Anything else is malformed.
    pub fn type_tokens(&self) -> Result<TypeTokens, MappingError> {
        let trimmed = self.type_string.trim().trim_matches('_');
        let parts: Vec<&str> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('_').collect()
        };

        let malformed = || MappingError::MalformedType {
            key: self.key.clone(),
            type_string: self.type_string.clone(),
            found: parts.len(),
        };

        match parts.as_slice() {
            [variant] => Ok(TypeTokens {
                variant: variant.to_string(),
                product_type: None,
                version_marker: None,
            }),
            [variant, version] => Ok(TypeTokens {
                variant: variant.to_string(),
                product_type: None,
                version_marker: Some(version.to_string()),
            }),
            [variant, product_type, version] => Ok(TypeTokens {
                variant: variant.to_string(),
                product_type: Some(product_type.to_string()),
                version_marker: Some(version.to_string()),
            }),
            _ => Err(malformed()),
        }
    }

    /// Shot code used in publish paths: the last underscore token of the label
    pub fn shot_code(&self) -> &str {
        self.label.rsplit('_').next().unwrap_or(&self.label)
    }
}

/// Read-only key → values lookup loaded once per run
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: HashMap<String, Vec<String>>,
}

impl MappingTable {
    /// Load a mapping table from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MappingError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| MappingError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self::parse(&content))
    }

    /// Parse CSV content; blank rows are skipped
    pub fn parse(content: &str) -> Self {
        let mut entries = HashMap::new();

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let mut cells = split_csv_line(line).into_iter();
            let Some(key) = cells.next() else {
                continue;
            };
            let values: Vec<String> = cells.collect();
            if values.len() < 2 {
                warn!("Mapping row {} has fewer than three columns, ignored: {}", line_no + 1, line);
                continue;
            }
            entries.insert(key, values);
        }

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw values stored for a key
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Find the entry whose key equals the `scene/shot` compound key.
    ///
    /// Keys containing the scene token are candidates; only a two-part key that equals the
    /// compound key exactly is accepted.
    pub fn find(&self, scene: &str, shot: &str) -> Result<MappingRecord, MappingError> {
        let wanted = shot.trim();

        let key = self
            .entries
            .keys()
            .filter(|key| key.contains(scene))
            .filter(|key| key.split('/').count() == 2)
            .find(|key| key.trim() == wanted)
            .ok_or_else(|| MappingError::NoMatch {
                scene: scene.to_string(),
                shot: shot.to_string(),
            })?;

        let values = &self.entries[key];
        let label = values.first().map(|s| s.trim()).unwrap_or_default();
        let type_string = values.get(1).map(|s| s.trim()).unwrap_or_default();
        if label.is_empty() || type_string.is_empty() {
            return Err(MappingError::IncompleteEntry(key.clone()));
        }

        Ok(MappingRecord {
            key: key.clone(),
            label: label.to_string(),
            type_string: type_string.to_string(),
        })
    }
}

/// Split one CSV line on commas, honouring double-quoted cells and `""` escapes.
/// Cells are trimmed.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                cells.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}
