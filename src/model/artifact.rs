// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::consts::DEFAULT_KEY_SUFFIXES;

/// A file produced by a task, tagged with the key used to join it with
/// artifacts from other stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub producer: String,
    pub key: String,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, producer: impl Into<String>, keys: &KeyDeriver) -> Self {
        let path = path.into();
        let key = keys.derive(&path);
        Self {
            path,
            producer: producer.into(),
            key,
        }
    }
}

/// Computes derived keys from artifact base names.
///
/// Every extension is stripped first, then any configured suffix anchored at
/// the end of the remaining name is stripped repeatedly until none matches.
/// A suffix is never allowed to consume the whole name.
#[derive(Debug, Clone)]
pub struct KeyDeriver {
    suffixes: Vec<Regex>,
}

impl KeyDeriver {
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let suffixes = patterns
            .into_iter()
            .map(|p| Regex::new(&format!("(?:{})$", p.as_ref())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { suffixes })
    }

    pub fn derive(&self, path: &Path) -> String {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut key = match name.char_indices().skip(1).find(|(_, c)| *c == '.') {
            Some((idx, _)) => name[..idx].to_string(),
            None => name,
        };

        loop {
            let cut = self
                .suffixes
                .iter()
                .filter_map(|re| re.find(&key))
                .map(|m| m.start())
                .find(|start| *start > 0);
            match cut {
                Some(start) => key.truncate(start),
                None => break,
            }
        }
        key
    }
}

impl Default for KeyDeriver {
    fn default() -> Self {
        let suffixes = DEFAULT_KEY_SUFFIXES
            .iter()
            .filter_map(|p| Regex::new(&format!("(?:{})$", p)).ok())
            .collect();
        Self { suffixes }
    }
}
