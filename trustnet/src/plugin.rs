//! Plugin records and the compiled-program cache.
//!
//! Responsibilities:
//! - Describe an installed scoring plugin (author, metadata, source text)
//! - Cache compiled programs keyed by a source digest so repeated
//!   evaluations skip the parser
//! - Surface compile errors unchanged; a cached entry is always a program
//!   that compiled cleanly

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tsl::{compile, CompileError, Program};

use crate::types::Identity;

/// Descriptive fields attached to a plugin by its author. `weight` is a
/// free-form hint for aggregators; the engine never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginMetadata {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
}

/// One installed scoring plugin. The source is untrusted text; nothing is
/// parsed or validated until an evaluation asks for the program. `trusted`
/// records provenance (set by the loader, read-only here).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plugin {
    pub id: String,
    pub author: Identity,
    pub metadata: PluginMetadata,
    pub trusted: bool,
    pub source: String,
}

impl Plugin {
    pub fn new(
        id: impl Into<String>,
        author: impl Into<Identity>,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Plugin {
            id: id.into(),
            author: author.into(),
            metadata: PluginMetadata {
                name: name.into(),
                weight: None,
            },
            trusted: false,
            source: source.into(),
        }
    }

    pub fn with_trusted(mut self, trusted: bool) -> Self {
        self.trusted = trusted;
        self
    }

    /// Display name used in logs and result records.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// Compiled programs keyed by the SHA-256 of their source. The cache is
/// shared by every evaluation a runner performs; entries are never evicted.
#[derive(Debug, Default)]
pub struct ProgramCache {
    programs: Mutex<HashMap<[u8; 32], Arc<Program>>>,
}

impl ProgramCache {
    pub fn new() -> Self {
        ProgramCache::default()
    }

    /// Return the cached program for this source, compiling on first sight.
    /// Compilation runs outside the lock; a racing duplicate insert is
    /// harmless because both entries hold the same program.
    pub fn get_or_compile(&self, source: &str) -> Result<Arc<Program>, CompileError> {
        let key: [u8; 32] = Sha256::digest(source.as_bytes()).into();
        if let Ok(programs) = self.programs.lock() {
            if let Some(program) = programs.get(&key) {
                log::debug!("program cache hit");
                return Ok(Arc::clone(program));
            }
        }

        let program = Arc::new(compile(source)?);
        if let Ok(mut programs) = self.programs.lock() {
            programs.insert(key, Arc::clone(&program));
        }
        Ok(program)
    }

    pub fn len(&self) -> usize {
        self.programs.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
