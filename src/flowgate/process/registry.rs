// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::loader::ProcessLoader;
use super::types::ProcessDefinition;
use super::validate::validate;
use crate::sdk::error::Result;

/// Catalog of process definitions keyed by name
#[derive(Clone)]
pub struct ProcessRegistry {
    processes: Arc<RwLock<HashMap<String, Arc<ProcessDefinition>>>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self {
            processes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register(&self, def: ProcessDefinition) {
        let mut processes = self.processes.write().await;
        processes.insert(def.name.clone(), Arc::new(def));
    }

    pub async fn get(&self, name: &str) -> Option<Arc<ProcessDefinition>> {
        let processes = self.processes.read().await;
        processes.get(name).cloned()
    }

    /// Registered definitions sorted by name
    pub async fn list(&self) -> Vec<Arc<ProcessDefinition>> {
        let processes = self.processes.read().await;
        let mut defs: Vec<_> = processes.values().cloned().collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Load and validate every `.yaml`/`.yml` file in a directory.
    ///
    /// Files that fail to parse or validate are logged and skipped. Returns
    /// the number of definitions registered.
    pub async fn load_dir<P: AsRef<Path>>(&self, dir: P) -> Result<usize> {
        let loader = ProcessLoader::new();
        let mut paths: Vec<_> = std::fs::read_dir(dir.as_ref())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("yaml") | Some("yml")
                )
            })
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            let def = match loader.load_process(&path) {
                Ok(def) => def,
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            if let Err(e) = validate(&def) {
                log::warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
            log::info!("Registered process: {}", def.name);
            self.register(def).await;
            loaded += 1;
        }
        Ok(loaded)
    }
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::new()
    }
}
