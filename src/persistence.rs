//! # Persistência: Snapshot do Alfabeto em Disco
//!
//! Serializa registro, grafo e estado de iteração num único JSON
//! "pretty-printed" (fácil de inspecionar e reparar à mão).
//!
//! ## Formato
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "saved_at": "...",
//!   "registry":  { "primitives": [...], "revision": 12, "history": [...] },
//!   "graph":     { "edges": [...], "revision": 7 },
//!   "iteration": { "iteration": 3, "phase": "COMPOSITION", ... }
//! }
//! ```
//!
//! Os índices do registro não são serializados; [`load`] chama
//! [`Registry::rebuild_index()`] antes de devolver o estado.
//!
//! ## Atomicidade
//!
//! A escrita vai para `<arquivo>.tmp` e só então é renomeada por cima do
//! original. Um crash no meio deixa o snapshot anterior intacto.
//!
//! A checagem de integridade não acontece aqui: quem decide se o estado
//! carregado está corrompido é o [`Engine`](crate::engine::Engine).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Registry, RelationshipGraph};
use crate::iteration::IterationState;

/// Versão do formato gravado.
pub const FORMAT_VERSION: u32 = 1;

/// Tudo que é preciso para retomar o processo.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistedState {
    pub format_version: u32,
    pub saved_at: DateTime<Utc>,
    pub registry: Registry,
    pub graph: RelationshipGraph,
    #[serde(default)]
    pub iteration: IterationState,
}

impl PersistedState {
    pub fn new(registry: Registry, graph: RelationshipGraph, iteration: IterationState) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            saved_at: Utc::now(),
            registry,
            graph,
            iteration,
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Salva o estado em `path`, criando o diretório pai se preciso.
///
/// # Erros
///
/// Falha ao criar o diretório, serializar, escrever o temporário ou renomear.
pub fn save(path: &Path, state: &PersistedState) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Falha ao criar diretório {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(state).context("Falha ao serializar o estado")?;
    let tmp = temp_path(path);
    std::fs::write(&tmp, json).with_context(|| format!("Falha ao escrever {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Falha ao substituir {} pelo novo snapshot", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        primitives = state.registry.len(),
        edges = state.graph.len(),
        "Persistence: snapshot salvo"
    );
    Ok(())
}

/// Carrega o estado de `path`. `Ok(None)` se o arquivo não existir.
///
/// # Erros
///
/// Arquivo ilegível, JSON inválido ou `format_version` desconhecida.
pub fn load(path: &Path) -> Result<Option<PersistedState>> {
    if !path.exists() {
        tracing::info!("Nenhum {} encontrado, iniciando alfabeto vazio", path.display());
        return Ok(None);
    }
    let json = std::fs::read_to_string(path).with_context(|| format!("Falha ao ler {}", path.display()))?;
    let mut state: PersistedState =
        serde_json::from_str(&json).with_context(|| format!("Falha ao desserializar {}", path.display()))?;
    if state.format_version != FORMAT_VERSION {
        bail!(
            "{}: format_version {} não suportada (esperado {})",
            path.display(),
            state.format_version,
            FORMAT_VERSION
        );
    }
    state.registry.rebuild_index();
    tracing::info!(
        path = %path.display(),
        primitives = state.registry.len(),
        edges = state.graph.len(),
        iteration = state.iteration.iteration,
        "Persistence: estado carregado"
    );
    Ok(Some(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Candidate, Domain, RelationKind};
    use crate::iteration::Phase;

    fn sample() -> PersistedState {
        let mut registry = Registry::new();
        let mut ids = Vec::new();
        for label in ["existence", "identity"] {
            let prime = registry.next_prime();
            let c = Candidate::new(label, Domain::Being, "...");
            ids.push(registry.register(&c, prime, 0).unwrap().id);
        }
        let mut graph = RelationshipGraph::new();
        graph
            .add(&registry, RelationKind::Presupposes, ids[1], ids[0], "")
            .unwrap();
        let iteration = IterationState {
            iteration: 2,
            phase: Phase::Composition,
            ..IterationState::default()
        };
        PersistedState::new(registry, graph, iteration)
    }

    #[test]
    fn round_trip_restores_indices_and_counters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("alphabet.json");
        save(&path, &sample()).unwrap();
        assert!(!temp_path(&path).exists());

        let loaded = load(&path).unwrap().unwrap();
        assert_eq!(loaded.registry.find_by_label("identity").unwrap().prime, 3);
        assert_eq!(loaded.registry.next_prime(), 5);
        assert_eq!(loaded.graph.len(), 1);
        assert_eq!(loaded.iteration.iteration, 2);
        assert_eq!(loaded.iteration.phase, Phase::Composition);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("absent.json")).unwrap().is_none());
    }

    #[test]
    fn garbage_and_unknown_versions_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alphabet.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load(&path).is_err());

        let mut state = sample();
        state.format_version = 99;
        save(&path, &state).unwrap();
        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("format_version"));
    }
}
