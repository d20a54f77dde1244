//! # Registry: Armazém Autoritativo de Primitivos
//!
//! O [`Registry`] guarda todos os primitivos aceitos, em ordem de inserção,
//! com índices para busca por id, por label normalizado e por primo.
//!
//! ## Armazenamento
//!
//! - **Primitivos**: `Vec<Primitive>`, na ordem de registro (relatórios reproduzíveis)
//! - **Índices**: `HashMap` por id, label normalizado e primo
//! - **Histórico**: uma [`RegistryChange`] por mutação, com snapshot antes/depois
//!
//! Os índices não são serializados (`#[serde(skip)]`); após desserializar,
//! chame [`rebuild_index()`](Registry::rebuild_index).
//!
//! ## Invariantes
//!
//! - labels normalizados são únicos
//! - cada primo é usado por exatamente um primitivo e nunca é reatribuído
//! - primos são estritamente crescentes na ordem de registro
//! - nada é removido: depreciar só troca o status
//!
//! ## Exemplo
//!
//! ```rust
//! use alphabetum::core::{Candidate, Domain, Registry};
//!
//! let mut registry = Registry::new();
//! let prime = registry.next_prime();
//! let existence = Candidate::new("existence", Domain::Being, "that which is");
//! let id = registry.register(&existence, prime, 0).unwrap().id;
//! assert_eq!(registry.get(id).unwrap().prime, 2);
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::primes::{is_prime, next_prime};
use super::primitive::{normalize_label, Candidate, Primitive, PrimitiveId, PrimitiveStatus};
use crate::error::{Error, Result};

/// Tipo de mutação registrada no histórico.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Registered,
    Deprecated,
    StatusChanged,
    ConfidenceChanged,
    Reviewed,
}

/// Estado mutável de um primitivo capturado antes/depois de uma mudança.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveSnapshot {
    pub status: PrimitiveStatus,
    pub confidence: f64,
    pub version: u32,
    pub last_reviewed: u32,
}

impl From<&Primitive> for PrimitiveSnapshot {
    fn from(p: &Primitive) -> Self {
        Self {
            status: p.status,
            confidence: p.confidence,
            version: p.version,
            last_reviewed: p.last_reviewed,
        }
    }
}

/// Entrada do histórico de auditoria.
///
/// `revision` é a revisão do registro **após** a mudança; `before` é `None`
/// apenas para registros novos.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryChange {
    pub revision: u64,
    pub action: ChangeAction,
    pub primitive_id: PrimitiveId,
    pub label: String,
    pub before: Option<PrimitiveSnapshot>,
    pub after: PrimitiveSnapshot,
    pub at: DateTime<Utc>,
}

/// Registro de primitivos.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Registry {
    primitives: Vec<Primitive>,

    /// Número de mutações já aplicadas.
    #[serde(default)]
    revision: u64,

    #[serde(default)]
    history: Vec<RegistryChange>,

    #[serde(skip, default)]
    by_id: HashMap<PrimitiveId, usize>,

    #[serde(skip, default)]
    by_label: HashMap<String, usize>,

    #[serde(skip, default)]
    by_prime: HashMap<u64, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstrói os índices a partir de `primitives`.
    ///
    /// **Deve ser chamado após desserialização.** Entradas repetidas não
    /// são descartadas aqui: quem detecta a corrupção é
    /// [`integrity_issues()`](Registry::integrity_issues).
    pub fn rebuild_index(&mut self) {
        self.by_id.clear();
        self.by_label.clear();
        self.by_prime.clear();
        for (idx, p) in self.primitives.iter().enumerate() {
            self.by_id.entry(p.id).or_insert(idx);
            self.by_label.entry(normalize_label(&p.label)).or_insert(idx);
            self.by_prime.entry(p.prime).or_insert(idx);
        }
    }

    /// Registra um candidato com o primo informado.
    ///
    /// # Erros
    ///
    /// - [`Error::InvalidLabel`] se o label normalizado for vazio
    /// - [`Error::DuplicateLabel`] se o label normalizado já existir
    /// - [`Error::PrimeConflict`] se o primo não for primo, já estiver em uso
    ///   ou não for maior que todos os primos já atribuídos
    pub fn register(&mut self, candidate: &Candidate, prime: u64, iteration: u32) -> Result<&Primitive> {
        let key = normalize_label(&candidate.label);
        if key.is_empty() {
            return Err(Error::InvalidLabel {
                label: candidate.label.clone(),
            });
        }
        if self.by_label.contains_key(&key) {
            return Err(Error::DuplicateLabel {
                label: candidate.label.trim().to_string(),
            });
        }
        let max_prime = self.primitives.iter().map(|p| p.prime).max().unwrap_or(0);
        if !is_prime(prime) || self.by_prime.contains_key(&prime) || prime <= max_prime {
            return Err(Error::PrimeConflict { prime });
        }

        let primitive = Primitive::from_candidate(candidate, prime, iteration);
        let idx = self.primitives.len();
        self.by_id.insert(primitive.id, idx);
        self.by_label.insert(key, idx);
        self.by_prime.insert(prime, idx);

        self.revision += 1;
        self.history.push(RegistryChange {
            revision: self.revision,
            action: ChangeAction::Registered,
            primitive_id: primitive.id,
            label: primitive.label.clone(),
            before: None,
            after: PrimitiveSnapshot::from(&primitive),
            at: Utc::now(),
        });
        tracing::debug!(id = %primitive.id, label = %primitive.label, prime, "Registry: primitivo registrado");
        self.primitives.push(primitive);
        Ok(&self.primitives[idx])
    }

    /// Busca por id.
    ///
    /// # Erros
    ///
    /// [`Error::NotFound`] se o id não existir.
    pub fn get(&self, id: PrimitiveId) -> Result<&Primitive> {
        self.by_id
            .get(&id)
            .map(|&idx| &self.primitives[idx])
            .ok_or(Error::NotFound { id })
    }

    /// Busca pelo label normalizado (case-insensitive, sem espaços nas bordas).
    pub fn find_by_label(&self, label: &str) -> Option<&Primitive> {
        self.by_label
            .get(&normalize_label(label))
            .map(|&idx| &self.primitives[idx])
    }

    /// Como [`find_by_label`](Registry::find_by_label), mas falha com
    /// [`Error::UnknownPrimitive`].
    pub fn resolve(&self, label: &str) -> Result<&Primitive> {
        self.find_by_label(label).ok_or_else(|| Error::UnknownPrimitive {
            reference: label.trim().to_string(),
        })
    }

    pub fn find_by_prime(&self, prime: u64) -> Option<&Primitive> {
        self.by_prime.get(&prime).map(|&idx| &self.primitives[idx])
    }

    pub fn contains(&self, id: PrimitiveId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Marca o primitivo como depreciado. O primo e a entrada permanecem.
    ///
    /// Depreciar um primitivo já depreciado não gera nova entrada no histórico.
    pub fn deprecate(&mut self, id: PrimitiveId) -> Result<()> {
        self.mutate(id, ChangeAction::Deprecated, |p| {
            if p.status == PrimitiveStatus::Deprecated {
                return false;
            }
            p.status = PrimitiveStatus::Deprecated;
            true
        })
    }

    /// Troca o status (usado pela consolidação). Não "ressuscita" depreciados.
    pub fn set_status(&mut self, id: PrimitiveId, status: PrimitiveStatus, iteration: u32) -> Result<()> {
        self.mutate(id, ChangeAction::StatusChanged, |p| {
            if p.status == status || p.status == PrimitiveStatus::Deprecated {
                return false;
            }
            p.status = status;
            p.last_reviewed = iteration;
            true
        })
    }

    /// Ajusta a confiança, limitada a [0, 1].
    pub fn set_confidence(&mut self, id: PrimitiveId, confidence: f64) -> Result<()> {
        let confidence = confidence.clamp(0.0, 1.0);
        self.mutate(id, ChangeAction::ConfidenceChanged, |p| {
            if (p.confidence - confidence).abs() < f64::EPSILON {
                return false;
            }
            p.confidence = confidence;
            true
        })
    }

    /// Registra que o primitivo foi revisado numa iteração, sem outras mudanças.
    pub fn mark_reviewed(&mut self, id: PrimitiveId, iteration: u32) -> Result<()> {
        self.mutate(id, ChangeAction::Reviewed, |p| {
            if p.last_reviewed == iteration {
                return false;
            }
            p.last_reviewed = iteration;
            true
        })
    }

    /// Aplica `change` e, se ele reportar mudança, incrementa versão e
    /// revisão e grava o par antes/depois no histórico.
    fn mutate<F>(&mut self, id: PrimitiveId, action: ChangeAction, change: F) -> Result<()>
    where
        F: FnOnce(&mut Primitive) -> bool,
    {
        let idx = *self.by_id.get(&id).ok_or(Error::NotFound { id })?;
        let primitive = &mut self.primitives[idx];
        let before = PrimitiveSnapshot::from(&*primitive);
        if !change(primitive) {
            return Ok(());
        }
        primitive.version += 1;
        self.revision += 1;
        let after = PrimitiveSnapshot::from(&*primitive);
        tracing::debug!(
            label = %primitive.label,
            action = ?action,
            status = primitive.status.label(),
            "Registry: primitivo atualizado"
        );
        self.history.push(RegistryChange {
            revision: self.revision,
            action,
            primitive_id: id,
            label: primitive.label.clone(),
            before: Some(before),
            after,
            at: Utc::now(),
        });
        Ok(())
    }

    /// Todos os primitivos, em ordem de inserção (inclui depreciados).
    pub fn all(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Primitivos não depreciados, em ordem de inserção.
    pub fn active(&self) -> impl Iterator<Item = &Primitive> {
        self.primitives.iter().filter(|p| p.is_active())
    }

    /// Primos já atribuídos, em ordem crescente.
    pub fn primes(&self) -> Vec<u64> {
        let mut primes: Vec<u64> = self.primitives.iter().map(|p| p.prime).collect();
        primes.sort_unstable();
        primes
    }

    /// Próximo primo livre para este snapshot.
    pub fn next_prime(&self) -> u64 {
        next_prime(self.primitives.iter().map(|p| &p.prime))
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn history(&self) -> &[RegistryChange] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Violações das invariantes do registro encontradas no estado carregado.
    ///
    /// Qualquer item aqui significa uma quebra anterior que não pode ser
    /// reparada localmente (ver [`Error::Corrupted`]).
    pub fn integrity_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let mut ids = HashMap::new();
        let mut labels = HashMap::new();
        let mut primes = HashMap::new();
        let mut last_prime = 0u64;
        for p in &self.primitives {
            if ids.insert(p.id, &p.label).is_some() {
                issues.push(format!("id duplicado: {}", p.id));
            }
            if let Some(other) = labels.insert(normalize_label(&p.label), &p.label) {
                issues.push(format!("label duplicado: '{}' / '{}'", other, p.label));
            }
            if let Some(other) = primes.insert(p.prime, &p.label) {
                issues.push(format!("primo {} atribuído a '{}' e '{}'", p.prime, other, p.label));
            }
            if !is_prime(p.prime) {
                issues.push(format!("'{}' tem valor não primo {}", p.label, p.prime));
            }
            if p.prime <= last_prime {
                issues.push(format!("primo {} de '{}' fora de ordem crescente", p.prime, p.label));
            }
            last_prime = last_prime.max(p.prime);
        }
        issues
    }
}
