//! # Módulo Core: Tipos Fundamentais do Alfabeto
//!
//! Tudo que o motor persiste vive aqui:
//!
//! - [`next_prime`]: alocação determinística de primos
//! - [`Primitive`] / [`Candidate`]: conceito aceito e conceito proposto
//! - [`Registry`]: armazém autoritativo de primitivos, com trilha de auditoria
//! - [`Relationship`] / [`RelationKind`]: arestas entre primitivos
//! - [`RelationshipGraph`]: grafo de relações com detecção de ciclos
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use alphabetum::core::{Candidate, Domain, RelationKind, RelationshipGraph, Registry};
//!
//! let mut registry = Registry::new();
//! let mut graph = RelationshipGraph::new();
//!
//! let p = registry.next_prime();
//! let identity = registry.register(&Candidate::new("identity", Domain::Relation, "sameness"), p, 0).unwrap().id;
//! let p = registry.next_prime();
//! let difference = registry.register(&Candidate::new("difference", Domain::Relation, "otherness"), p, 0).unwrap().id;
//!
//! graph.add(&registry, RelationKind::Presupposes, difference, identity, "").unwrap();
//! assert!(graph.add(&registry, RelationKind::Presupposes, identity, difference, "").is_err());
//! ```

/// Alocador de primos.
pub mod primes;

pub mod primitive;

/// Registro de primitivos e histórico de mudanças.
pub mod registry;

pub mod relationship;

/// Grafo de relações (`contrasts_with`, `presupposes`, `composes_well`).
pub mod graph;

pub use graph::RelationshipGraph;
pub use primes::{is_prime, next_prime};
pub use primitive::{
    normalize_label, Assessment, Candidate, CulturalScope, Definition, Domain, Primitive, PrimitiveId,
    PrimitiveStatus, RelationHint, Severity,
};
pub use registry::{ChangeAction, PrimitiveSnapshot, Registry, RegistryChange};
pub use relationship::{RelationKind, Relationship};
