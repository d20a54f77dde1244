//! # Alphabetum: Motor de Composição e Consistência de Conceitos
//!
//! Mantém um alfabeto crescente de conceitos primitivos, cada um ligado a
//! um primo exclusivo, e garante que ele continue bem-formado a cada adição.
//!
//! ## Arquitetura
//!
//! ```text
//!                 ┌──────────────┐
//!  candidato ───▶ │  validation  │── FAILED ──▶ relatório
//!                 └──────┬───────┘
//!                        │ PASSED
//!                 ┌──────▼───────┐      ┌────────────┐
//!                 │    engine    │◀────▶│ persistence│
//!                 └──┬────────┬──┘      └────────────┘
//!           ┌────────▼─┐   ┌──▼─────────┐
//!           │ registry │   │   graph    │   core
//!           └────────┬─┘   └──┬─────────┘
//!                 ┌──▼────────▼──┐
//!                 │   calculus   │◀── coverage
//!                 └──────────────┘
//!        iteration + orchestrator decidem quando cada parte roda
//! ```
//!
//! ## Exemplo
//!
//! ```rust
//! use alphabetum::config::EngineConfig;
//! use alphabetum::core::{Candidate, Domain};
//! use alphabetum::engine::Engine;
//!
//! let mut engine = Engine::new(EngineConfig::default());
//! for (label, domain) in [("existence", Domain::Being), ("identity", Domain::Relation)] {
//!     let report = engine.propose(&Candidate::new(label, domain, "...")).unwrap();
//!     assert!(report.passed());
//! }
//! let d = engine.decompose_query("existence AND not(identity)").unwrap();
//! assert_eq!(d.asserted, vec!["existence"]);
//! assert_eq!(d.negated, vec!["identity"]);
//! ```

pub mod calculus;
pub mod config;
pub mod core;
pub mod coverage;
pub mod engine;
pub mod error;
pub mod iteration;
pub mod orchestrator;
pub mod persistence;
pub mod validation;

pub use error::{Error, Result};
