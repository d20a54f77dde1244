//! # Validador de Consistência
//!
//! Nada entra no registro sem passar por aqui. O [`Validator`] roda as
//! quatro verificações sobre um candidato e devolve um
//! [`ValidationReport`] com todas as violações de uma vez; a [`audit`]
//! verifica o armazém inteiro (load e consolidação).

pub mod audit;
pub mod checks;
pub mod report;

pub use audit::{audit, AuditReport, ContrastOverlap, DomainBalance};
pub use checks::Validator;
pub use report::{CheckKind, CheckOutcome, Commit, RedundancyMatch, ValidationReport, ValidationState};
