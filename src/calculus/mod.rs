//! # Cálculo de Composição
//!
//! Conceitos complexos como produtos de primos em duas trilhas
//! (afirmado / negado), mais o parser das expressões aceitas em consultas.
//!
//! ```rust
//! use alphabetum::calculus::Calculus;
//! use alphabetum::core::{Candidate, Domain, Registry, RelationshipGraph};
//!
//! let mut registry = Registry::new();
//! for label in ["existence", "identity"] {
//!     let prime = registry.next_prime();
//!     registry.register(&Candidate::new(label, Domain::Being, "..."), prime, 0).unwrap();
//! }
//! let graph = RelationshipGraph::new();
//! let calc = Calculus::new(&registry, &graph);
//!
//! let both = calc.literals(&["existence", "identity"], &[]).unwrap();
//! assert_eq!(both.to_string(), "6");
//! assert_eq!(calc.decompose(&both).asserted, ["existence", "identity"]);
//! ```

pub mod composer;
pub mod concept;
pub mod expression;

pub use composer::{Calculus, Decomposition, Malformation, Track, UnknownFactor};
pub use concept::Concept;
pub use expression::{parse as parse_expression, ConceptExpr, Literal};
