//! # Relationship: Aresta Dirigida Entre Primitivos
//!
//! | Tipo | Significado | Restrição estrutural |
//! |------|-------------|----------------------|
//! | `ContrastsWith` | exclusão mútua | simétrica e irreflexiva |
//! | `Presupposes` | dependência conceitual | forma um DAG |
//! | `ComposesWell` | afinidade | nenhuma além de endpoints existentes |

use std::fmt;

use serde::{Deserialize, Serialize};

use super::primitive::PrimitiveId;

/// Tipo de relação entre dois primitivos.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    ContrastsWith,
    Presupposes,
    ComposesWell,
}

impl RelationKind {
    pub fn label(&self) -> &'static str {
        match self {
            RelationKind::ContrastsWith => "contrasts_with",
            RelationKind::Presupposes => "presupposes",
            RelationKind::ComposesWell => "composes_well",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Aresta do [`RelationshipGraph`](super::RelationshipGraph).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub kind: RelationKind,
    pub source: PrimitiveId,
    pub target: PrimitiveId,
    #[serde(default)]
    pub justification: String,
}

impl Relationship {
    pub fn new(kind: RelationKind, source: PrimitiveId, target: PrimitiveId, justification: impl Into<String>) -> Self {
        Self {
            kind,
            source,
            target,
            justification: justification.into(),
        }
    }

    /// Mesma aresta, desconsiderando a justificativa. `ComposesWell` é
    /// não-dirigida, então (a, b) e (b, a) coincidem.
    pub fn same_edge(&self, kind: RelationKind, source: PrimitiveId, target: PrimitiveId) -> bool {
        if self.kind != kind {
            return false;
        }
        let direct = self.source == source && self.target == target;
        match kind {
            RelationKind::ComposesWell => direct || (self.source == target && self.target == source),
            _ => direct,
        }
    }

    pub fn touches(&self, id: PrimitiveId) -> bool {
        self.source == id || self.target == id
    }
}
