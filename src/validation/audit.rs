//! # Auditoria do Armazém Inteiro
//!
//! Roda sobre o registro e o grafo já commitados (no load e na
//! consolidação). Separa o que é **fatal** (quebra de invariante que não se
//! repara localmente) do que só rebaixa primitivos a `contested` ou vira
//! aviso.

use std::collections::{BTreeMap, HashSet};

use super::checks::shared_examples;
use crate::core::{Domain, PrimitiveId, RelationKind, Registry, RelationshipGraph};

/// Par de contraste cujos exemplos ostensivos se sobrepõem.
#[derive(Clone, Debug, PartialEq)]
pub struct ContrastOverlap {
    pub left: PrimitiveId,
    pub right: PrimitiveId,
    pub left_label: String,
    pub right_label: String,
    pub shared: Vec<String>,
}

/// Distribuição de primitivos ativos por domínio.
#[derive(Clone, Debug, PartialEq)]
pub struct DomainBalance {
    pub counts: BTreeMap<Domain, usize>,
    /// Domínios sem nenhum primitivo ativo.
    pub neglected: Vec<Domain>,
    /// Domínios com um único primitivo.
    pub sparse: Vec<Domain>,
    /// Domínios com mais de [`CROWDED_DOMAIN`] primitivos: candidatos a revisão de sobreposição.
    pub crowded: Vec<Domain>,
    /// min/max entre os domínios povoados; 0 sem primitivos.
    pub balance: f64,
}

/// Acima disso um domínio merece revisão por redundância.
pub const CROWDED_DOMAIN: usize = 10;

impl DomainBalance {
    pub fn of(registry: &Registry) -> Self {
        let mut counts: BTreeMap<Domain, usize> = BTreeMap::new();
        for p in registry.active() {
            *counts.entry(p.domain).or_default() += 1;
        }
        let neglected = Domain::ALL.iter().copied().filter(|d| !counts.contains_key(d)).collect();
        let sparse = counts.iter().filter(|(_, &n)| n == 1).map(|(&d, _)| d).collect();
        let crowded = counts
            .iter()
            .filter(|(_, &n)| n > CROWDED_DOMAIN)
            .map(|(&d, _)| d)
            .collect();
        let balance = match (counts.values().min(), counts.values().max()) {
            (Some(&min), Some(&max)) if max > 0 => min as f64 / max as f64,
            _ => 0.0,
        };
        Self {
            counts,
            neglected,
            sparse,
            crowded,
            balance,
        }
    }
}

/// Resultado da auditoria.
#[derive(Clone, Debug, PartialEq)]
pub struct AuditReport {
    /// Quebras de invariante no estado armazenado.
    pub fatal: Vec<String>,
    pub overlaps: Vec<ContrastOverlap>,
    /// (dependente ativo, pressuposição depreciada).
    pub deprecated_dependencies: Vec<(String, String)>,
    pub domains: DomainBalance,
}

impl AuditReport {
    pub fn is_corrupted(&self) -> bool {
        !self.fatal.is_empty()
    }

    /// Primitivos envolvidos em sobreposição de contraste.
    pub fn contested(&self) -> HashSet<PrimitiveId> {
        self.overlaps.iter().flat_map(|o| [o.left, o.right]).collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .overlaps
            .iter()
            .map(|o| {
                format!(
                    "contraste '{}' / '{}' com exemplos em comum {:?}",
                    o.left_label, o.right_label, o.shared
                )
            })
            .collect();
        out.extend(
            self.deprecated_dependencies
                .iter()
                .map(|(s, t)| format!("'{s}' pressupõe '{t}', que está depreciado")),
        );
        out.extend(
            self.domains
                .crowded
                .iter()
                .map(|d| format!("domínio '{d}' tem mais de {CROWDED_DOMAIN} primitivos")),
        );
        out
    }
}

/// Audita o estado commitado.
pub fn audit(registry: &Registry, graph: &RelationshipGraph) -> AuditReport {
    let mut fatal = registry.integrity_issues();
    fatal.extend(graph.integrity_issues(registry));

    let mut overlaps = Vec::new();
    for (a, b) in graph.contrast_pairs() {
        let (Ok(left), Ok(right)) = (registry.get(a), registry.get(b)) else {
            continue;
        };
        if !left.is_active() || !right.is_active() {
            continue;
        }
        let shared = shared_examples(&left.definition.ostensive, &right.definition.ostensive);
        if !shared.is_empty() {
            overlaps.push(ContrastOverlap {
                left: a,
                right: b,
                left_label: left.label.clone(),
                right_label: right.label.clone(),
                shared,
            });
        }
    }

    let mut deprecated_dependencies = Vec::new();
    for edge in graph.edges().iter().filter(|e| e.kind == RelationKind::Presupposes) {
        let (Ok(source), Ok(target)) = (registry.get(edge.source), registry.get(edge.target)) else {
            continue;
        };
        if source.is_active() && !target.is_active() {
            deprecated_dependencies.push((source.label.clone(), target.label.clone()));
        }
    }

    if !fatal.is_empty() {
        tracing::error!(issues = ?fatal, "Audit: estado persistido viola invariantes");
    }
    AuditReport {
        fatal,
        overlaps,
        deprecated_dependencies,
        domains: DomainBalance::of(registry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Candidate, Relationship};

    fn registry() -> (Registry, Vec<PrimitiveId>) {
        let mut registry = Registry::new();
        let mut ids = Vec::new();
        for (label, domain, example) in [
            ("being", Domain::Being, "a stone"),
            ("nothing", Domain::Being, "a stone"),
            ("time", Domain::Time, "yesterday"),
        ] {
            let prime = registry.next_prime();
            let c = Candidate::new(label, domain, "...").with_examples([example], []);
            ids.push(registry.register(&c, prime, 0).unwrap().id);
        }
        (registry, ids)
    }

    #[test]
    fn clean_store_has_no_findings() {
        let (registry, ids) = registry();
        let mut graph = RelationshipGraph::new();
        graph
            .add(&registry, RelationKind::ContrastsWith, ids[0], ids[2], "")
            .unwrap();
        let report = audit(&registry, &graph);
        assert!(!report.is_corrupted());
        assert!(report.overlaps.is_empty());
        assert!(report.warnings().is_empty());
    }

    #[test]
    fn overlapping_contrast_marks_both_sides() {
        let (registry, ids) = registry();
        let mut graph = RelationshipGraph::new();
        graph
            .add(&registry, RelationKind::ContrastsWith, ids[0], ids[1], "")
            .unwrap();
        let report = audit(&registry, &graph);
        assert_eq!(report.overlaps.len(), 1);
        assert_eq!(report.overlaps[0].shared, vec!["a stone".to_string()]);
        let expected: HashSet<PrimitiveId> = [ids[0], ids[1]].into_iter().collect();
        assert_eq!(report.contested(), expected);
    }

    /// Um ciclo armazenado é corrupção, não aviso.
    #[test]
    fn stored_cycle_is_fatal() {
        let (registry, ids) = registry();
        let graph: RelationshipGraph = serde_json::from_value(serde_json::json!({
            "edges": [
                Relationship::new(RelationKind::Presupposes, ids[0], ids[2], ""),
                Relationship::new(RelationKind::Presupposes, ids[2], ids[0], ""),
            ]
        }))
        .unwrap();
        let report = audit(&registry, &graph);
        assert!(report.is_corrupted());
    }

    #[test]
    fn deprecated_dependency_is_a_warning() {
        let (mut registry, ids) = registry();
        let mut graph = RelationshipGraph::new();
        graph
            .add(&registry, RelationKind::Presupposes, ids[2], ids[0], "")
            .unwrap();
        registry.deprecate(ids[0]).unwrap();
        let report = audit(&registry, &graph);
        assert!(!report.is_corrupted());
        assert_eq!(
            report.deprecated_dependencies,
            vec![("time".to_string(), "being".to_string())]
        );
    }

    #[test]
    fn domain_balance_counts_active_primitives() {
        let (registry, _) = registry();
        let balance = DomainBalance::of(&registry);
        assert_eq!(balance.counts[&Domain::Being], 2);
        assert_eq!(balance.sparse, vec![Domain::Time]);
        assert_eq!(balance.neglected.len(), Domain::ALL.len() - 2);
        assert!((balance.balance - 0.5).abs() < f64::EPSILON);
    }
}
