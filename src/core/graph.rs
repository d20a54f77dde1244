//! # Grafo de Relações
//!
//! O [`RelationshipGraph`] guarda as arestas entre primitivos numa lista em
//! ordem de inserção (serializável como está) e monta, sob demanda, um
//! `DiGraphMap` do petgraph restrito às arestas `presupposes` para as
//! consultas de ciclo e alcançabilidade.
//!
//! Só `presupposes` entra na análise de ciclos: contrastes e afinidades não
//! são afirmações de dependência conceitual.
//!
//! ```text
//! add(Presupposes, difference, identity)   ok
//! add(Presupposes, identity, difference)   CycleError [identity → difference → identity]
//! add(ContrastsWith, being, nothing)       insere também nothing → being
//! ```

use std::collections::HashMap;

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::{depth_first_search, Control, DfsEvent, DfsPostOrder};
use serde::{Deserialize, Serialize};

use super::primitive::PrimitiveId;
use super::registry::Registry;
use super::relationship::{RelationKind, Relationship};
use crate::error::{Error, Result};

/// Um caminho `from → … → to`, com as duas pontas incluídas.
///
/// Alcançabilidade primeiro; só então uma DFS a partir de `from` anota o pai
/// de cada nó na árvore e o caminho é refeito de `to` para trás.
fn path_between(graph: &DiGraphMap<PrimitiveId, ()>, from: PrimitiveId, to: PrimitiveId) -> Option<Vec<PrimitiveId>> {
    if !has_path_connecting(graph, from, to, None) {
        return None;
    }
    let mut parent: HashMap<PrimitiveId, PrimitiveId> = HashMap::new();
    depth_first_search(graph, Some(from), |event| {
        if let DfsEvent::TreeEdge(u, v) = event {
            parent.insert(v, u);
            if v == to {
                return Control::Break(());
            }
        }
        Control::Continue
    });

    let mut path = vec![to];
    let mut node = to;
    while node != from {
        node = *parent.get(&node)?;
        path.push(node);
    }
    path.reverse();
    Some(path)
}

/// Grafo dirigido de relações sobre as entradas do registro.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RelationshipGraph {
    edges: Vec<Relationship>,

    /// Número de mutações já aplicadas.
    #[serde(default)]
    revision: u64,
}

impl RelationshipGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adiciona uma relação entre dois primitivos registrados.
    ///
    /// Retorna `Ok(false)` se a aresta já existia (nada muda).
    ///
    /// - `ContrastsWith` insere também a aresta simétrica
    /// - `Presupposes` é rejeitada se fechar um ciclo
    ///
    /// # Erros
    ///
    /// - [`Error::UnknownPrimitive`] se algum endpoint não estiver registrado
    /// - [`Error::ReflexiveContrast`] para `A contrasts_with A`
    /// - [`Error::Cycle`] se a pressuposição fechar um ciclo; o grafo não é alterado
    pub fn add(
        &mut self,
        registry: &Registry,
        kind: RelationKind,
        source: PrimitiveId,
        target: PrimitiveId,
        justification: &str,
    ) -> Result<bool> {
        for id in [source, target] {
            if !registry.contains(id) {
                return Err(Error::UnknownPrimitive {
                    reference: id.to_string(),
                });
            }
        }

        match kind {
            RelationKind::ContrastsWith => {
                if source == target {
                    return Err(Error::ReflexiveContrast {
                        label: label_of(registry, source),
                    });
                }
                let forward = self.insert(kind, source, target, justification);
                let backward = self.insert(kind, target, source, justification);
                Ok(forward || backward)
            }
            RelationKind::Presupposes => {
                if let Some(cycle) = self.would_create_cycle(source, target) {
                    let path = cycle.into_iter().map(|id| label_of(registry, id)).collect();
                    tracing::debug!(?path, "Graph: pressuposição rejeitada por ciclo");
                    return Err(Error::Cycle { path });
                }
                Ok(self.insert(kind, source, target, justification))
            }
            RelationKind::ComposesWell => Ok(self.insert(kind, source, target, justification)),
        }
    }

    fn insert(&mut self, kind: RelationKind, source: PrimitiveId, target: PrimitiveId, justification: &str) -> bool {
        if self.edges.iter().any(|e| e.same_edge(kind, source, target)) {
            return false;
        }
        tracing::debug!(kind = %kind, %source, %target, "Graph: aresta armazenada");
        self.edges.push(Relationship::new(kind, source, target, justification));
        self.revision += 1;
        true
    }

    /// Subgrafo dirigido das arestas `presupposes`.
    fn presupposition_graph(&self) -> DiGraphMap<PrimitiveId, ()> {
        let mut graph = DiGraphMap::new();
        for edge in self.edges.iter().filter(|e| e.kind == RelationKind::Presupposes) {
            graph.add_edge(edge.source, edge.target, ());
        }
        graph
    }

    /// Se `source presupposes target` fechar um ciclo, retorna o ciclo
    /// começando e terminando em `source`.
    pub fn would_create_cycle(&self, source: PrimitiveId, target: PrimitiveId) -> Option<Vec<PrimitiveId>> {
        if source == target {
            return Some(vec![source, source]);
        }
        let graph = self.presupposition_graph();
        if !graph.contains_node(target) || !graph.contains_node(source) {
            return None;
        }
        let path = path_between(&graph, target, source)?;
        let mut cycle = Vec::with_capacity(path.len() + 1);
        cycle.push(source);
        cycle.extend(path);
        Some(cycle)
    }

    /// Fecho transitivo do que `id` pressupõe, em ordem de dependência
    /// (o mais fundamental primeiro). `id` não entra no resultado.
    pub fn presupposition_chain(&self, id: PrimitiveId) -> Vec<PrimitiveId> {
        let graph = self.presupposition_graph();
        if !graph.contains_node(id) {
            return Vec::new();
        }
        // pós-ordem: cada nó sai depois de tudo que ele pressupõe
        let mut dfs = DfsPostOrder::new(&graph, id);
        let mut chain = Vec::new();
        while let Some(node) = dfs.next(&graph) {
            if node != id {
                chain.push(node);
            }
        }
        chain
    }

    /// O que `id` pressupõe diretamente.
    pub fn presuppositions(&self, id: PrimitiveId) -> Vec<PrimitiveId> {
        self.targets(RelationKind::Presupposes, id)
    }

    /// Quem pressupõe `id` diretamente.
    pub fn dependents(&self, id: PrimitiveId) -> Vec<PrimitiveId> {
        let mut out = Vec::new();
        for e in self.edges.iter().filter(|e| e.kind == RelationKind::Presupposes && e.target == id) {
            if !out.contains(&e.source) {
                out.push(e.source);
            }
        }
        out
    }

    /// Primitivos que contrastam com `id`.
    pub fn contrasts(&self, id: PrimitiveId) -> Vec<PrimitiveId> {
        self.targets(RelationKind::ContrastsWith, id)
    }

    /// Afinidades de `id` (`composes_well`, em qualquer direção).
    pub fn affinities(&self, id: PrimitiveId) -> Vec<PrimitiveId> {
        let mut out = Vec::new();
        for e in self.edges.iter().filter(|e| e.kind == RelationKind::ComposesWell) {
            let other = if e.source == id {
                e.target
            } else if e.target == id {
                e.source
            } else {
                continue;
            };
            if !out.contains(&other) {
                out.push(other);
            }
        }
        out
    }

    fn targets(&self, kind: RelationKind, id: PrimitiveId) -> Vec<PrimitiveId> {
        let mut out = Vec::new();
        for e in self.edges.iter().filter(|e| e.kind == kind && e.source == id) {
            if !out.contains(&e.target) {
                out.push(e.target);
            }
        }
        out
    }

    /// `true` se `a` e `b` estão declarados como contrastantes.
    pub fn are_contrasting(&self, a: PrimitiveId, b: PrimitiveId) -> bool {
        self.edges
            .iter()
            .any(|e| e.same_edge(RelationKind::ContrastsWith, a, b))
    }

    /// Pares de contraste sem repetição (cada par uma vez, na ordem de inserção).
    pub fn contrast_pairs(&self) -> Vec<(PrimitiveId, PrimitiveId)> {
        let mut pairs: Vec<(PrimitiveId, PrimitiveId)> = Vec::new();
        for e in self.edges.iter().filter(|e| e.kind == RelationKind::ContrastsWith) {
            if !pairs.iter().any(|&(a, b)| (a == e.target && b == e.source) || (a == e.source && b == e.target)) {
                pairs.push((e.source, e.target));
            }
        }
        pairs
    }

    /// Algum ciclo no subgrafo de pressuposições, se existir.
    pub fn find_cycle(&self) -> Option<Vec<PrimitiveId>> {
        let graph = self.presupposition_graph();
        let node = match toposort(&graph, None) {
            Ok(_) => return None,
            Err(cycle) => cycle.node_id(),
        };
        if graph.contains_edge(node, node) {
            return Some(vec![node, node]);
        }
        graph.neighbors(node).find_map(|next| {
            path_between(&graph, next, node).map(|path| {
                let mut cycle = vec![node];
                cycle.extend(path);
                cycle
            })
        })
    }

    pub fn edges(&self) -> &[Relationship] {
        &self.edges
    }

    pub fn edges_touching(&self, id: PrimitiveId) -> impl Iterator<Item = &Relationship> {
        self.edges.iter().filter(move |e| e.touches(id))
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Quebras estruturais no grafo carregado: endpoints ausentes,
    /// contrastes reflexivos ou assimétricos, ciclos de pressuposição.
    pub fn integrity_issues(&self, registry: &Registry) -> Vec<String> {
        let mut issues = Vec::new();
        for e in &self.edges {
            for id in [e.source, e.target] {
                if !registry.contains(id) {
                    issues.push(format!("aresta {} referencia primitivo inexistente {}", e.kind, id));
                }
            }
            if e.kind == RelationKind::ContrastsWith {
                if e.source == e.target {
                    issues.push(format!("contraste reflexivo em '{}'", label_of(registry, e.source)));
                } else if !self.edges.iter().any(|o| o.same_edge(e.kind, e.target, e.source)) {
                    issues.push(format!(
                        "contraste assimétrico: '{}' → '{}'",
                        label_of(registry, e.source),
                        label_of(registry, e.target)
                    ));
                }
            }
        }
        if let Some(cycle) = self.find_cycle() {
            let path: Vec<String> = cycle.into_iter().map(|id| label_of(registry, id)).collect();
            issues.push(format!("ciclo de pressuposições: {}", path.join(" → ")));
        }
        issues
    }
}

/// Label do primitivo, ou o próprio id quando ausente.
pub(crate) fn label_of(registry: &Registry, id: PrimitiveId) -> String {
    registry
        .get(id)
        .map(|p| p.label.clone())
        .unwrap_or_else(|_| id.to_string())
}
