//! # Validator: As Quatro Verificações
//!
//! | Verificação | Falha quando |
//! |-------------|--------------|
//! | circularidade | o candidato alcançaria a si mesmo por `presupposes`, ou usa o próprio label na definição |
//! | redundância | label vazio ou já registrado, ou uma composição existente cobre os exemplos do candidato |
//! | contraste | um contraste declarado compartilha exemplos ostensivos, ou aponta para algo inexistente |
//! | pressuposição | algo pressuposto não está no registro |
//!
//! ## Busca de Redundância
//!
//! Literais (primitivo afirmado ou negado) são tirados dos primitivos ativos
//! cujos exemplos tocam os exemplos do candidato. Para cada combinação de
//! até `max_composition_terms` literais:
//!
//! ```text
//! afirmado p  → evidência = ostensivos(p),  contra-evidência = negativos(p)
//! negado p    → evidência = negativos(p),   contra-evidência = ostensivos(p)
//!
//! casa  ⇔  ostensivos(c) ⊆ evidência  e  ostensivos(c) ∩ contra-evidência = ∅
//! confiança = (|ostensivos(c) ∩ evidência| + |negativos(c) ∩ contra-evidência|)
//!           / (|ostensivos(c)| + |negativos(c)|)
//! ```
//!
//! Vence a maior confiança; empates preferem menos termos e depois o menor
//! produto. Combinações de um único literal contam: `not(identity)` já
//! basta para tornar "difference" redundante.
//!
//! A busca é uma DFS sobre os literais, com poda:
//!
//! - literal cuja contra-evidência toca `ostensivos(c)` nunca entra
//! - um primitivo aparece no máximo uma vez por combinação
//! - literal que não acrescenta nada à combinação atual é pulado
//! - combinação que já atingiu o teto de confiança não é estendida
//! - exemplo ostensivo que nenhum literal restante cobre encerra o ramo

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use super::report::{CheckKind, CheckOutcome, RedundancyMatch, ValidationReport, ValidationState};
use crate::calculus::{Calculus, Concept};
use crate::config::ValidationConfig;
use crate::core::{normalize_label, Candidate, Primitive, PrimitiveStatus, Registry, RelationshipGraph};
use crate::error::Error;

/// Validador sobre um snapshot de registro + grafo.
pub struct Validator<'a> {
    registry: &'a Registry,
    graph: &'a RelationshipGraph,
    settings: &'a ValidationConfig,
}

impl<'a> Validator<'a> {
    pub fn new(registry: &'a Registry, graph: &'a RelationshipGraph, settings: &'a ValidationConfig) -> Self {
        Self {
            registry,
            graph,
            settings,
        }
    }

    /// Roda as quatro verificações e devolve o relatório completo.
    ///
    /// Nunca falha: violações são dados, não erros.
    pub fn validate(&self, candidate: &Candidate) -> ValidationReport {
        let mut report = ValidationReport::pending(candidate.label.trim());
        if let Some(assessment) = &candidate.assessment {
            report.advisories = assessment.concerns();
            if !assessment.notes.is_empty() {
                report.advisories.push(assessment.notes.clone());
            }
        }

        for check in CheckKind::ALL {
            report.state = ValidationState::Checking(check);
            let outcome = match check {
                CheckKind::Circularity => self.circularity(candidate),
                CheckKind::Redundancy => {
                    let (outcome, found) = self.redundancy(candidate);
                    report.redundancy = found;
                    outcome
                }
                CheckKind::Contrast => self.contrast(candidate),
                CheckKind::Presupposition => self.presupposition(candidate),
            };
            tracing::debug!(
                candidate = %report.candidate,
                check = %check,
                violations = outcome.violations.len(),
                "Validator: verificação concluída"
            );
            report.checks.push(outcome);
        }

        report.state = if report.checks.iter().all(CheckOutcome::passed) {
            ValidationState::Passed
        } else {
            ValidationState::Failed
        };
        report
    }

    fn circularity(&self, candidate: &Candidate) -> CheckOutcome {
        let mut outcome = CheckOutcome::new(CheckKind::Circularity);
        let own = normalize_label(&candidate.label);

        for hint in &candidate.presupposes {
            if normalize_label(&hint.label) == own {
                let label = candidate.label.trim().to_string();
                outcome.violations.push(Error::Cycle {
                    path: vec![label.clone(), label],
                });
                continue;
            }
            // Só há caminho de volta se o label já existir no registro.
            let (Some(existing), Some(target)) = (
                self.registry.find_by_label(&candidate.label),
                self.registry.find_by_label(&hint.label),
            ) else {
                continue;
            };
            if let Some(cycle) = self.graph.would_create_cycle(existing.id, target.id) {
                let path = cycle
                    .into_iter()
                    .filter_map(|id| self.registry.get(id).ok().map(|p| p.label.clone()))
                    .collect();
                outcome.violations.push(Error::Cycle { path });
            }
        }

        if mentions_label(&candidate.definition.informal, &candidate.label) {
            outcome.violations.push(Error::CircularDefinition {
                label: candidate.label.trim().to_string(),
            });
        }
        outcome
    }

    fn redundancy(&self, candidate: &Candidate) -> (CheckOutcome, Option<RedundancyMatch>) {
        let mut outcome = CheckOutcome::new(CheckKind::Redundancy);
        if normalize_label(&candidate.label).is_empty() {
            outcome.violations.push(Error::InvalidLabel {
                label: candidate.label.clone(),
            });
        } else if self.registry.find_by_label(&candidate.label).is_some() {
            outcome.violations.push(Error::DuplicateLabel {
                label: candidate.label.trim().to_string(),
            });
        }

        let found = self.find_equivalent(candidate);
        if let Some(m) = &found {
            outcome.violations.push(Error::Redundancy {
                candidate: candidate.label.trim().to_string(),
                expression: m.expression.clone(),
                confidence: m.confidence,
            });
        }
        (outcome, found)
    }

    /// Melhor composição existente que cobre os exemplos do candidato.
    pub fn find_equivalent(&self, candidate: &Candidate) -> Option<RedundancyMatch> {
        let ostensive = sorted_examples(&candidate.definition.ostensive);
        let negative = sorted_examples(&candidate.definition.negative);
        if ostensive.is_empty() {
            return None;
        }
        let own = normalize_label(&candidate.label);

        let pool: Vec<LiteralEvidence<'_>> = self
            .registry
            .active()
            .filter(|p| normalize_label(&p.label) != own)
            .flat_map(|p| [LiteralEvidence::new(p, false), LiteralEvidence::new(p, true)])
            .filter_map(|l| l.against(&ostensive, &negative))
            .collect();

        let calc = Calculus::new(self.registry, self.graph);
        let mut search = EquivalenceSearch::new(&pool, calc, ostensive.len(), negative.len(), self.settings);
        let (confidence, concept) = search.run()?;
        let d = calc.decompose(&concept);
        Some(RedundancyMatch {
            expression: calc.call_expression(&concept),
            rendered: calc.render(&concept),
            asserted: d.asserted,
            negated: d.negated,
            confidence,
        })
    }

    fn contrast(&self, candidate: &Candidate) -> CheckOutcome {
        let mut outcome = CheckOutcome::new(CheckKind::Contrast);
        let own = normalize_label(&candidate.label);
        let label = candidate.label.trim().to_string();

        for hint in &candidate.contrasts_with {
            if normalize_label(&hint.label) == own {
                outcome.violations.push(Error::ReflexiveContrast { label: label.clone() });
                continue;
            }
            let Some(other) = self.registry.find_by_label(&hint.label) else {
                outcome.violations.push(Error::UnknownPrimitive {
                    reference: hint.label.trim().to_string(),
                });
                continue;
            };
            let shared = shared_examples(&candidate.definition.ostensive, &other.definition.ostensive);
            if !shared.is_empty() {
                outcome.violations.push(Error::ContrastViolation {
                    left: label.clone(),
                    right: other.label.clone(),
                    shared,
                });
            }
        }

        for hint in &candidate.composes_well {
            if self.registry.find_by_label(&hint.label).is_none() && normalize_label(&hint.label) != own {
                outcome.violations.push(Error::UnknownPrimitive {
                    reference: hint.label.trim().to_string(),
                });
            }
        }
        outcome
    }

    fn presupposition(&self, candidate: &Candidate) -> CheckOutcome {
        let mut outcome = CheckOutcome::new(CheckKind::Presupposition);
        let own = normalize_label(&candidate.label);
        for hint in &candidate.presupposes {
            if normalize_label(&hint.label) == own {
                // já reportado como ciclo
                continue;
            }
            match self.registry.find_by_label(&hint.label) {
                None => outcome.violations.push(Error::MissingPresupposition {
                    candidate: candidate.label.trim().to_string(),
                    missing: hint.label.trim().to_string(),
                }),
                Some(p) if p.status == PrimitiveStatus::Deprecated => {
                    outcome
                        .warnings
                        .push(format!("'{}' pressupõe '{}', que está depreciado", candidate.label.trim(), p.label));
                }
                Some(_) => {}
            }
        }
        outcome
    }
}

/// Evidência de um literal na busca de redundância.
struct LiteralEvidence<'p> {
    primitive: &'p Primitive,
    negated: bool,
    evidence: HashSet<String>,
    counter: HashSet<String>,
    /// Índices dos ostensivos do candidato cobertos por `evidence`.
    hits: Vec<usize>,
    /// Índices dos negativos do candidato cobertos por `counter`.
    rejects: Vec<usize>,
}

impl<'p> LiteralEvidence<'p> {
    fn new(primitive: &'p Primitive, negated: bool) -> Self {
        let ostensive = normalized_set(&primitive.definition.ostensive);
        let negative = normalized_set(&primitive.definition.negative);
        let (evidence, counter) = if negated { (negative, ostensive) } else { (ostensive, negative) };
        Self {
            primitive,
            negated,
            evidence,
            counter,
            hits: Vec::new(),
            rejects: Vec::new(),
        }
    }

    /// Situa o literal frente aos exemplos do candidato. `None` se ele
    /// contradiz algum ostensivo ou não contribui com nada.
    fn against(mut self, ostensive: &[String], negative: &[String]) -> Option<Self> {
        if ostensive.iter().any(|e| self.counter.contains(e)) {
            return None;
        }
        self.hits = indices_in(ostensive, &self.evidence);
        self.rejects = indices_in(negative, &self.counter);
        (!self.hits.is_empty() || !self.rejects.is_empty()).then_some(self)
    }

    fn concept(&self) -> Concept {
        let c = Concept::from_prime(self.primitive.prime);
        if self.negated {
            c.negate()
        } else {
            c
        }
    }
}

fn indices_in(examples: &[String], set: &HashSet<String>) -> Vec<usize> {
    examples
        .iter()
        .enumerate()
        .filter(|(_, e)| set.contains(*e))
        .map(|(i, _)| i)
        .collect()
}

/// DFS sobre combinações de literais, mantendo contadores de cobertura
/// incrementais em vez de remontar conjuntos a cada combinação.
struct EquivalenceSearch<'s, 'p> {
    pool: &'s [LiteralEvidence<'p>],
    calc: Calculus<'s>,
    max_terms: usize,
    threshold: f64,
    ostensive_len: usize,
    total: usize,
    /// Maior pontuação possível com este pool.
    ceiling: usize,
    /// Último índice do pool que cobre cada ostensivo.
    last_cover: Vec<Option<usize>>,
    hit_count: Vec<u32>,
    reject_count: Vec<u32>,
    covered: usize,
    rejected: usize,
    chosen: Vec<usize>,
    best: Option<(usize, usize, Concept)>,
}

impl<'s, 'p> EquivalenceSearch<'s, 'p> {
    fn new(
        pool: &'s [LiteralEvidence<'p>],
        calc: Calculus<'s>,
        ostensive_len: usize,
        negative_len: usize,
        settings: &ValidationConfig,
    ) -> Self {
        let mut last_cover = vec![None; ostensive_len];
        let mut reachable = vec![false; negative_len];
        for (i, literal) in pool.iter().enumerate() {
            for &e in &literal.hits {
                last_cover[e] = Some(i);
            }
            for &n in &literal.rejects {
                reachable[n] = true;
            }
        }
        Self {
            pool,
            calc,
            max_terms: settings.max_composition_terms.max(1),
            threshold: settings.redundancy_threshold,
            ostensive_len,
            total: ostensive_len + negative_len,
            ceiling: ostensive_len + reachable.iter().filter(|r| **r).count(),
            last_cover,
            hit_count: vec![0; ostensive_len],
            reject_count: vec![0; negative_len],
            covered: 0,
            rejected: 0,
            chosen: Vec::new(),
            best: None,
        }
    }

    /// (confiança, conceito) da melhor combinação, se alguma passar do limiar.
    fn run(&mut self) -> Option<(f64, Concept)> {
        if self.last_cover.iter().any(Option::is_none) {
            return None;
        }
        self.extend(0);
        let total = self.total as f64;
        self.best
            .take()
            .map(|(score, _, concept)| (score as f64 / total, concept))
    }

    fn extend(&mut self, start: usize) {
        let unreachable = self
            .hit_count
            .iter()
            .zip(&self.last_cover)
            .any(|(&n, last)| n == 0 && last.map_or(true, |l| l < start));
        if unreachable {
            return;
        }
        let pool = self.pool;
        for (i, literal) in pool.iter().enumerate().skip(start) {
            if self.chosen.iter().any(|&c| pool[c].primitive.id == literal.primitive.id) {
                continue;
            }
            let adds_hit = literal.hits.iter().any(|&e| self.hit_count[e] == 0);
            let adds_reject = literal.rejects.iter().any(|&n| self.reject_count[n] == 0);
            if !adds_hit && !adds_reject {
                continue;
            }
            self.push(i);
            self.evaluate();
            if self.should_extend() {
                self.extend(i + 1);
            }
            self.pop(i);
        }
    }

    fn push(&mut self, i: usize) {
        let literal = &self.pool[i];
        for &e in &literal.hits {
            if self.hit_count[e] == 0 {
                self.covered += 1;
            }
            self.hit_count[e] += 1;
        }
        for &n in &literal.rejects {
            if self.reject_count[n] == 0 {
                self.rejected += 1;
            }
            self.reject_count[n] += 1;
        }
        self.chosen.push(i);
    }

    fn pop(&mut self, i: usize) {
        let literal = &self.pool[i];
        for &e in &literal.hits {
            self.hit_count[e] -= 1;
            if self.hit_count[e] == 0 {
                self.covered -= 1;
            }
        }
        for &n in &literal.rejects {
            self.reject_count[n] -= 1;
            if self.reject_count[n] == 0 {
                self.rejected -= 1;
            }
        }
        self.chosen.pop();
    }

    fn score(&self) -> usize {
        self.ostensive_len + self.rejected
    }

    fn evaluate(&mut self) {
        if self.covered < self.ostensive_len {
            return;
        }
        let score = self.score();
        if (score as f64 / self.total as f64) < self.threshold {
            return;
        }
        let concepts: Vec<Concept> = self.chosen.iter().map(|&i| self.pool[i].concept()).collect();
        let Ok(concept) = self.calc.compose(&concepts) else {
            return;
        };
        let terms = self.chosen.len();
        let better = match &self.best {
            None => true,
            Some((s, n, prev)) => {
                score > *s
                    || (score == *s && terms < *n)
                    || (score == *s
                        && terms == *n
                        && (concept.positive(), concept.negative()) < (prev.positive(), prev.negative()))
            }
        };
        if better {
            self.best = Some((score, terms, concept));
        }
    }

    fn should_extend(&self) -> bool {
        if self.chosen.len() >= self.max_terms || (self.covered == self.ostensive_len && self.score() >= self.ceiling) {
            return false;
        }
        // com o teto já alcançado, só combinações de no máximo o mesmo tamanho podem vencer
        match &self.best {
            Some((s, n, _)) if *s >= self.ceiling => self.chosen.len() < *n,
            _ => true,
        }
    }
}

fn sorted_examples(examples: &[String]) -> Vec<String> {
    let mut out: Vec<String> = normalized_set(examples).into_iter().collect();
    out.sort();
    out
}

fn normalized_set(examples: &[String]) -> HashSet<String> {
    examples
        .iter()
        .map(|e| normalize_label(e))
        .filter(|e| !e.is_empty())
        .collect()
}

/// Exemplos de `left` que também aparecem em `right` (comparação
/// normalizada; devolve a grafia de `left`, sem repetições).
pub(crate) fn shared_examples(left: &[String], right: &[String]) -> Vec<String> {
    let right = normalized_set(right);
    let mut seen = HashSet::new();
    left.iter()
        .filter(|e| {
            let key = normalize_label(e);
            right.contains(&key) && seen.insert(key)
        })
        .map(|e| e.trim().to_string())
        .collect()
}

/// `true` se `label` aparece como palavra inteira em `text`.
fn mentions_label(text: &str, label: &str) -> bool {
    static WORDS: OnceLock<Regex> = OnceLock::new();
    let words = WORDS.get_or_init(|| Regex::new(r"[\p{L}\p{N}_'-]+").expect("padrão de regex estático"));
    let target: Vec<String> = normalize_label(label).split(' ').map(str::to_string).collect();
    if target.is_empty() || target[0].is_empty() {
        return false;
    }
    let text = normalize_label(text);
    let tokens: Vec<&str> = words.find_iter(&text).map(|m| m.as_str()).collect();
    tokens.windows(target.len()).any(|w| w.iter().zip(&target).all(|(a, b)| *a == b.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Assessment, CulturalScope, Domain, RelationKind};

    fn add(registry: &mut Registry, candidate: Candidate) {
        let prime = registry.next_prime();
        registry.register(&candidate, prime, 0).unwrap();
    }

    fn fixture() -> (Registry, RelationshipGraph) {
        let mut registry = Registry::new();
        add(
            &mut registry,
            Candidate::new("existence", Domain::Being, "the fact of being there")
                .with_examples(["a stone", "a river"], ["a unicorn"]),
        );
        add(
            &mut registry,
            Candidate::new("identity", Domain::Relation, "sameness of a thing with itself")
                .with_examples(["water is H2O", "the morning star is the evening star"], ["a cat is a dog"]),
        );
        (registry, RelationshipGraph::new())
    }

    fn validate(registry: &Registry, graph: &RelationshipGraph, c: &Candidate) -> ValidationReport {
        let settings = ValidationConfig::default();
        Validator::new(registry, graph, &settings).validate(c)
    }

    #[test]
    fn clean_candidate_passes_every_check() {
        let (registry, graph) = fixture();
        let c = Candidate::new("time", Domain::Time, "succession of moments")
            .with_examples(["yesterday", "a second"], ["a colour"])
            .presupposing("existence", "only what exists endures");
        let report = validate(&registry, &graph, &c);
        assert!(report.passed(), "{:?}", report.explanations());
        assert_eq!(report.checks.len(), 4);
        assert!(report.redundancy.is_none());
    }

    /// "difference" com os exemplos de identity trocados equivale a not(identity).
    #[test]
    fn negated_identity_is_redundant() {
        let (registry, graph) = fixture();
        let c = Candidate::new("difference", Domain::Relation, "otherness between things")
            .with_examples(["a cat is a dog"], ["water is H2O"])
            .presupposing("identity", "");
        let report = validate(&registry, &graph, &c);
        assert_eq!(report.state, ValidationState::Failed);
        assert_eq!(report.failed_checks(), vec![CheckKind::Redundancy]);
        let m = report.redundancy.as_ref().unwrap();
        assert_eq!(m.expression, r#"compose(negate(primitive_concept("identity")))"#);
        assert_eq!(m.rendered, "not(identity)");
        assert!((m.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_overlap_is_not_redundant() {
        let (registry, graph) = fixture();
        let c = Candidate::new("persistence", Domain::Time, "continuing through change")
            .with_examples(["a stone", "a mountain"], []);
        assert!(validate(&registry, &graph, &c).redundancy.is_none());
    }

    #[test]
    fn missing_presupposition_names_the_label() {
        let (registry, graph) = fixture();
        let c = Candidate::new("C", Domain::Being, "something").presupposing("D", "");
        let report = validate(&registry, &graph, &c);
        assert!(!report.passed());
        assert_eq!(
            report.outcome(CheckKind::Presupposition).unwrap().violations,
            vec![Error::MissingPresupposition {
                candidate: "C".into(),
                missing: "D".into()
            }]
        );
    }

    /// Uma tentativa ruim reporta todas as violações de uma vez.
    #[test]
    fn every_check_runs_without_short_circuit() {
        let (registry, graph) = fixture();
        let c = Candidate::new("identity", Domain::Relation, "identity is identity")
            .with_examples(["a stone"], [])
            .presupposing("identity", "")
            .presupposing("ghost", "")
            .contrasting("existence", "");
        let report = validate(&registry, &graph, &c);
        assert_eq!(report.failed_checks(), CheckKind::ALL.to_vec());
        let circularity = &report.outcome(CheckKind::Circularity).unwrap().violations;
        assert!(circularity.contains(&Error::CircularDefinition { label: "identity".into() }));
        assert!(circularity.iter().any(|e| matches!(e, Error::Cycle { .. })));
        assert!(report
            .violations()
            .any(|e| matches!(e, Error::DuplicateLabel { .. })));
        assert!(report.violations().any(|e| matches!(
            e,
            Error::ContrastViolation { shared, .. } if shared == &vec!["a stone".to_string()]
        )));
    }

    #[test]
    fn unknown_contrast_targets_are_violations() {
        let (registry, graph) = fixture();
        let c = Candidate::new("void", Domain::Being, "absence").contrasting("plenum", "");
        let report = validate(&registry, &graph, &c);
        assert_eq!(
            report.outcome(CheckKind::Contrast).unwrap().violations,
            vec![Error::UnknownPrimitive {
                reference: "plenum".into()
            }]
        );
    }

    #[test]
    fn deprecated_presupposition_only_warns() {
        let (mut registry, graph) = fixture();
        let id = registry.find_by_label("existence").unwrap().id;
        registry.deprecate(id).unwrap();
        let c = Candidate::new("time", Domain::Time, "succession").presupposing("existence", "");
        let report = validate(&registry, &graph, &c);
        assert!(report.passed());
        assert_eq!(report.warnings().count(), 1);
    }

    /// Se o label já existe, uma pressuposição que volta a ele é um ciclo.
    #[test]
    fn cycle_through_existing_graph_is_reported() {
        let (registry, mut graph) = fixture();
        let e = registry.find_by_label("existence").unwrap().id;
        let i = registry.find_by_label("identity").unwrap().id;
        graph.add(&registry, RelationKind::Presupposes, i, e, "").unwrap();
        let c = Candidate::new("existence", Domain::Being, "being there").presupposing("identity", "");
        let report = validate(&registry, &graph, &c);
        let circularity = &report.outcome(CheckKind::Circularity).unwrap().violations;
        assert_eq!(
            circularity,
            &vec![Error::Cycle {
                path: vec!["existence".into(), "identity".into(), "existence".into()]
            }]
        );
    }

    #[test]
    fn assessment_is_advisory_only() {
        let (registry, graph) = fixture();
        let c = Candidate::new("honour", Domain::Ethics, "standing in the eyes of others").with_assessment(Assessment {
            cultural_scope: CulturalScope::CulturallyBound,
            notes: "varia muito entre culturas".into(),
            ..Assessment::default()
        });
        let report = validate(&registry, &graph, &c);
        assert!(report.passed());
        assert_eq!(report.advisories.len(), 2);
    }

    #[test]
    fn label_mentions_are_whole_words() {
        assert!(mentions_label("Time is what time does", "time"));
        assert!(!mentions_label("timeless and sometimes", "time"));
        assert!(mentions_label("a causal power at work", "Causal Power"));
    }

    fn crowded(n: usize) -> Registry {
        let mut registry = Registry::new();
        for i in 0..n {
            add(
                &mut registry,
                Candidate::new(format!("person-{i}"), Domain::Social, "someone")
                    .with_examples(["a person".to_string(), format!("person number {i}")], ["a stone".to_string()]),
            );
        }
        registry
    }

    /// Centenas de primitivos com um exemplo em comum não explodem a busca.
    #[test]
    fn crowded_pool_without_full_cover_is_fast() {
        let registry = crowded(300);
        let graph = RelationshipGraph::new();
        let c = Candidate::new("humanity", Domain::Social, "all people together")
            .with_examples(["a person", "a crowd"], []);
        let started = std::time::Instant::now();
        let report = validate(&registry, &graph, &c);
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
        assert!(report.passed(), "{:?}", report.explanations());
    }

    #[test]
    fn crowded_pool_picks_the_smallest_pair() {
        let mut registry = crowded(300);
        add(
            &mut registry,
            Candidate::new("gathering", Domain::Social, "many together").with_examples(["a crowd"], []),
        );
        let graph = RelationshipGraph::new();
        let c = Candidate::new("humanity", Domain::Social, "all people together")
            .with_examples(["a person", "a crowd"], []);
        let started = std::time::Instant::now();
        let report = validate(&registry, &graph, &c);
        assert!(started.elapsed() < std::time::Duration::from_secs(2));
        let m = report.redundancy.as_ref().unwrap();
        assert_eq!(m.asserted, vec!["person-0", "gathering"]);
        assert!(m.negated.is_empty());
        assert!((m.confidence - 1.0).abs() < f64::EPSILON);
    }

    /// Um literal cuja contra-evidência contém um ostensivo nunca entra.
    #[test]
    fn contradicted_literals_are_excluded() {
        let (registry, graph) = fixture();
        let c = Candidate::new("thing", Domain::Being, "whatever there is")
            .with_examples(["a stone", "a unicorn"], []);
        assert!(validate(&registry, &graph, &c).redundancy.is_none());
    }

    #[test]
    fn blank_label_fails_redundancy() {
        let (registry, graph) = fixture();
        let report = validate(&registry, &graph, &Candidate::new("  ", Domain::Being, "nothing"));
        assert_eq!(report.state, ValidationState::Failed);
        assert_eq!(
            report.outcome(CheckKind::Redundancy).unwrap().violations,
            vec![Error::InvalidLabel { label: "  ".into() }]
        );
    }

    #[test]
    fn shared_examples_compare_normalized_text() {
        let left = vec!["A Stone".to_string(), "a river".to_string(), "a stone".to_string()];
        let right = vec!["a  stone".to_string()];
        assert_eq!(shared_examples(&left, &right), vec!["A Stone".to_string()]);
    }
}
