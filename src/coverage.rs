//! # Coverage Tester
//!
//! Tenta expressar conceitos de benchmark (significado-alvo + labels de
//! dica) como composições do alfabeto atual.
//!
//! | Status | Quando |
//! |--------|--------|
//! | `Expressible` | todas as dicas registradas e ativas, composição consistente e bem-formada |
//! | `Partial` | algumas dicas resolvem, outras faltam |
//! | `Inexpressible` | nenhuma dica resolve, composição inconsistente/malformada, ou sem dicas |
//!
//! As dicas aceitam a mesma sintaxe de literal das consultas (`not(x)`,
//! `!x`). Dicas depreciadas contam como ausentes.
//!
//! O único artefato que volta para o proponente é [`CoverageReport::gaps`]:
//! labels ausentes ranqueados por frequência.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::calculus::{parse_expression, Calculus, Concept, ConceptExpr, Literal};
use crate::config::CoverageConfig;
use crate::core::{normalize_label, Registry, RelationshipGraph};

/// Conceito de benchmark.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    pub name: String,
    #[serde(default)]
    pub meaning: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default, alias = "decomposition_hints")]
    pub hints: Vec<String>,
}

impl Benchmark {
    pub fn new<S: Into<String>>(name: impl Into<String>, hints: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            meaning: String::new(),
            domain: None,
            hints: hints.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CoverageStatus {
    Expressible { expression: String, description_length: usize },
    Partial { missing: Vec<String> },
    Inexpressible { missing: Vec<String>, reason: String },
}

impl CoverageStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CoverageStatus::Expressible { .. } => "expressible",
            CoverageStatus::Partial { .. } => "partial",
            CoverageStatus::Inexpressible { .. } => "inexpressible",
        }
    }

    pub fn missing(&self) -> &[String] {
        match self {
            CoverageStatus::Expressible { .. } => &[],
            CoverageStatus::Partial { missing } | CoverageStatus::Inexpressible { missing, .. } => missing,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BenchmarkResult {
    pub name: String,
    pub domain: Option<String>,
    #[serde(flatten)]
    pub status: CoverageStatus,
    /// Fração das dicas que resolveram.
    pub hint_ratio: f64,
    /// Labels registrados usados pelas dicas resolvidas.
    pub primitives: Vec<String>,
}

/// Label ausente e em quantos benchmarks ele faltou.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    pub label: String,
    pub count: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CoverageReport {
    pub total: usize,
    pub expressible: usize,
    pub partial: usize,
    pub inexpressible: usize,
    /// `expressible / total`; 0 sem benchmarks.
    pub ratio: f64,
    pub gaps: Vec<Gap>,
    pub results: Vec<BenchmarkResult>,
    /// Quantas composições expressáveis usam cada primitivo (decrescente).
    pub usage: Vec<(String, usize)>,
    /// Comprimento médio de descrição entre os expressáveis.
    pub mean_description_length: Option<f64>,
    /// `true` se a passada parou antes do último benchmark.
    pub interrupted: bool,
}

/// Testador de cobertura sobre um snapshot do registro.
pub struct CoverageTester<'a> {
    registry: &'a Registry,
    calculus: Calculus<'a>,
    settings: &'a CoverageConfig,
}

impl<'a> CoverageTester<'a> {
    pub fn new(registry: &'a Registry, graph: &'a RelationshipGraph, settings: &'a CoverageConfig) -> Self {
        Self {
            registry,
            calculus: Calculus::new(registry, graph),
            settings,
        }
    }

    pub fn test(&self, benchmarks: &[Benchmark]) -> CoverageReport {
        self.test_until(benchmarks, |_| false)
    }

    /// Como [`test`](Self::test), mas consulta `interrupt(i)` antes do
    /// benchmark `i`. Cada benchmark é independente, então parar no meio só
    /// produz um relatório parcial.
    pub fn test_until<F>(&self, benchmarks: &[Benchmark], mut interrupt: F) -> CoverageReport
    where
        F: FnMut(usize) -> bool,
    {
        let mut report = CoverageReport::default();
        for (i, benchmark) in benchmarks.iter().enumerate() {
            if interrupt(i) {
                report.interrupted = true;
                tracing::info!(done = i, total = benchmarks.len(), "Coverage: passada interrompida");
                break;
            }
            report.results.push(self.test_one(benchmark));
        }
        self.aggregate(&mut report);
        report
    }

    fn test_one(&self, benchmark: &Benchmark) -> BenchmarkResult {
        let (literals, missing) = self.resolve_hints(&benchmark.hints);
        let resolved = literals.len();
        let total = resolved + missing.len();
        let hint_ratio = if total == 0 { 0.0 } else { resolved as f64 / total as f64 };

        let status = if total == 0 {
            CoverageStatus::Inexpressible {
                missing,
                reason: "sem dicas de decomposição".into(),
            }
        } else if !missing.is_empty() && resolved > 0 {
            CoverageStatus::Partial { missing }
        } else if !missing.is_empty() {
            CoverageStatus::Inexpressible {
                missing,
                reason: "nenhuma dica registrada".into(),
            }
        } else {
            match self.compose(&literals) {
                Ok(concept) => {
                    let problems = self.calculus.well_formedness(&concept);
                    if problems.is_empty() {
                        CoverageStatus::Expressible {
                            expression: self.calculus.render(&concept),
                            description_length: self.calculus.description_length(&concept),
                        }
                    } else {
                        let reason: Vec<String> = problems.iter().map(ToString::to_string).collect();
                        CoverageStatus::Inexpressible {
                            missing: Vec::new(),
                            reason: reason.join("; "),
                        }
                    }
                }
                Err(e) => CoverageStatus::Inexpressible {
                    missing: Vec::new(),
                    reason: e.to_string(),
                },
            }
        };

        tracing::debug!(benchmark = %benchmark.name, status = status.label(), "Coverage: benchmark avaliado");
        let primitives = literals
            .iter()
            .filter_map(|l| self.registry.find_by_label(&l.label))
            .map(|p| p.label.clone())
            .collect();
        BenchmarkResult {
            name: benchmark.name.clone(),
            domain: benchmark.domain.clone(),
            status,
            hint_ratio,
            primitives,
        }
    }

    /// Separa as dicas em literais resolvidos e labels ausentes.
    fn resolve_hints(&self, hints: &[String]) -> (Vec<Literal>, Vec<String>) {
        let mut literals = Vec::new();
        let mut missing = Vec::new();
        for hint in hints {
            let parsed = match parse_expression(hint) {
                Ok(ConceptExpr::Symbolic(lits)) => lits,
                _ => vec![Literal {
                    label: hint.trim().to_string(),
                    negated: false,
                }],
            };
            for lit in parsed {
                match self.registry.find_by_label(&lit.label) {
                    Some(p) if p.is_active() => literals.push(lit),
                    _ => missing.push(lit.label),
                }
            }
        }
        (literals, missing)
    }

    fn compose(&self, literals: &[Literal]) -> crate::error::Result<Concept> {
        let concepts = literals
            .iter()
            .map(|l| {
                let c = self.calculus.primitive_concept(&l.label)?;
                Ok(if l.negated { c.negate() } else { c })
            })
            .collect::<crate::error::Result<Vec<_>>>()?;
        self.calculus.compose(&concepts)
    }

    fn aggregate(&self, report: &mut CoverageReport) {
        report.total = report.results.len();
        let mut gap_counts: HashMap<String, (String, usize)> = HashMap::new();
        let mut usage: HashMap<String, usize> = HashMap::new();
        let mut lengths = Vec::new();

        for r in &report.results {
            match &r.status {
                CoverageStatus::Expressible { description_length, .. } => {
                    report.expressible += 1;
                    lengths.push(*description_length);
                    for label in &r.primitives {
                        *usage.entry(label.clone()).or_default() += 1;
                    }
                }
                CoverageStatus::Partial { .. } => report.partial += 1,
                CoverageStatus::Inexpressible { .. } => report.inexpressible += 1,
            }
            // um benchmark conta cada label ausente uma vez
            let mut seen = Vec::new();
            for label in r.status.missing() {
                let key = normalize_label(label);
                if seen.contains(&key) {
                    continue;
                }
                seen.push(key.clone());
                gap_counts.entry(key).or_insert_with(|| (label.trim().to_string(), 0)).1 += 1;
            }
        }

        report.ratio = if report.total == 0 {
            0.0
        } else {
            report.expressible as f64 / report.total as f64
        };

        let mut gaps: Vec<Gap> = gap_counts
            .into_values()
            .map(|(label, count)| Gap { label, count })
            .collect();
        gaps.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
        gaps.truncate(self.settings.max_gap_labels);
        report.gaps = gaps;

        let mut usage: Vec<(String, usize)> = usage.into_iter().collect();
        usage.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        report.usage = usage;

        report.mean_description_length = if lengths.is_empty() {
            None
        } else {
            Some(lengths.iter().sum::<usize>() as f64 / lengths.len() as f64)
        };
    }
}

/// Formatos aceitos no arquivo de benchmarks.
#[derive(Deserialize)]
#[serde(untagged)]
enum BenchmarkFile {
    List(Vec<Benchmark>),
    Wrapped { benchmark_concepts: Vec<Benchmark> },
}

/// Carrega benchmarks de um JSON: lista direta ou `{"benchmark_concepts": [...]}`.
pub fn load_benchmarks(path: &Path) -> Result<Vec<Benchmark>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Falha ao ler benchmarks em {}", path.display()))?;
    let file: BenchmarkFile = serde_json::from_str(&json)
        .with_context(|| format!("Falha ao desserializar {}", path.display()))?;
    Ok(match file {
        BenchmarkFile::List(list) => list,
        BenchmarkFile::Wrapped { benchmark_concepts } => benchmark_concepts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Candidate, Domain, RelationKind};
    use std::io::Write;

    fn fixture() -> (Registry, RelationshipGraph) {
        let mut registry = Registry::new();
        for label in ["existence", "identity", "time", "change", "mind"] {
            let prime = registry.next_prime();
            registry
                .register(&Candidate::new(label, Domain::Being, "..."), prime, 0)
                .unwrap();
        }
        (registry, RelationshipGraph::new())
    }

    fn run(registry: &Registry, graph: &RelationshipGraph, benchmarks: &[Benchmark]) -> CoverageReport {
        let settings = CoverageConfig::default();
        CoverageTester::new(registry, graph, &settings).test(benchmarks)
    }

    #[test]
    fn statuses_and_ratio() {
        let (registry, graph) = fixture();
        let benchmarks = vec![
            Benchmark::new("persistence", ["existence", "time"]),
            Benchmark::new("becoming", ["change", "time", "process"]),
            Benchmark::new("justice", ["fairness", "desert"]),
            Benchmark::new("stasis", ["time", "not(change)"]),
        ];
        let report = run(&registry, &graph, &benchmarks);
        assert_eq!(report.total, 4);
        assert_eq!((report.expressible, report.partial, report.inexpressible), (2, 1, 1));
        assert!((report.ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(report.results[1].status.missing(), ["process".to_string()]);
        assert_eq!(
            report.results[3].status,
            CoverageStatus::Expressible {
                expression: "time AND not(change)".into(),
                description_length: 2
            }
        );
        assert_eq!(report.mean_description_length, Some(2.0));
    }

    /// Lacunas somam faltas de parciais e inexpressáveis, mais frequentes primeiro.
    #[test]
    fn gaps_are_ranked_by_frequency() {
        let (registry, graph) = fixture();
        let benchmarks = vec![
            Benchmark::new("a", ["existence", "causation"]),
            Benchmark::new("b", ["causation", "space"]),
            Benchmark::new("c", ["space", "causation", "Causation"]),
            Benchmark::new("d", ["value"]),
        ];
        let report = run(&registry, &graph, &benchmarks);
        assert_eq!(
            report.gaps,
            vec![
                Gap { label: "causation".into(), count: 3 },
                Gap { label: "space".into(), count: 2 },
                Gap { label: "value".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn gap_list_is_capped() {
        let (registry, graph) = fixture();
        let benchmarks: Vec<Benchmark> = (0..30).map(|i| Benchmark::new(format!("b{i}"), [format!("missing{i}")])).collect();
        let report = run(&registry, &graph, &benchmarks);
        assert_eq!(report.gaps.len(), 20);
    }

    #[test]
    fn clash_and_contrast_make_a_benchmark_inexpressible() {
        let (registry, mut graph) = fixture();
        let e = registry.find_by_label("existence").unwrap().id;
        let m = registry.find_by_label("mind").unwrap().id;
        graph.add(&registry, RelationKind::ContrastsWith, e, m, "").unwrap();
        let benchmarks = vec![
            Benchmark::new("paradox", ["time", "not(time)"]),
            Benchmark::new("ghost", ["existence", "mind"]),
        ];
        let report = run(&registry, &graph, &benchmarks);
        assert_eq!(report.inexpressible, 2);
        assert!(report.gaps.is_empty());
    }

    #[test]
    fn deprecated_hints_count_as_missing() {
        let (mut registry, graph) = fixture();
        let id = registry.find_by_label("mind").unwrap().id;
        registry.deprecate(id).unwrap();
        let report = run(&registry, &graph, &[Benchmark::new("thought", ["mind", "time"])]);
        assert_eq!(report.partial, 1);
        assert_eq!(report.gaps, vec![Gap { label: "mind".into(), count: 1 }]);
    }

    #[test]
    fn interruption_between_benchmarks() {
        let (registry, graph) = fixture();
        let settings = CoverageConfig::default();
        let benchmarks = vec![
            Benchmark::new("a", ["existence"]),
            Benchmark::new("b", ["time"]),
            Benchmark::new("c", ["mind"]),
        ];
        let report = CoverageTester::new(&registry, &graph, &settings).test_until(&benchmarks, |i| i == 2);
        assert!(report.interrupted);
        assert_eq!(report.total, 2);
        assert!((report.ratio - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn usage_counts_primitives_across_expressible_benchmarks() {
        let (registry, graph) = fixture();
        let benchmarks = vec![
            Benchmark::new("a", ["existence", "time"]),
            Benchmark::new("b", ["time"]),
        ];
        let report = run(&registry, &graph, &benchmarks);
        assert_eq!(report.usage[0], ("time".to_string(), 2));
    }

    #[test]
    fn benchmark_file_accepts_both_layouts() {
        let mut list = tempfile::NamedTempFile::new().unwrap();
        write!(list, r#"[{{"name": "x", "hints": ["time"]}}]"#).unwrap();
        assert_eq!(load_benchmarks(list.path()).unwrap()[0].hints, vec!["time"]);

        let mut wrapped = tempfile::NamedTempFile::new().unwrap();
        write!(
            wrapped,
            r#"{{"benchmark_concepts": [{{"name": "y", "domain": "time", "decomposition_hints": ["a", "b"]}}]}}"#
        )
        .unwrap();
        let loaded = load_benchmarks(wrapped.path()).unwrap();
        assert_eq!(loaded[0].hints.len(), 2);
        assert_eq!(loaded[0].domain.as_deref(), Some("time"));
    }
}
