//! # Orquestrador: o Ciclo de Construção do Alfabeto
//!
//! O [`Orchestrator`] executa uma fase por [`step`](Orchestrator::step),
//! na ordem decidida pela [`IterationController`](crate::iteration::IterationController).
//! Geração de candidatos e julgamento qualitativo ficam fora do motor, atrás
//! de dois traits:
//!
//! - [`CandidateSource`]: recebe lacunas e domínios em foco, devolve candidatos
//! - [`Reflector`]: recebe um resumo do processo, decide continuar ou concluir
//!
//! ```text
//! step()
//!   ├── should_stop? ─────────────────────────── Stopped(motivo)
//!   ├── EXPANSION        source.propose → engine.propose (um a um)
//!   ├── CONSOLIDATION    engine.consolidate
//!   ├── COMPOSITION      engine.coverage_report → lacunas para a próxima expansão
//!   ├── META_REFLECTION  reflector.reflect → foco ou conclusão
//!   ├── observe_alphabet() + advance()  (fechar um ciclo grava o snapshot)
//!   └── save() (se autosave)
//! ```
//!
//! Tudo é síncrono: um candidato é validado e commitado antes do próximo.

use anyhow::Result;

use crate::core::{Candidate, Domain};
use crate::coverage::Benchmark;
use crate::engine::{ConsolidationSummary, Engine};
use crate::iteration::{Convergence, Phase, StopReason};
use crate::validation::DomainBalance;

/// Pedido entregue ao proponente externo.
#[derive(Clone, Debug, PartialEq)]
pub struct ProposalRequest {
    pub iteration: u32,
    /// Labels que os benchmarks pediram e o alfabeto ainda não tem.
    pub gaps: Vec<String>,
    /// Domínios priorizados pela última reflexão.
    pub focus_domains: Vec<Domain>,
    pub neglected_domains: Vec<Domain>,
    /// Labels ativos (para o proponente não repetir).
    pub existing: Vec<String>,
}

/// Colaborador externo que sugere candidatos.
pub trait CandidateSource {
    fn propose(&mut self, request: &ProposalRequest) -> Vec<Candidate>;
}

impl<F> CandidateSource for F
where
    F: FnMut(&ProposalRequest) -> Vec<Candidate>,
{
    fn propose(&mut self, request: &ProposalRequest) -> Vec<Candidate> {
        self(request)
    }
}

/// Resumo entregue ao refletor.
#[derive(Clone, Debug, PartialEq)]
pub struct ReflectionSummary {
    pub iteration: u32,
    pub acceptance_rate: Option<f64>,
    pub coverage: Option<f64>,
    pub active_primitives: usize,
    pub domain_balance: f64,
    pub neglected_domains: Vec<Domain>,
    pub gaps: Vec<String>,
    /// Calculada sobre os ciclos já fechados; `None` no primeiro ciclo.
    pub convergence: Option<Convergence>,
}

/// Decisão da meta-reflexão.
#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    Continue { focus: Vec<Domain> },
    Conclude { rationale: String },
}

/// Colaborador externo que julga o andamento.
pub trait Reflector {
    fn reflect(&mut self, summary: &ReflectionSummary) -> Decision;
}

/// Sempre continua, focando nos domínios ainda vazios.
#[derive(Clone, Copy, Debug, Default)]
pub struct BalanceReflector;

impl Reflector for BalanceReflector {
    fn reflect(&mut self, summary: &ReflectionSummary) -> Decision {
        Decision::Continue {
            focus: summary.neglected_domains.clone(),
        }
    }
}

/// O que um passo produziu.
#[derive(Clone, Debug, PartialEq)]
pub enum StepOutcome {
    Expanded {
        accepted: Vec<String>,
        /// (label, explicações das violações)
        rejected: Vec<(String, Vec<String>)>,
    },
    Consolidated(ConsolidationSummary),
    Composed {
        ratio: f64,
        expressible: usize,
        total: usize,
        gaps: Vec<String>,
    },
    Reflected(Decision),
    Stopped(StopReason),
}

pub struct Orchestrator<S, R> {
    engine: Engine,
    source: S,
    reflector: R,
    benchmarks: Vec<Benchmark>,
    autosave: bool,
}

impl<S: CandidateSource, R: Reflector> Orchestrator<S, R> {
    pub fn new(engine: Engine, source: S, reflector: R, benchmarks: Vec<Benchmark>) -> Self {
        Self {
            engine,
            source,
            reflector,
            benchmarks,
            autosave: true,
        }
    }

    /// Liga ou desliga o salvamento após cada passo.
    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn into_engine(self) -> Engine {
        self.engine
    }

    /// Executa a fase corrente e avança a máquina.
    ///
    /// # Erros
    ///
    /// Motor suspenso, corrupção detectada na consolidação ou falha ao salvar.
    pub fn step(&mut self) -> Result<StepOutcome> {
        if let Some(reason) = self.engine.iteration_mut().should_stop().cloned() {
            return Ok(StepOutcome::Stopped(reason));
        }

        let phase = self.engine.iteration().phase();
        let iteration = self.engine.iteration().iteration();
        tracing::debug!(phase = %phase, iteration, "Orchestrator: executando fase");
        let outcome = match phase {
            Phase::Expansion => self.expand()?,
            Phase::Consolidation => StepOutcome::Consolidated(self.engine.consolidate(iteration)?),
            Phase::Composition => self.compose(),
            Phase::MetaReflection => self.reflect(),
        };

        let balance = DomainBalance::of(self.engine.registry());
        let active = self.engine.registry().active().count();
        let controller = self.engine.iteration_mut();
        controller.observe_alphabet(active, balance.counts);
        controller.advance();
        if self.autosave {
            self.engine.save()?;
        }
        Ok(outcome)
    }

    /// Roda até uma condição de parada.
    pub fn run(&mut self) -> Result<StopReason> {
        loop {
            if let StepOutcome::Stopped(reason) = self.step()? {
                tracing::info!(
                    reason = %reason,
                    iteration = self.engine.iteration().iteration(),
                    primitives = self.engine.registry().active().count(),
                    "Orchestrator: processo encerrado"
                );
                return Ok(reason);
            }
        }
    }

    fn expand(&mut self) -> Result<StepOutcome> {
        let state = self.engine.iteration().state();
        let balance = DomainBalance::of(self.engine.registry());
        let request = ProposalRequest {
            iteration: state.iteration,
            gaps: state.gaps.clone(),
            focus_domains: state.focus_domains.clone(),
            neglected_domains: balance.neglected,
            existing: self.engine.registry().active().map(|p| p.label.clone()).collect(),
        };

        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for candidate in self.source.propose(&request) {
            let report = self.engine.propose(&candidate)?;
            if report.passed() {
                accepted.push(report.candidate);
            } else {
                let explanations = report.explanations();
                rejected.push((report.candidate, explanations));
            }
        }
        tracing::info!(
            iteration = request.iteration,
            accepted = accepted.len(),
            rejected = rejected.len(),
            "Orchestrator: expansão concluída"
        );
        Ok(StepOutcome::Expanded { accepted, rejected })
    }

    fn compose(&mut self) -> StepOutcome {
        let report = self.engine.coverage_report(&self.benchmarks);
        let gaps: Vec<String> = report.gaps.iter().map(|g| g.label.clone()).collect();
        if report.total > 0 {
            self.engine.iteration_mut().record_coverage(report.ratio, gaps.clone());
        }
        tracing::info!(
            ratio = report.ratio,
            expressible = report.expressible,
            partial = report.partial,
            inexpressible = report.inexpressible,
            "Orchestrator: cobertura medida"
        );
        StepOutcome::Composed {
            ratio: report.ratio,
            expressible: report.expressible,
            total: report.total,
            gaps,
        }
    }

    fn reflect(&mut self) -> StepOutcome {
        let state = self.engine.iteration().state();
        let balance = DomainBalance::of(self.engine.registry());
        let summary = ReflectionSummary {
            iteration: state.iteration,
            acceptance_rate: state.counters.acceptance_rate(),
            coverage: state.last_coverage,
            active_primitives: self.engine.registry().active().count(),
            domain_balance: balance.balance,
            neglected_domains: balance.neglected,
            gaps: state.gaps.clone(),
            convergence: self.engine.iteration().convergence(),
        };
        if let Some(conv) = &summary.convergence {
            tracing::info!(
                cycles = conv.cycles,
                recent_growth = conv.recent_growth,
                acceptance_trend = ?conv.acceptance_trend,
                diminishing_returns = conv.diminishing_returns,
                "Orchestrator: convergência"
            );
        }

        let decision = self.reflector.reflect(&summary);
        match &decision {
            Decision::Continue { focus } => self.engine.iteration_mut().set_focus(focus.clone()),
            Decision::Conclude { rationale } => self.engine.iteration_mut().conclude(rationale.clone()),
        }
        StepOutcome::Reflected(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn engine_at(dir: &tempfile::TempDir) -> Engine {
        Engine::new(EngineConfig {
            data_path: dir.path().join("alphabet.json"),
            ..EngineConfig::default()
        })
    }

    /// Devolve os lotes na ordem, depois nada.
    fn scripted(mut batches: Vec<Vec<Candidate>>) -> impl FnMut(&ProposalRequest) -> Vec<Candidate> {
        batches.reverse();
        move |_| batches.pop().unwrap_or_default()
    }

    fn first_batch() -> Vec<Candidate> {
        vec![
            Candidate::new("existence", Domain::Being, "the fact of being there").with_examples(["a stone"], []),
            Candidate::new("identity", Domain::Relation, "sameness of a thing with itself")
                .with_examples(["water is H2O"], []),
            Candidate::new("presence", Domain::Being, "being here").presupposing("absence", ""),
        ]
    }

    #[test]
    fn full_cycle_reaches_coverage_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let benchmarks = vec![Benchmark::new("sameness of what is", ["existence", "identity"])];
        let mut orchestrator = Orchestrator::new(engine_at(&dir), scripted(vec![first_batch()]), BalanceReflector, benchmarks);

        match orchestrator.step().unwrap() {
            StepOutcome::Expanded { accepted, rejected } => {
                assert_eq!(accepted, vec!["existence", "identity"]);
                assert_eq!(rejected.len(), 1);
                assert_eq!(rejected[0].0, "presence");
            }
            other => panic!("esperava expansão, veio {other:?}"),
        }

        let reason = orchestrator.run().unwrap();
        assert_eq!(reason, StopReason::CoverageReached { ratio: 1.0 });

        let engine = orchestrator.into_engine();
        assert_eq!(engine.iteration().phase(), Phase::MetaReflection);
        let reloaded = Engine::load(engine.config().clone()).unwrap();
        assert_eq!(reloaded.registry().len(), 2);
        assert_eq!(reloaded.iteration().state().last_coverage, Some(1.0));
    }

    struct Concluding;

    impl Reflector for Concluding {
        fn reflect(&mut self, summary: &ReflectionSummary) -> Decision {
            Decision::Conclude {
                rationale: format!("{} primitivos bastam", summary.active_primitives),
            }
        }
    }

    #[test]
    fn reflector_can_conclude() {
        let dir = tempfile::tempdir().unwrap();
        let mut orchestrator =
            Orchestrator::new(engine_at(&dir), scripted(vec![first_batch()]), Concluding, Vec::new()).with_autosave(false);
        let reason = orchestrator.run().unwrap();
        assert_eq!(
            reason,
            StopReason::Concluded {
                rationale: "2 primitivos bastam".into()
            }
        );
        assert!(!dir.path().join("alphabet.json").exists());
    }

    #[test]
    fn gaps_reach_the_next_expansion() {
        let dir = tempfile::tempdir().unwrap();
        let benchmarks = vec![Benchmark::new("cause of change", ["causation", "time"])];
        let mut seen: Vec<Vec<String>> = Vec::new();
        {
            let source = |request: &ProposalRequest| {
                seen.push(request.gaps.clone());
                Vec::new()
            };
            let mut orchestrator =
                Orchestrator::new(engine_at(&dir), source, BalanceReflector, benchmarks).with_autosave(false);
            for _ in 0..6 {
                orchestrator.step().unwrap();
            }
            assert_eq!(orchestrator.engine().iteration().state().focus_domains.len(), Domain::ALL.len());
        }
        assert_eq!(seen[0], Vec::<String>::new());
        assert_eq!(seen[2], vec!["causation".to_string(), "time".to_string()]);
    }

    /// Guarda cada resumo e continua.
    #[derive(Default)]
    struct Recording(Vec<ReflectionSummary>);

    impl Reflector for Recording {
        fn reflect(&mut self, summary: &ReflectionSummary) -> Decision {
            self.0.push(summary.clone());
            Decision::Continue { focus: Vec::new() }
        }
    }

    #[test]
    fn reflection_sees_convergence_of_closed_cycles() {
        let dir = tempfile::tempdir().unwrap();
        let mut orchestrator = Orchestrator::new(
            engine_at(&dir),
            scripted(vec![first_batch()]),
            Recording::default(),
            Vec::new(),
        );
        // três ciclos completos, cinco passos cada na cadência padrão
        for _ in 0..15 {
            orchestrator.step().unwrap();
        }

        let summaries = &orchestrator.reflector.0;
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].convergence, None);
        let conv = summaries[2].convergence.as_ref().unwrap();
        assert_eq!(conv.growth, vec![2, 0]);
        assert!(!conv.saturated);

        let history = orchestrator.engine().iteration().history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].active_primitives, 2);
        assert_eq!(history[0].domain_counts.get(&Domain::Being), Some(&1));
        assert_eq!(history[0].counters.rejected, 1);

        let reloaded = Engine::load(orchestrator.engine().config().clone()).unwrap();
        assert_eq!(reloaded.iteration().history(), history);
    }
}
