//! # Engine: Fachada do Motor de Composição
//!
//! O [`Engine`] é o dono único do estado: registro, grafo e máquina de
//! iteração. Nenhum componente guarda estado global; validador, cálculo e
//! testador de cobertura recebem referências emprestadas a cada chamada.
//!
//! ## Interfaces
//!
//! | Operação | Efeito |
//! |----------|--------|
//! | [`propose`](Engine::propose) | valida e, se passar, registra + insere arestas num único commit |
//! | [`add_relationship`](Engine::add_relationship) | aresta avulsa entre primitivos já registrados |
//! | [`decompose_query`](Engine::decompose_query) | expressão de conceito → labels afirmados/negados + fatores desconhecidos |
//! | [`coverage_report`](Engine::coverage_report) | testa benchmarks contra o alfabeto atual |
//! | [`consolidate`](Engine::consolidate) | auditoria do armazém + ajuste de status |
//!
//! ## Commit Atômico
//!
//! ```text
//! propose(c)
//!   ├─ Validator::validate(c)        (snapshot atual, sem escrita)
//!   ├─ FAILED → relatório, nada muda
//!   └─ PASSED → clona registro + grafo
//!                register + arestas no clone
//!                sucesso → troca o estado inteiro
//!                erro    → descarta o clone
//! ```
//!
//! ## Modo Suspenso
//!
//! Se o estado carregado violar invariantes (primo repetido, ciclo
//! armazenado, contraste assimétrico...), o motor sobe **suspenso**:
//! consultas funcionam, escritas devolvem [`Error::Halted`].

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};

use crate::calculus::{parse_expression, Calculus, Decomposition};
use crate::config::EngineConfig;
use crate::core::{Candidate, PrimitiveId, PrimitiveStatus, RelationKind, Registry, RelationshipGraph};
use crate::coverage::{Benchmark, CoverageReport, CoverageTester};
use crate::error::{Error, Result};
use crate::iteration::IterationController;
use crate::persistence::{self, PersistedState};
use crate::validation::checks::shared_examples;
use crate::validation::{audit, Commit, DomainBalance, ValidationReport, Validator};

/// Versão observável do estado: revisões do registro e do grafo.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateVersion {
    pub registry: u64,
    pub graph: u64,
}

impl fmt::Display for StateVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}.g{}", self.registry, self.graph)
    }
}

/// O que uma consolidação mudou.
#[derive(Clone, Debug, PartialEq)]
pub struct ConsolidationSummary {
    pub contested: Vec<String>,
    pub stabilized: Vec<String>,
    pub warnings: Vec<String>,
    pub domains: DomainBalance,
}

/// Motor de composição e consistência.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    registry: Registry,
    graph: RelationshipGraph,
    iteration: IterationController,
    halted: Option<String>,
}

impl Engine {
    /// Motor vazio.
    pub fn new(config: EngineConfig) -> Self {
        let iteration = IterationController::new(config.iteration.clone(), config.stopping.clone());
        Self {
            config,
            registry: Registry::new(),
            graph: RelationshipGraph::new(),
            iteration,
            halted: None,
        }
    }

    /// Monta o motor sobre um estado carregado e audita a integridade.
    ///
    /// Estado corrompido não é erro aqui: o motor sobe suspenso.
    pub fn from_state(config: EngineConfig, state: PersistedState) -> Self {
        let PersistedState {
            mut registry,
            graph,
            iteration,
            ..
        } = state;
        registry.rebuild_index();
        let controller = IterationController::resume(config.iteration.clone(), config.stopping.clone(), iteration);

        let report = audit(&registry, &graph);
        let halted = report.is_corrupted().then(|| report.fatal.join("; "));
        if let Some(reason) = &halted {
            tracing::error!(reason = %reason, "Engine: estado corrompido, commits suspensos");
        }
        for warning in report.warnings() {
            tracing::warn!(warning = %warning, "Engine: aviso de integridade");
        }

        Self {
            config,
            registry,
            graph,
            iteration: controller,
            halted,
        }
    }

    /// Carrega de `config.data_path`, ou começa vazio se o arquivo não existir.
    pub fn load(config: EngineConfig) -> anyhow::Result<Self> {
        match persistence::load(&config.data_path)? {
            Some(state) => Ok(Self::from_state(config, state)),
            None => Ok(Self::new(config)),
        }
    }

    /// Grava o estado em `config.data_path`.
    pub fn save(&self) -> anyhow::Result<()> {
        persistence::save(&self.config.data_path, &self.to_state())
    }

    pub fn to_state(&self) -> PersistedState {
        PersistedState::new(self.registry.clone(), self.graph.clone(), self.iteration.state().clone())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn graph(&self) -> &RelationshipGraph {
        &self.graph
    }

    pub fn iteration(&self) -> &IterationController {
        &self.iteration
    }

    pub fn iteration_mut(&mut self) -> &mut IterationController {
        &mut self.iteration
    }

    pub fn calculus(&self) -> Calculus<'_> {
        Calculus::new(&self.registry, &self.graph)
    }

    /// Motivo da suspensão, se houver.
    pub fn halted(&self) -> Option<&str> {
        self.halted.as_deref()
    }

    pub fn version(&self) -> StateVersion {
        StateVersion {
            registry: self.registry.revision(),
            graph: self.graph.revision(),
        }
    }

    fn ensure_writable(&self) -> Result<()> {
        match &self.halted {
            Some(reason) => Err(Error::Halted(reason.clone())),
            None => Ok(()),
        }
    }

    /// Tenta adicionar um primitivo.
    ///
    /// Violações voltam dentro do relatório (`Ok`). `Err` só para motor
    /// suspenso ou falha no próprio commit, e nesse caso o estado não muda.
    pub fn propose(&mut self, candidate: &Candidate) -> Result<ValidationReport> {
        self.ensure_writable()?;
        let mut report = Validator::new(&self.registry, &self.graph, &self.config.validation).validate(candidate);
        if !report.advisories.is_empty() {
            tracing::info!(
                candidate = %report.candidate,
                advisories = ?report.advisories,
                "Engine: avaliação qualitativa recebida"
            );
        }

        if !report.passed() {
            self.iteration.record_proposal(false);
            tracing::info!(
                candidate = %report.candidate,
                failed = ?report.failed_checks(),
                violations = ?report.explanations(),
                "Engine: candidato rejeitado"
            );
            return Ok(report);
        }

        match self.commit(candidate) {
            Ok(commit) => {
                self.iteration.record_proposal(true);
                tracing::info!(
                    candidate = %report.candidate,
                    prime = commit.prime,
                    edges = commit.edges_added,
                    version = %self.version(),
                    "Engine: primitivo aceito"
                );
                report.commit = Some(commit);
                Ok(report)
            }
            Err(e) => {
                self.iteration.record_proposal(false);
                tracing::warn!(candidate = %report.candidate, error = %e, "Engine: commit abortado");
                Err(e)
            }
        }
    }

    /// Registro e arestas num clone; só troca o estado se tudo der certo.
    fn commit(&mut self, candidate: &Candidate) -> Result<Commit> {
        let mut registry = self.registry.clone();
        let mut graph = self.graph.clone();

        let prime = registry.next_prime();
        let id = registry.register(candidate, prime, self.iteration.iteration())?.id;

        let mut edges_added = 0;
        let hints = [
            (RelationKind::Presupposes, &candidate.presupposes),
            (RelationKind::ContrastsWith, &candidate.contrasts_with),
            (RelationKind::ComposesWell, &candidate.composes_well),
        ];
        for (kind, hints) in hints {
            for hint in hints {
                let target = registry.resolve(&hint.label)?.id;
                if graph.add(&registry, kind, id, target, &hint.justification)? {
                    edges_added += 1;
                }
            }
        }

        self.registry = registry;
        self.graph = graph;
        Ok(Commit {
            id,
            prime,
            edges_added,
        })
    }

    /// Aresta avulsa entre dois primitivos registrados, por label.
    ///
    /// Retorna `Ok(false)` se a aresta já existia.
    ///
    /// # Erros
    ///
    /// - [`Error::UnknownPrimitive`] para label inexistente
    /// - [`Error::ContrastViolation`] se um contraste compartilhar exemplos ostensivos
    /// - [`Error::ReflexiveContrast`] e [`Error::Cycle`] vindos do grafo
    pub fn add_relationship(
        &mut self,
        kind: RelationKind,
        source: &str,
        target: &str,
        justification: &str,
    ) -> Result<bool> {
        self.ensure_writable()?;
        let left = self.registry.resolve(source)?;
        let right = self.registry.resolve(target)?;

        if kind == RelationKind::ContrastsWith && left.id != right.id {
            let shared = shared_examples(&left.definition.ostensive, &right.definition.ostensive);
            if !shared.is_empty() {
                return Err(Error::ContrastViolation {
                    left: left.label.clone(),
                    right: right.label.clone(),
                    shared,
                });
            }
        }

        let (source_id, target_id) = (left.id, right.id);
        let added = self
            .graph
            .add(&self.registry, kind, source_id, target_id, justification)?;
        if added {
            tracing::info!(kind = %kind, source, target, "Engine: relação adicionada");
        }
        Ok(added)
    }

    /// Decodifica uma expressão de conceito.
    ///
    /// Aceita a forma simbólica (`existence AND not(identity)`) e a numérica
    /// (`30`, `30/7`). Fatores desconhecidos voltam na decomposição, não como erro.
    pub fn decompose_query(&self, expression: &str) -> Result<Decomposition> {
        let calculus = self.calculus();
        let concept = calculus.evaluate(&parse_expression(expression)?)?;
        Ok(calculus.decompose(&concept))
    }

    pub fn coverage_report(&self, benchmarks: &[Benchmark]) -> CoverageReport {
        CoverageTester::new(&self.registry, &self.graph, &self.config.coverage).test(benchmarks)
    }

    /// Como [`coverage_report`](Self::coverage_report), interrompível entre benchmarks.
    pub fn coverage_report_until<F>(&self, benchmarks: &[Benchmark], interrupt: F) -> CoverageReport
    where
        F: FnMut(usize) -> bool,
    {
        CoverageTester::new(&self.registry, &self.graph, &self.config.coverage).test_until(benchmarks, interrupt)
    }

    /// Deprecia um primitivo. O primo continua reservado.
    pub fn deprecate(&mut self, label: &str) -> Result<()> {
        self.ensure_writable()?;
        let primitive = self.registry.resolve(label)?;
        let id = primitive.id;
        let dependents: Vec<String> = self
            .graph
            .dependents(id)
            .into_iter()
            .filter_map(|d| self.registry.get(d).ok())
            .filter(|p| p.is_active())
            .map(|p| p.label.clone())
            .collect();
        if !dependents.is_empty() {
            tracing::warn!(label, ?dependents, "Engine: depreciando primitivo ainda pressuposto");
        }
        self.registry.deprecate(id)
    }

    /// Passada de consolidação.
    ///
    /// - primitivos em contraste com exemplos em comum viram `Contested`
    /// - `Recent` sem problemas há `stabilization_iterations` viram `Stable`
    /// - dependentes de primitivos depreciados ficam marcados como revisados
    ///
    /// Uma violação de invariante suspende o motor e devolve [`Error::Corrupted`].
    pub fn consolidate(&mut self, iteration: u32) -> Result<ConsolidationSummary> {
        self.ensure_writable()?;
        let report = audit(&self.registry, &self.graph);
        if report.is_corrupted() {
            let reason = report.fatal.join("; ");
            self.halted = Some(reason.clone());
            return Err(Error::Corrupted(reason));
        }

        let contested = report.contested();
        let window = self.config.consolidation.stabilization_iterations;
        let plan: Vec<(PrimitiveId, String, PrimitiveStatus)> = self
            .registry
            .active()
            .filter_map(|p| {
                if contested.contains(&p.id) {
                    (p.status != PrimitiveStatus::Contested).then(|| (p.id, p.label.clone(), PrimitiveStatus::Contested))
                } else if p.status == PrimitiveStatus::Recent && iteration.saturating_sub(p.added_iteration) >= window {
                    Some((p.id, p.label.clone(), PrimitiveStatus::Stable))
                } else {
                    None
                }
            })
            .collect();

        let mut summary = ConsolidationSummary {
            contested: Vec::new(),
            stabilized: Vec::new(),
            warnings: report.warnings(),
            domains: report.domains.clone(),
        };
        for (id, label, status) in plan {
            self.registry.set_status(id, status, iteration)?;
            match status {
                PrimitiveStatus::Contested => summary.contested.push(label),
                _ => summary.stabilized.push(label),
            }
        }
        for (source, _) in &report.deprecated_dependencies {
            if let Some(id) = self.registry.find_by_label(source).map(|p| p.id) {
                self.registry.mark_reviewed(id, iteration)?;
            }
        }

        tracing::info!(
            iteration,
            contested = summary.contested.len(),
            stabilized = summary.stabilized.len(),
            warnings = summary.warnings.len(),
            balance = summary.domains.balance,
            "Engine: consolidação concluída"
        );
        Ok(summary)
    }
}

/// Acesso compartilhado com commits serializados.
///
/// Clonar é barato (`Arc`). Um commit por vez; [`propose_at`](Self::propose_at)
/// rejeita escritas baseadas numa versão já ultrapassada.
#[derive(Clone, Debug)]
pub struct SharedEngine {
    inner: Arc<Mutex<Engine>>,
}

impl SharedEngine {
    pub fn new(engine: Engine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Engine> {
        self.inner.lock()
    }

    pub fn version(&self) -> StateVersion {
        self.inner.lock().version()
    }

    pub fn propose(&self, candidate: &Candidate) -> Result<ValidationReport> {
        self.inner.lock().propose(candidate)
    }

    /// Propõe só se o estado ainda estiver na versão `expected`.
    pub fn propose_at(&self, expected: StateVersion, candidate: &Candidate) -> Result<ValidationReport> {
        let mut engine = self.inner.lock();
        let actual = engine.version();
        if actual != expected {
            tracing::debug!(%expected, %actual, "Engine: snapshot desatualizado");
            return Err(Error::StaleSnapshot {
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
        engine.propose(candidate)
    }
}
