//! # Máquina de Estados de Iteração
//!
//! Decide **quando** cada componente roda; não guarda invariantes de domínio.
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────┐
//!   ▼                                                              │
//! EXPANSION ──▶ CONSOLIDATION ──▶ COMPOSITION ──▶ META_REFLECTION ─┘
//!  (N ciclos)     (N ciclos)        (N ciclos)      (N ciclos)
//! ```
//!
//! Cada fase dura o número de ciclos configurado; uma fase com zero ciclos
//! é pulada (EXPANSION sempre roda ao menos um). A cada
//! `meta_reflection_interval` ciclos completos, META_REFLECTION é forçada
//! mesmo que esteja configurada com zero ciclos.
//!
//! Voltar a EXPANSION fecha um ciclo completo e incrementa `iteration`.
//!
//! ## Parada
//!
//! | Motivo | Condição |
//! |--------|----------|
//! | `CoverageReached` | última cobertura ≥ `coverage_threshold` |
//! | `Stable` | `stability_window` ciclos completos seguidos sem primitivo novo |
//! | `MaxIterations` | `iteration ≥ max_iterations` |
//! | `Concluded` | o refletor respondeu `Conclude` |
//!
//! ## Histórico
//!
//! Cada ciclo completo fechado deixa um [`IterationSnapshot`] em
//! `IterationState::history`: tamanho do alfabeto, propostas do ciclo,
//! cobertura e distribuição por domínio. [`Convergence`] resume essa série
//! para a meta-reflexão (crescimento por iteração, tendência de aceitação,
//! retorno decrescente).
//!
//! O controlador não enxerga o registro: quem o dirige informa o censo do
//! alfabeto com [`IterationController::observe_alphabet`] antes de avançar.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{IterationConfig, StoppingConfig};
use crate::core::Domain;

/// Fase do ciclo de construção.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Expansion,
    Consolidation,
    Composition,
    MetaReflection,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Expansion => "EXPANSION",
            Phase::Consolidation => "CONSOLIDATION",
            Phase::Composition => "COMPOSITION",
            Phase::MetaReflection => "META_REFLECTION",
        }
    }

    fn next(self) -> Phase {
        match self {
            Phase::Expansion => Phase::Consolidation,
            Phase::Consolidation => Phase::Composition,
            Phase::Composition => Phase::MetaReflection,
            Phase::MetaReflection => Phase::Expansion,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Por que o processo parou.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    CoverageReached { ratio: f64 },
    Stable { cycles: u32 },
    MaxIterations { limit: u32 },
    Concluded { rationale: String },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::CoverageReached { ratio } => write!(f, "cobertura atingida ({:.1}%)", ratio * 100.0),
            StopReason::Stable { cycles } => write!(f, "{cycles} ciclos sem primitivo novo"),
            StopReason::MaxIterations { limit } => write!(f, "limite de {limit} iterações"),
            StopReason::Concluded { rationale } => write!(f, "concluído pela reflexão: {rationale}"),
        }
    }
}

/// Totais do processo, persistidos junto com as fases.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunCounters {
    pub proposed: u64,
    pub accepted: u64,
    pub rejected: u64,
}

impl RunCounters {
    pub fn acceptance_rate(&self) -> Option<f64> {
        (self.proposed > 0).then(|| self.accepted as f64 / self.proposed as f64)
    }
}

/// Tamanho do alfabeto visto pela última vez.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Census {
    pub active: usize,
    pub domain_counts: BTreeMap<Domain, usize>,
}

/// Foto do processo no fechamento de um ciclo completo.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IterationSnapshot {
    /// Índice do ciclo fechado (o primeiro é 0).
    pub iteration: u32,
    pub closed_at: DateTime<Utc>,
    pub active_primitives: usize,
    /// Primitivos aceitos durante o ciclo.
    pub added: u32,
    /// Propostas do ciclo, não do processo inteiro.
    pub counters: RunCounters,
    pub coverage: Option<f64>,
    pub domain_counts: BTreeMap<Domain, usize>,
}

/// Quantos ciclos recentes entram na comparação com os anteriores.
pub const CONVERGENCE_WINDOW: usize = 3;

/// Resumo de convergência calculado sobre o histórico.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Convergence {
    pub cycles: usize,
    /// Primitivos aceitos por ciclo, em ordem.
    pub growth: Vec<u32>,
    pub mean_growth: f64,
    /// Média dos últimos [`CONVERGENCE_WINDOW`] ciclos.
    pub recent_growth: f64,
    /// Aceitação recente menos aceitação anterior; `None` sem dados dos dois lados.
    pub acceptance_trend: Option<f64>,
    /// Variação de cobertura entre o primeiro e o último ciclo medidos.
    pub coverage_delta: Option<f64>,
    /// Os ciclos recentes cresceram menos que os anteriores.
    pub diminishing_returns: bool,
    /// A janela recente inteira passou sem primitivo novo.
    pub saturated: bool,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

impl Convergence {
    /// `None` enquanto nenhum ciclo foi fechado.
    pub fn from_history(history: &[IterationSnapshot]) -> Option<Self> {
        if history.is_empty() {
            return None;
        }
        let split = history.len().saturating_sub(CONVERGENCE_WINDOW);
        let (earlier, recent) = history.split_at(split);

        let growth: Vec<u32> = history.iter().map(|s| s.added).collect();
        let mean_growth = mean(growth.iter().map(|&g| f64::from(g))).unwrap_or(0.0);
        let recent_growth = mean(recent.iter().map(|s| f64::from(s.added))).unwrap_or(0.0);
        let earlier_growth = mean(earlier.iter().map(|s| f64::from(s.added)));

        let rate = |slice: &[IterationSnapshot]| mean(slice.iter().filter_map(|s| s.counters.acceptance_rate()));
        let acceptance_trend = match (rate(earlier), rate(recent)) {
            (Some(before), Some(after)) => Some(after - before),
            _ => None,
        };

        let mut measured = history.iter().filter_map(|s| s.coverage);
        let coverage_delta = measured.next().and_then(|first| measured.last().map(|last| last - first));

        Some(Self {
            cycles: history.len(),
            mean_growth,
            recent_growth,
            acceptance_trend,
            coverage_delta,
            diminishing_returns: earlier_growth.is_some_and(|before| recent_growth < before),
            saturated: recent.len() == CONVERGENCE_WINDOW && recent.iter().all(|s| s.added == 0),
            growth,
        })
    }
}

/// Estado persistido da máquina. Basta para retomar após um restart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IterationState {
    /// Ciclos completos já fechados.
    pub iteration: u32,
    pub phase: Phase,
    pub cycle_in_phase: u32,
    #[serde(default)]
    pub added_this_cycle: u32,
    #[serde(default)]
    pub cycles_without_addition: u32,
    #[serde(default)]
    pub counters: RunCounters,
    #[serde(default)]
    pub last_coverage: Option<f64>,
    /// Lacunas entregues ao proponente na próxima expansão.
    #[serde(default)]
    pub gaps: Vec<String>,
    /// Domínios priorizados pela última reflexão.
    #[serde(default)]
    pub focus_domains: Vec<Domain>,
    #[serde(default)]
    pub stop: Option<StopReason>,
    /// Propostas do ciclo corrente; zeradas ao fechá-lo.
    #[serde(default)]
    pub cycle_counters: RunCounters,
    #[serde(default)]
    pub census: Census,
    #[serde(default)]
    pub history: Vec<IterationSnapshot>,
    pub last_updated: DateTime<Utc>,
}

impl Default for IterationState {
    fn default() -> Self {
        Self {
            iteration: 0,
            phase: Phase::Expansion,
            cycle_in_phase: 0,
            added_this_cycle: 0,
            cycles_without_addition: 0,
            counters: RunCounters::default(),
            last_coverage: None,
            gaps: Vec::new(),
            focus_domains: Vec::new(),
            stop: None,
            cycle_counters: RunCounters::default(),
            census: Census::default(),
            history: Vec::new(),
            last_updated: Utc::now(),
        }
    }
}

/// Controlador de fases.
#[derive(Clone, Debug)]
pub struct IterationController {
    cycles: IterationConfig,
    stopping: StoppingConfig,
    state: IterationState,
}

impl IterationController {
    pub fn new(cycles: IterationConfig, stopping: StoppingConfig) -> Self {
        Self::resume(cycles, stopping, IterationState::default())
    }

    /// Retoma a partir de um estado persistido.
    pub fn resume(cycles: IterationConfig, stopping: StoppingConfig, state: IterationState) -> Self {
        Self {
            cycles,
            stopping,
            state,
        }
    }

    pub fn state(&self) -> &IterationState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn iteration(&self) -> u32 {
        self.state.iteration
    }

    /// Ciclos configurados para `phase`, considerando o forçamento da reflexão.
    fn cycles_for(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Expansion => self.cycles.expansion_cycles.max(1),
            Phase::Consolidation => self.cycles.consolidation_cycles,
            Phase::Composition => self.cycles.composition_cycles,
            Phase::MetaReflection => {
                if self.reflection_forced() {
                    self.cycles.meta_reflection_cycles.max(1)
                } else {
                    self.cycles.meta_reflection_cycles
                }
            }
        }
    }

    /// O ciclo corrente (ainda não fechado) é múltiplo do intervalo?
    pub fn reflection_forced(&self) -> bool {
        let interval = self.cycles.meta_reflection_interval;
        interval > 0 && (self.state.iteration + 1) % interval == 0
    }

    /// Registra o resultado de uma proposta.
    pub fn record_proposal(&mut self, accepted: bool) {
        for counters in [&mut self.state.counters, &mut self.state.cycle_counters] {
            counters.proposed += 1;
            if accepted {
                counters.accepted += 1;
            } else {
                counters.rejected += 1;
            }
        }
        if accepted {
            self.state.added_this_cycle += 1;
        }
    }

    /// Atualiza o censo usado no próximo snapshot.
    pub fn observe_alphabet(&mut self, active: usize, domain_counts: BTreeMap<Domain, usize>) {
        self.state.census = Census { active, domain_counts };
    }

    pub fn history(&self) -> &[IterationSnapshot] {
        &self.state.history
    }

    pub fn convergence(&self) -> Option<Convergence> {
        Convergence::from_history(&self.state.history)
    }

    /// Registra a última cobertura e as lacunas para o proponente.
    pub fn record_coverage(&mut self, ratio: f64, gaps: Vec<String>) {
        self.state.last_coverage = Some(ratio);
        self.state.gaps = gaps;
    }

    pub fn set_focus(&mut self, domains: Vec<Domain>) {
        self.state.focus_domains = domains;
    }

    /// O refletor decidiu encerrar.
    pub fn conclude(&mut self, rationale: impl Into<String>) {
        let reason = StopReason::Concluded {
            rationale: rationale.into(),
        };
        tracing::info!(reason = %reason, "Iteration: processo concluído");
        self.state.stop = Some(reason);
    }

    /// Fecha um ciclo da fase atual e avança, se a fase acabou.
    ///
    /// Retorna a fase em que a máquina fica.
    pub fn advance(&mut self) -> Phase {
        self.state.cycle_in_phase += 1;
        self.state.last_updated = Utc::now();
        if self.state.cycle_in_phase < self.cycles_for(self.state.phase) {
            return self.state.phase;
        }

        self.state.cycle_in_phase = 0;
        let mut next = self.state.phase.next();
        loop {
            if next == Phase::Expansion {
                self.close_full_cycle();
                break;
            }
            if self.cycles_for(next) > 0 {
                break;
            }
            next = next.next();
        }
        tracing::info!(
            from = %self.state.phase,
            to = %next,
            iteration = self.state.iteration,
            "Iteration: transição de fase"
        );
        self.state.phase = next;
        next
    }

    fn close_full_cycle(&mut self) {
        let snapshot = IterationSnapshot {
            iteration: self.state.iteration,
            closed_at: Utc::now(),
            active_primitives: self.state.census.active,
            added: self.state.added_this_cycle,
            counters: std::mem::take(&mut self.state.cycle_counters),
            coverage: self.state.last_coverage,
            domain_counts: self.state.census.domain_counts.clone(),
        };
        tracing::debug!(
            iteration = snapshot.iteration,
            active = snapshot.active_primitives,
            added = snapshot.added,
            "Iteration: ciclo registrado no histórico"
        );
        self.state.history.push(snapshot);

        if self.state.added_this_cycle == 0 {
            self.state.cycles_without_addition += 1;
        } else {
            self.state.cycles_without_addition = 0;
        }
        self.state.added_this_cycle = 0;
        self.state.iteration += 1;
    }

    /// Avalia as condições de parada; a primeira satisfeita fica gravada.
    pub fn should_stop(&mut self) -> Option<&StopReason> {
        if self.state.stop.is_none() {
            self.state.stop = self.check_stop();
            if let Some(reason) = &self.state.stop {
                tracing::info!(reason = %reason, iteration = self.state.iteration, "Iteration: condição de parada");
            }
        }
        self.state.stop.as_ref()
    }

    fn check_stop(&self) -> Option<StopReason> {
        if let Some(ratio) = self.state.last_coverage {
            if ratio >= self.stopping.coverage_threshold {
                return Some(StopReason::CoverageReached { ratio });
            }
        }
        if self.stopping.stability_window > 0 && self.state.cycles_without_addition >= self.stopping.stability_window {
            return Some(StopReason::Stable {
                cycles: self.state.cycles_without_addition,
            });
        }
        if self.state.iteration >= self.stopping.max_iterations {
            return Some(StopReason::MaxIterations {
                limit: self.stopping.max_iterations,
            });
        }
        None
    }
}
