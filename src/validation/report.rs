//! Relatório de uma tentativa de commit.

use std::fmt;

use crate::core::PrimitiveId;
use crate::error::Error;

/// As quatro verificações, na ordem em que rodam.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CheckKind {
    Circularity,
    Redundancy,
    Contrast,
    Presupposition,
}

impl CheckKind {
    pub const ALL: [CheckKind; 4] = [
        CheckKind::Circularity,
        CheckKind::Redundancy,
        CheckKind::Contrast,
        CheckKind::Presupposition,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CheckKind::Circularity => "circularity",
            CheckKind::Redundancy => "redundancy",
            CheckKind::Contrast => "contrast",
            CheckKind::Presupposition => "presupposition",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Estado da tentativa de commit.
///
/// ```text
/// Pending → Checking(Circularity) → Checking(Redundancy)
///         → Checking(Contrast) → Checking(Presupposition) → Passed | Failed
/// ```
///
/// Todas as verificações rodam mesmo depois de uma falha.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationState {
    Pending,
    Checking(CheckKind),
    Passed,
    Failed,
}

/// Resultado de uma verificação.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckOutcome {
    pub check: CheckKind,
    pub violations: Vec<Error>,
    /// Observações que não reprovam (ex.: pressuposição depreciada).
    pub warnings: Vec<String>,
}

impl CheckOutcome {
    pub fn new(check: CheckKind) -> Self {
        Self {
            check,
            violations: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Composição existente equivalente ao candidato.
#[derive(Clone, Debug, PartialEq)]
pub struct RedundancyMatch {
    /// Forma de chamada: `compose(negate(primitive_concept("identity")))`.
    pub expression: String,
    /// Forma legível: `not(identity)`.
    pub rendered: String,
    pub asserted: Vec<String>,
    pub negated: Vec<String>,
    pub confidence: f64,
}

/// Onde o candidato aceito foi parar.
#[derive(Clone, Debug, PartialEq)]
pub struct Commit {
    pub id: PrimitiveId,
    pub prime: u64,
    pub edges_added: usize,
}

/// Resultado de `propose`.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationReport {
    pub candidate: String,
    pub state: ValidationState,
    pub checks: Vec<CheckOutcome>,
    pub redundancy: Option<RedundancyMatch>,
    /// Avaliação qualitativa repassada pelo proponente (nunca reprova).
    pub advisories: Vec<String>,
    /// Preenchido pelo motor quando o commit acontece.
    pub commit: Option<Commit>,
}

impl ValidationReport {
    pub fn pending(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            state: ValidationState::Pending,
            checks: Vec::new(),
            redundancy: None,
            advisories: Vec::new(),
            commit: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.state == ValidationState::Passed
    }

    /// Todas as violações, na ordem das verificações.
    pub fn violations(&self) -> impl Iterator<Item = &Error> {
        self.checks.iter().flat_map(|c| c.violations.iter())
    }

    pub fn failed_checks(&self) -> Vec<CheckKind> {
        self.checks.iter().filter(|c| !c.passed()).map(|c| c.check).collect()
    }

    pub fn outcome(&self, check: CheckKind) -> Option<&CheckOutcome> {
        self.checks.iter().find(|c| c.check == check)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &String> {
        self.checks.iter().flat_map(|c| c.warnings.iter())
    }

    /// Uma linha por violação, para log e para o proponente.
    pub fn explanations(&self) -> Vec<String> {
        self.checks
            .iter()
            .flat_map(|c| c.violations.iter().map(move |v| format!("[{}] {}", c.check, v)))
            .collect()
    }
}
