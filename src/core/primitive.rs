//! # Primitive: Conceito Irredutível do Alfabeto
//!
//! Um [`Primitive`] é um conceito aceito como **irredutível**: não pode ser
//! expresso como composição de outros. Cada primitivo carrega um número
//! primo exclusivo, e é esse primo que o cálculo de composição usa para
//! multiplicar, dividir e fatorar conceitos.
//!
//! ## Ciclo de Vida
//!
//! ```text
//! Candidate ──(validação PASSED)──▶ Recent ──(consolidação)──▶ Stable
//!                                      │                          │
//!                                      └──────▶ Contested ◀───────┘
//!                                                   │
//!                         qualquer estado ──▶ Deprecated (o primo é preservado)
//! ```
//!
//! Primitivos nunca são removidos fisicamente: a depreciação é só um
//! status, para que composições antigas continuem decodificáveis.
//!
//! ## Campos Principais
//!
//! | Campo | Tipo | Descrição |
//! |-------|------|-----------|
//! | `id` | UUID | Identificador estável |
//! | `label` | String | Nome legível (ex: "existence") |
//! | `prime` | u64 | Primo exclusivo, atribuído uma vez |
//! | `status` | [PrimitiveStatus] | Estado no ciclo de vida |
//! | `confidence` | f64 | Confiança em [0, 1] |
//! | `definition` | [Definition] | Texto informal + exemplos ostensivos/negativos |
//!
//! Um [`Candidate`] é a proposta ainda não aceita: mesmos dados, sem `id`,
//! `prime` e `status`, mais as relações que o proponente declara.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

/// Alias de tipo para o identificador de um [Primitive].
pub type PrimitiveId = Uuid;

/// Domínio conceitual do primitivo, de um conjunto fixo.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Being,
    Space,
    Time,
    Causation,
    Mind,
    Matter,
    Quantity,
    Quality,
    Relation,
    Ethics,
    Emotion,
    Action,
    Knowledge,
    Social,
    Language,
}

impl Domain {
    /// Todos os domínios, na ordem canônica.
    pub const ALL: [Domain; 15] = [
        Domain::Being,
        Domain::Space,
        Domain::Time,
        Domain::Causation,
        Domain::Mind,
        Domain::Matter,
        Domain::Quantity,
        Domain::Quality,
        Domain::Relation,
        Domain::Ethics,
        Domain::Emotion,
        Domain::Action,
        Domain::Knowledge,
        Domain::Social,
        Domain::Language,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Domain::Being => "being",
            Domain::Space => "space",
            Domain::Time => "time",
            Domain::Causation => "causation",
            Domain::Mind => "mind",
            Domain::Matter => "matter",
            Domain::Quantity => "quantity",
            Domain::Quality => "quality",
            Domain::Relation => "relation",
            Domain::Ethics => "ethics",
            Domain::Emotion => "emotion",
            Domain::Action => "action",
            Domain::Knowledge => "knowledge",
            Domain::Social => "social",
            Domain::Language => "language",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Estado do primitivo no alfabeto.
///
/// - **Stable**: sobreviveu a consolidações sem problemas
/// - **Recent**: recém-aceito, ainda em observação
/// - **Contested**: envolvido em algum conflito detectado na consolidação
/// - **Deprecated**: retirado do alfabeto ativo; o primo continua reservado
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveStatus {
    Stable,
    Recent,
    Contested,
    Deprecated,
}

impl PrimitiveStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PrimitiveStatus::Stable => "stable",
            PrimitiveStatus::Recent => "recent",
            PrimitiveStatus::Contested => "contested",
            PrimitiveStatus::Deprecated => "deprecated",
        }
    }
}

/// Definição de um primitivo.
///
/// Os exemplos ostensivos ("isto é um caso de X") e negativos ("isto não
/// é X") são a única parte da definição que o validador compara
/// mecanicamente; o texto informal serve ao leitor humano.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    /// Definição em linguagem natural.
    pub informal: String,
    /// Definição formal opcional (notação livre).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formal: Option<String>,
    /// Exemplos que caem sob o conceito.
    #[serde(default)]
    pub ostensive: Vec<String>,
    /// Exemplos que explicitamente **não** caem sob o conceito.
    #[serde(default)]
    pub negative: Vec<String>,
}

/// Conceito irredutível aceito no alfabeto.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Primitive {
    /// Identificador estável (UUID v4), gerado no registro.
    pub id: PrimitiveId,

    /// Nome legível; a unicidade é verificada sobre a forma normalizada
    /// (ver [`normalize_label`]).
    pub label: String,

    /// Símbolo curto usado em relatórios.
    pub symbol: String,

    pub domain: Domain,

    /// Primo exclusivo: bijeção primitivo↔primo por toda a vida do registro.
    pub prime: u64,

    pub status: PrimitiveStatus,

    /// Confiança na primitividade, sempre em [0, 1].
    pub confidence: f64,

    pub definition: Definition,

    /// Iteração em que o primitivo foi aceito.
    pub added_iteration: u32,

    /// Última iteração em que uma consolidação revisou o primitivo.
    pub last_reviewed: u32,

    /// Incrementada a cada mutação auditada.
    pub version: u32,

    pub created_at: DateTime<Utc>,
}

impl Primitive {
    /// Promove um candidato a primitivo com o primo já alocado.
    ///
    /// O primitivo nasce com status `Recent` e `version = 1`.
    pub fn from_candidate(candidate: &Candidate, prime: u64, iteration: u32) -> Self {
        let symbol = candidate
            .symbol
            .clone()
            .unwrap_or_else(|| candidate.label.trim().to_uppercase());
        Self {
            id: Uuid::new_v4(),
            label: candidate.label.trim().to_string(),
            symbol,
            domain: candidate.domain,
            prime,
            status: PrimitiveStatus::Recent,
            confidence: candidate.confidence.clamp(0.0, 1.0),
            definition: candidate.definition.clone(),
            added_iteration: iteration,
            last_reviewed: iteration,
            version: 1,
            created_at: Utc::now(),
        }
    }

    /// `true` enquanto o primitivo não estiver depreciado.
    pub fn is_active(&self) -> bool {
        self.status != PrimitiveStatus::Deprecated
    }
}

/// Relação declarada por um candidato, referenciando outro primitivo pelo label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelationHint {
    pub label: String,
    #[serde(default)]
    pub justification: String,
}

impl RelationHint {
    pub fn new(label: impl Into<String>, justification: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            justification: justification.into(),
        }
    }
}

/// Gravidade dos casos-limite apontados pelo avaliador externo.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

/// Alcance cultural do conceito, segundo o avaliador externo.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CulturalScope {
    #[default]
    Universal,
    NearUniversal,
    CulturallyBound,
}

/// Avaliação qualitativa (casos-limite, variação cultural, parcimônia).
///
/// Puramente consultiva: entra no relatório e no log, mas nunca reprova
/// um candidato.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    #[serde(default)]
    pub edge_cases: Severity,
    #[serde(default)]
    pub cultural_scope: CulturalScope,
    #[serde(default = "default_true")]
    pub parsimony_necessary: bool,
    #[serde(default)]
    pub notes: String,
}

fn default_true() -> bool {
    true
}

impl Default for Assessment {
    fn default() -> Self {
        Self {
            edge_cases: Severity::Low,
            cultural_scope: CulturalScope::Universal,
            parsimony_necessary: true,
            notes: String::new(),
        }
    }
}

impl Assessment {
    /// Observações que merecem atenção humana.
    pub fn concerns(&self) -> Vec<String> {
        let mut concerns = Vec::new();
        if self.edge_cases == Severity::High {
            concerns.push("casos-limite de gravidade alta".to_string());
        }
        if self.cultural_scope == CulturalScope::CulturallyBound {
            concerns.push("conceito culturalmente restrito".to_string());
        }
        if !self.parsimony_necessary {
            concerns.push("parcimônia questionada".to_string());
        }
        concerns
    }
}

/// Primitivo proposto, ainda não aceito.
///
/// Produzido por um colaborador externo e consumido pelo validador.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub label: String,
    #[serde(default)]
    pub symbol: Option<String>,
    pub domain: Domain,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    pub definition: Definition,
    #[serde(default)]
    pub presupposes: Vec<RelationHint>,
    #[serde(default)]
    pub contrasts_with: Vec<RelationHint>,
    #[serde(default)]
    pub composes_well: Vec<RelationHint>,
    #[serde(default)]
    pub assessment: Option<Assessment>,
}

fn default_confidence() -> f64 {
    0.5
}

impl Candidate {
    /// Candidato mínimo: label, domínio e definição informal.
    pub fn new(label: impl Into<String>, domain: Domain, informal: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            symbol: None,
            domain,
            confidence: default_confidence(),
            definition: Definition {
                informal: informal.into(),
                ..Definition::default()
            },
            presupposes: Vec::new(),
            contrasts_with: Vec::new(),
            composes_well: Vec::new(),
            assessment: None,
        }
    }

    pub fn with_examples<S: Into<String>>(
        mut self,
        ostensive: impl IntoIterator<Item = S>,
        negative: impl IntoIterator<Item = S>,
    ) -> Self {
        self.definition.ostensive = ostensive.into_iter().map(Into::into).collect();
        self.definition.negative = negative.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn presupposing(mut self, label: impl Into<String>, justification: impl Into<String>) -> Self {
        self.presupposes.push(RelationHint::new(label, justification));
        self
    }

    pub fn contrasting(mut self, label: impl Into<String>, justification: impl Into<String>) -> Self {
        self.contrasts_with.push(RelationHint::new(label, justification));
        self
    }

    pub fn composing_well(mut self, label: impl Into<String>, justification: impl Into<String>) -> Self {
        self.composes_well.push(RelationHint::new(label, justification));
        self
    }

    pub fn with_assessment(mut self, assessment: Assessment) -> Self {
        self.assessment = Some(assessment);
        self
    }
}

/// Forma normalizada de um label: NFC, sem espaços nas bordas, espaços
/// internos colapsados e em minúsculas.
///
/// ```text
/// "  Existence " → "existence"
/// "Causal   Power" → "causal power"
/// ```
pub fn normalize_label(label: &str) -> String {
    let nfc: String = label.nfc().collect();
    nfc.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
