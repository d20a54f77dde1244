//! # Erros do Motor de Composição
//!
//! Todos os tipos de falha do núcleo vivem em um único enum, [`Error`].
//! Falhas de validação de um candidato **não** derrubam o processo: elas
//! chegam ao chamador como violações estruturadas dentro de um
//! [`ValidationReport`](crate::validation::ValidationReport). Só a corrupção
//! do estado persistido ([`Error::Corrupted`]) é fatal, e coloca o motor em
//! modo [`Error::Halted`] até que o arquivo seja reparado manualmente.
//!
//! | Variante | Quando ocorre |
//! |----------|---------------|
//! | `DuplicateLabel` | label normalizado já registrado |
//! | `InvalidLabel` | label vazio depois de normalizado |
//! | `NotFound` | id ausente no registro |
//! | `UnknownPrimitive` | label/id referenciado não existe |
//! | `Cycle` | aresta `presupposes` fecharia um ciclo |
//! | `Inconsistency` | primo afirmado e negado ao mesmo tempo |
//! | `Redundancy` | candidato expressável por composição existente |
//! | `ContrastViolation` | contraste com exemplos ostensivos em comum |
//! | `MissingPresupposition` | pressuposição não registrada |
//! | `InvalidExpression` | texto de consulta que não é uma expressão de conceito |

use thiserror::Error;
use uuid::Uuid;

/// Erro do motor de composição e consistência.
///
/// É `Clone` porque os relatórios de validação carregam os erros como
/// violações: o mesmo valor pode ser registrado em log e devolvido.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("label duplicado: '{label}' já está registrado")]
    DuplicateLabel { label: String },

    #[error("label inválido: '{label}' fica vazio depois de normalizado")]
    InvalidLabel { label: String },

    #[error("primitivo não encontrado: {id}")]
    NotFound { id: Uuid },

    #[error("primitivo desconhecido: '{reference}'")]
    UnknownPrimitive { reference: String },

    #[error("ciclo de pressuposições: {}", path.join(" → "))]
    Cycle { path: Vec<String> },

    #[error("inconsistência: primo {prime} ({}) afirmado e negado", label.as_deref().unwrap_or("?"))]
    Inconsistency { prime: u64, label: Option<String> },

    #[error("'{candidate}' é redundante: expressável como {expression} (confiança {confidence:.2})")]
    Redundancy {
        candidate: String,
        expression: String,
        confidence: f64,
    },

    #[error("contraste violado entre '{left}' e '{right}': exemplos em comum {shared:?}")]
    ContrastViolation {
        left: String,
        right: String,
        shared: Vec<String>,
    },

    #[error("pressuposição ausente: '{candidate}' pressupõe '{missing}', que não está registrado")]
    MissingPresupposition { candidate: String, missing: String },

    #[error("primo {prime} já atribuído ou inválido")]
    PrimeConflict { prime: u64 },

    #[error("'{label}' não pode contrastar consigo mesmo")]
    ReflexiveContrast { label: String },

    #[error("definição circular: '{label}' aparece na própria definição")]
    CircularDefinition { label: String },

    #[error("estado persistido corrompido: {0}")]
    Corrupted(String),

    #[error("commits suspensos até reparo manual: {0}")]
    Halted(String),

    #[error("expressão de conceito inválida: {0}")]
    InvalidExpression(String),

    #[error("snapshot desatualizado: esperado {expected}, atual {actual}")]
    StaleSnapshot { expected: String, actual: String },
}

/// Alias de `Result` do crate.
pub type Result<T> = std::result::Result<T, Error>;
