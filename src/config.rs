//! # Configuração do Motor
//!
//! Lida de um arquivo TOML; todo campo tem default, então um arquivo
//! ausente ou parcial é válido.
//!
//! ```toml
//! data_path = "data/alphabet.json"
//!
//! [validation]
//! redundancy_threshold = 0.8
//!
//! [stopping]
//! coverage_threshold = 0.95
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Configuração completa do motor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Arquivo JSON com o estado persistido.
    pub data_path: PathBuf,

    /// Arquivo JSON opcional com os conceitos de benchmark.
    pub benchmarks_path: Option<PathBuf>,

    pub validation: ValidationConfig,
    pub coverage: CoverageConfig,
    pub iteration: IterationConfig,
    pub stopping: StoppingConfig,
    pub consolidation: ConsolidationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/alphabet.json"),
            benchmarks_path: None,
            validation: ValidationConfig::default(),
            coverage: CoverageConfig::default(),
            iteration: IterationConfig::default(),
            stopping: StoppingConfig::default(),
            consolidation: ConsolidationConfig::default(),
        }
    }
}

/// Parâmetros do validador.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Confiança mínima para declarar um candidato redundante.
    pub redundancy_threshold: f64,
    /// Maior número de primitivos numa composição candidata a equivalente.
    pub max_composition_terms: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            redundancy_threshold: 0.75,
            max_composition_terms: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
    /// Tamanho da lista de lacunas entregue ao proponente.
    pub max_gap_labels: usize,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self { max_gap_labels: 20 }
    }
}

/// Quantos ciclos cada fase dura antes de avançar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IterationConfig {
    pub expansion_cycles: u32,
    pub consolidation_cycles: u32,
    pub composition_cycles: u32,
    /// Zero pula a reflexão no ciclo normal; o intervalo abaixo ainda a força.
    pub meta_reflection_cycles: u32,
    /// A cada N ciclos completos, a reflexão é forçada.
    pub meta_reflection_interval: u32,
}

impl Default for IterationConfig {
    fn default() -> Self {
        Self {
            expansion_cycles: 2,
            consolidation_cycles: 1,
            composition_cycles: 1,
            meta_reflection_cycles: 1,
            meta_reflection_interval: 5,
        }
    }
}

/// Condições de parada do processo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoppingConfig {
    pub coverage_threshold: f64,
    /// Ciclos completos consecutivos sem nenhum primitivo novo.
    pub stability_window: u32,
    pub max_iterations: u32,
}

impl Default for StoppingConfig {
    fn default() -> Self {
        Self {
            coverage_threshold: 0.9,
            stability_window: 10,
            max_iterations: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// Iterações sem problemas até um primitivo `recent` virar `stable`.
    pub stabilization_iterations: u32,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            stabilization_iterations: 3,
        }
    }
}

impl EngineConfig {
    /// Carrega de `path`, ou retorna os defaults se o arquivo não existir.
    ///
    /// # Erros
    ///
    /// Arquivo existente mas ilegível ou com TOML inválido.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "Config: arquivo ausente, usando defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Falha ao ler {}", path.display()))?;
        let config: EngineConfig = toml::from_str(&contents)
            .with_context(|| format!("Falha ao interpretar {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.data_path, PathBuf::from("data/alphabet.json"));
        assert!((config.validation.redundancy_threshold - 0.75).abs() < f64::EPSILON);
        assert_eq!(config.iteration.expansion_cycles, 2);
        assert_eq!(config.iteration.meta_reflection_interval, 5);
        assert_eq!(config.stopping.max_iterations, 100);
        assert_eq!(config.coverage.max_gap_labels, 20);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = EngineConfig::load(Path::new("/nonexistent/alphabet.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    /// Campos omitidos mantêm o default da seção.
    #[test]
    fn partial_file_overrides_only_given_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "data_path = \"/tmp/a.json\"\n[stopping]\ncoverage_threshold = 0.5\n[iteration]\nmeta_reflection_cycles = 0"
        )
        .unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.data_path, PathBuf::from("/tmp/a.json"));
        assert!((config.stopping.coverage_threshold - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.stopping.stability_window, 10);
        assert_eq!(config.iteration.meta_reflection_cycles, 0);
        assert_eq!(config.iteration.expansion_cycles, 2);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[stopping\nmax_iterations = ").unwrap();
        assert!(EngineConfig::load(file.path()).is_err());
    }
}
