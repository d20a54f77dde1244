//! # alphabetum: inspeção do alfabeto persistido
//!
//! Carrega a configuração e o estado, informa integridade e cobertura e,
//! se houver argumentos, decodifica-os como uma expressão de conceito.
//!
//! ```bash
//! # resumo do estado em data/alphabet.json
//! cargo run
//!
//! # decodificar uma expressão
//! cargo run -- "existence AND not(identity)"
//! cargo run -- 30/7
//!
//! # outra configuração e logs detalhados
//! ALPHABET_CONFIG=outro.toml RUST_LOG=debug cargo run
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use alphabetum::config::EngineConfig;
use alphabetum::coverage::load_benchmarks;
use alphabetum::engine::Engine;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::var_os("ALPHABET_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("alphabet.toml"));
    let config = EngineConfig::load(&config_path)?;
    let engine = Engine::load(config).context("Falha ao carregar o estado do alfabeto")?;

    let state = engine.iteration().state();
    tracing::info!(
        primitives = engine.registry().len(),
        active = engine.registry().active().count(),
        edges = engine.graph().len(),
        iteration = state.iteration,
        phase = %state.phase,
        version = %engine.version(),
        "Alfabeto carregado"
    );
    if let Some(reason) = engine.halted() {
        tracing::error!(reason, "Commits suspensos até reparo manual do arquivo");
    }

    if let Some(path) = &engine.config().benchmarks_path {
        let benchmarks = load_benchmarks(path)?;
        let report = engine.coverage_report(&benchmarks);
        let gaps: Vec<&str> = report.gaps.iter().map(|g| g.label.as_str()).collect();
        tracing::info!(
            ratio = report.ratio,
            expressible = report.expressible,
            partial = report.partial,
            inexpressible = report.inexpressible,
            ?gaps,
            "Cobertura"
        );
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        let expression = args.join(" ");
        let d = engine.decompose_query(&expression)?;
        println!("afirmados: {}", d.asserted.join(", "));
        println!("negados:   {}", d.negated.join(", "));
        if !d.unknown_factors.is_empty() {
            let unknown: Vec<String> = d.unknown_factors.iter().map(ToString::to_string).collect();
            println!("desconhecidos: {}", unknown.join(", "));
        }
        if !d.deprecated.is_empty() {
            println!("depreciados: {}", d.deprecated.join(", "));
        }
    }
    Ok(())
}
