//! # Expressões de Conceito
//!
//! Texto aceito por `decompose_query`:
//!
//! | Forma | Exemplo |
//! |-------|---------|
//! | conjunção simbólica | `existence AND not(identity)`, `existence & !identity`, `¬time` |
//! | forma de chamada | `compose(primitive_concept("a"), negate(primitive_concept("b")))` |
//! | numérica | `30`, `30/7` (trilha positiva / trilha negativa) |
//!
//! A forma numérica existe para decodificar produtos armazenados fora do
//! motor; é por ela que fatores desconhecidos aparecem.
//!
//! Labels que contenham a palavra `and` entre espaços são ambíguos na forma
//! `AND`; use `&` ou a forma de chamada nesses casos.

use std::sync::OnceLock;

use num_bigint::BigUint;
use regex::Regex;

use crate::error::{Error, Result};

/// Termo de uma conjunção simbólica.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Literal {
    pub label: String,
    pub negated: bool,
}

/// Expressão já analisada.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConceptExpr {
    Symbolic(Vec<Literal>),
    Numeric { positive: BigUint, negative: BigUint },
}

static NUMERIC: OnceLock<Regex> = OnceLock::new();
static AND_WORD: OnceLock<Regex> = OnceLock::new();
static CALL: OnceLock<Regex> = OnceLock::new();
static PREFIX_NOT: OnceLock<Regex> = OnceLock::new();
static QUOTED: OnceLock<Regex> = OnceLock::new();

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("padrão de regex estático"))
}

/// Analisa uma expressão de conceito.
///
/// # Erros
///
/// [`Error::InvalidExpression`] para texto vazio, parênteses desbalanceados
/// ou termos vazios.
pub fn parse(input: &str) -> Result<ConceptExpr> {
    let text = input.trim();
    if text.is_empty() {
        return Err(Error::InvalidExpression("expressão vazia".into()));
    }

    if let Some(caps) = regex(&NUMERIC, r"^(\d+)\s*(?:/\s*(\d+))?$").captures(text) {
        let positive = parse_number(&caps[1])?;
        let negative = match caps.get(2) {
            Some(m) => parse_number(m.as_str())?,
            None => BigUint::from(1u32),
        };
        return Ok(ConceptExpr::Numeric { positive, negative });
    }

    let body = unwrap_call(text, "compose").unwrap_or(text);
    let normalized = regex(&AND_WORD, r"(?i)\s+and\s+").replace_all(body, " & ");
    let mut literals = Vec::new();
    for term in split_top_level(&normalized)? {
        literals.push(parse_term(term, false)?);
    }
    Ok(ConceptExpr::Symbolic(literals))
}

fn parse_number(digits: &str) -> Result<BigUint> {
    BigUint::parse_bytes(digits.as_bytes(), 10)
        .ok_or_else(|| Error::InvalidExpression(format!("número inválido: {digits}")))
}

/// Conteúdo de `name(...)` quando o texto inteiro é essa chamada.
fn unwrap_call<'t>(text: &'t str, name: &str) -> Option<&'t str> {
    let caps = regex(&CALL, r"^\s*([A-Za-z_]+)\s*\((.*)\)\s*$").captures(text)?;
    if !caps[1].eq_ignore_ascii_case(name) {
        return None;
    }
    let inner = caps.get(2)?;
    // `f(a) & g(b)` casa o padrão mas não é uma única chamada
    balanced(inner.as_str()).then_some(inner.as_str())
}

fn balanced(text: &str) -> bool {
    let mut depth = 0i32;
    for ch in text.chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Separa em `&` e `,` fora de parênteses.
fn split_top_level(text: &str) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            '&' | ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + ch.len_utf8();
            }
            _ => {}
        }
        if depth < 0 {
            return Err(Error::InvalidExpression(format!("parêntese sem par em '{text}'")));
        }
    }
    if depth != 0 {
        return Err(Error::InvalidExpression(format!("parêntese sem par em '{text}'")));
    }
    parts.push(&text[start..]);
    Ok(parts)
}

fn parse_term(term: &str, negated: bool) -> Result<Literal> {
    let term = term.trim();
    if term.is_empty() {
        return Err(Error::InvalidExpression("termo vazio".into()));
    }
    for name in ["not", "negate"] {
        if let Some(inner) = unwrap_call(term, name) {
            return parse_term(inner, !negated);
        }
    }
    if let Some(caps) = regex(&PREFIX_NOT, r"^[!¬]\s*(.+)$").captures(term) {
        let inner = caps.get(1).map_or("", |m| m.as_str());
        return parse_term(inner, !negated);
    }
    if let Some(inner) = unwrap_call(term, "primitive_concept") {
        return parse_term(inner, negated);
    }
    let label = regex(&QUOTED, r#"^"(.*)"$"#)
        .captures(term)
        .and_then(|c| c.get(1))
        .map_or(term, |m| m.as_str())
        .trim();
    if label.is_empty() || label.contains(&['(', ')', '"'][..]) {
        return Err(Error::InvalidExpression(format!("termo inválido: '{term}'")));
    }
    Ok(Literal {
        label: label.to_string(),
        negated,
    })
}
