//! # Calculus: Operações Sobre o Registro
//!
//! [`Calculus`] é uma visão somente-leitura sobre o [`Registry`] e o
//! [`RelationshipGraph`]. Liga labels a primos e primos de volta a labels;
//! nenhuma operação altera o registro.
//!
//! ## Fatoração
//!
//! `decompose` primeiro divide pelos primos do registro em ordem crescente
//! (caminho rápido, já que são conhecidos e pequenos). O resíduo, se houver,
//! passa por divisão por tentativa genérica até
//! [`TRIAL_DIVISION_LIMIT`]; o que sobrar é reportado como um único fator
//! desconhecido. Fatores desconhecidos nunca são descartados: eles indicam
//! divergência entre o registro e quem produziu o número.

use std::fmt;

use num_bigint::BigUint;
use num_traits::{One, Zero};

use super::concept::{smallest_factor, Concept, TRIAL_DIVISION_LIMIT};
use super::expression::{ConceptExpr, Literal};
use crate::core::{Primitive, Registry, RelationshipGraph};
use crate::error::{Error, Result};

/// Trilha em que um fator foi encontrado.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Track {
    Positive,
    Negative,
}

/// Fator que não corresponde a nenhum primo registrado.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownFactor {
    pub factor: BigUint,
    pub track: Track,
}

impl fmt::Display for UnknownFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.track {
            Track::Positive => write!(f, "{}", self.factor),
            Track::Negative => write!(f, "¬{}", self.factor),
        }
    }
}

/// Resultado de [`Calculus::decompose`]. Labels em ordem crescente de primo.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Decomposition {
    pub asserted: Vec<String>,
    pub negated: Vec<String>,
    pub unknown_factors: Vec<UnknownFactor>,
    /// Labels decodificados que pertencem a primitivos depreciados.
    pub deprecated: Vec<String>,
}

impl Decomposition {
    pub fn is_clean(&self) -> bool {
        self.unknown_factors.is_empty()
    }
}

/// Motivo pelo qual um conceito não é bem-formado.
#[derive(Clone, Debug, PartialEq)]
pub enum Malformation {
    /// Primo afirmado e negado.
    Clash { prime: u64, label: Option<String> },
    /// Dois primitivos afirmados que contrastam entre si.
    Contrasting { left: String, right: String },
}

impl fmt::Display for Malformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Malformation::Clash { prime, label } => {
                write!(f, "primo {} ({}) afirmado e negado", prime, label.as_deref().unwrap_or("?"))
            }
            Malformation::Contrasting { left, right } => {
                write!(f, "'{}' e '{}' contrastam mas são afirmados juntos", left, right)
            }
        }
    }
}

/// Cálculo de composição sobre um snapshot do registro.
#[derive(Clone, Copy)]
pub struct Calculus<'a> {
    registry: &'a Registry,
    graph: &'a RelationshipGraph,
}

impl<'a> Calculus<'a> {
    pub fn new(registry: &'a Registry, graph: &'a RelationshipGraph) -> Self {
        Self { registry, graph }
    }

    /// Conceito que afirma apenas o primitivo `label`.
    ///
    /// Primitivos depreciados continuam resolvíveis: o primo é preservado
    /// justamente para que composições antigas sigam decodificáveis.
    pub fn primitive_concept(&self, label: &str) -> Result<Concept> {
        let primitive = self.registry.resolve(label)?;
        Ok(Concept::from_prime(primitive.prime))
    }

    /// Conjunção de `concepts`, verificando a consistência a cada passo.
    ///
    /// # Erros
    ///
    /// [`Error::Inconsistency`] com o primo e o label do primitivo afirmado
    /// e negado ao mesmo tempo.
    pub fn compose(&self, concepts: &[Concept]) -> Result<Concept> {
        let mut acc = Concept::unit();
        for concept in concepts {
            concept.check_consistency().map_err(|e| self.label_clash(e))?;
            acc = acc.conjoin(concept).map_err(|e| self.label_clash(e))?;
        }
        Ok(acc)
    }

    pub fn negate(&self, concept: &Concept) -> Concept {
        concept.negate()
    }

    fn label_clash(&self, err: Error) -> Error {
        match err {
            Error::Inconsistency { prime, label: None } => Error::Inconsistency {
                prime,
                label: self.registry.find_by_prime(prime).map(|p| p.label.clone()),
            },
            other => other,
        }
    }

    /// Fatora as duas trilhas nos primos do registro.
    pub fn decompose(&self, concept: &Concept) -> Decomposition {
        let mut out = Decomposition::default();
        let (asserted, unknown_pos) = self.factor_track(concept.positive());
        let (negated, unknown_neg) = self.factor_track(concept.negative());

        for p in &asserted {
            out.asserted.push(p.label.clone());
        }
        for p in &negated {
            out.negated.push(p.label.clone());
        }
        for p in asserted.iter().chain(negated.iter()).filter(|p| !p.is_active()) {
            out.deprecated.push(p.label.clone());
        }
        out.unknown_factors.extend(unknown_pos.into_iter().map(|factor| UnknownFactor {
            factor,
            track: Track::Positive,
        }));
        out.unknown_factors.extend(unknown_neg.into_iter().map(|factor| UnknownFactor {
            factor,
            track: Track::Negative,
        }));

        if !out.unknown_factors.is_empty() {
            let factors: Vec<String> = out.unknown_factors.iter().map(ToString::to_string).collect();
            tracing::warn!(concept = %concept, ?factors, "Calculus: fatores sem primitivo registrado");
        }
        out
    }

    /// Divide `value` pelos primos do registro e, depois, por tentativa.
    fn factor_track(&self, value: &BigUint) -> (Vec<&'a Primitive>, Vec<BigUint>) {
        let mut residual = value.clone();
        let mut known = Vec::new();
        let mut primitives: Vec<&'a Primitive> = self.registry.all().iter().collect();
        primitives.sort_by_key(|p| p.prime);

        for p in primitives {
            if residual.is_one() {
                break;
            }
            let prime = BigUint::from(p.prime);
            if (&residual % &prime).is_zero() {
                while (&residual % &prime).is_zero() {
                    residual /= &prime;
                }
                known.push(p);
            }
        }

        let mut unknown = Vec::new();
        while !residual.is_one() {
            match smallest_factor(&residual, TRIAL_DIVISION_LIMIT) {
                Some(f) => {
                    let factor = BigUint::from(f);
                    while (&residual % &factor).is_zero() {
                        residual /= &factor;
                    }
                    unknown.push(factor);
                }
                None => {
                    unknown.push(residual.clone());
                    break;
                }
            }
        }
        (known, unknown)
    }

    /// `true` se o primo de `label` divide a trilha positiva.
    /// Labels não registrados nunca estão contidos.
    pub fn contains(&self, concept: &Concept, label: &str) -> bool {
        self.registry
            .find_by_label(label)
            .is_some_and(|p| concept.asserts(p.prime))
    }

    pub fn is_subtype(&self, specific: &Concept, general: &Concept) -> bool {
        specific.is_subtype_of(general)
    }

    /// Todos os motivos pelos quais `concept` não é bem-formado (vazio se for).
    pub fn well_formedness(&self, concept: &Concept) -> Vec<Malformation> {
        let mut problems = Vec::new();
        if let Err(Error::Inconsistency { prime, label }) = concept.check_consistency().map_err(|e| self.label_clash(e))
        {
            problems.push(Malformation::Clash { prime, label });
        }
        for (a, b) in self.graph.contrast_pairs() {
            let (Ok(left), Ok(right)) = (self.registry.get(a), self.registry.get(b)) else {
                continue;
            };
            if concept.asserts(left.prime) && concept.asserts(right.prime) {
                problems.push(Malformation::Contrasting {
                    left: left.label.clone(),
                    right: right.label.clone(),
                });
            }
        }
        problems
    }

    pub fn is_well_formed(&self, concept: &Concept) -> bool {
        self.well_formedness(concept).is_empty()
    }

    /// Componentes presentes em todos os conceitos (gcd trilha a trilha).
    pub fn common_components(&self, concepts: &[Concept]) -> Concept {
        let mut iter = concepts.iter();
        let Some(first) = iter.next() else {
            return Concept::unit();
        };
        iter.fold(first.clone(), |acc, c| acc.common(c))
    }

    /// Forma legível: `existence AND identity AND not(difference)`.
    pub fn render(&self, concept: &Concept) -> String {
        let d = self.decompose(concept);
        let mut terms: Vec<String> = d.asserted.clone();
        terms.extend(d.negated.iter().map(|l| format!("not({l})")));
        for u in &d.unknown_factors {
            terms.push(match u.track {
                Track::Positive => u.factor.to_string(),
                Track::Negative => format!("not({})", u.factor),
            });
        }
        if terms.is_empty() {
            return "⊤".to_string();
        }
        terms.join(" AND ")
    }

    /// Forma de chamada, usada para citar composições em relatórios:
    /// `compose(primitive_concept("a"), negate(primitive_concept("b")))`.
    pub fn call_expression(&self, concept: &Concept) -> String {
        let d = self.decompose(concept);
        let mut args: Vec<String> = d
            .asserted
            .iter()
            .map(|l| format!("primitive_concept(\"{l}\")"))
            .collect();
        args.extend(
            d.negated
                .iter()
                .map(|l| format!("negate(primitive_concept(\"{l}\"))")),
        );
        format!("compose({})", args.join(", "))
    }

    /// Avalia uma expressão já analisada.
    ///
    /// Literais simbólicos precisam estar registrados; a forma numérica é
    /// aceita como está (e é onde fatores desconhecidos aparecem).
    pub fn evaluate(&self, expr: &ConceptExpr) -> Result<Concept> {
        match expr {
            ConceptExpr::Numeric { positive, negative } => {
                Concept::from_parts(positive.clone(), negative.clone()).map_err(|e| self.label_clash(e))
            }
            ConceptExpr::Symbolic(literals) => {
                let concepts = literals
                    .iter()
                    .map(|Literal { label, negated }| {
                        let c = self.primitive_concept(label)?;
                        Ok(if *negated { c.negate() } else { c })
                    })
                    .collect::<Result<Vec<_>>>()?;
                self.compose(&concepts)
            }
        }
    }

    /// Conceito a partir de listas de labels afirmados e negados.
    pub fn literals(&self, asserted: &[&str], negated: &[&str]) -> Result<Concept> {
        let mut concepts = Vec::with_capacity(asserted.len() + negated.len());
        for label in asserted {
            concepts.push(self.primitive_concept(label)?);
        }
        for label in negated {
            concepts.push(self.primitive_concept(label)?.negate());
        }
        self.compose(&concepts)
    }

    /// Comprimento de descrição: quantos literais o conceito usa,
    /// contando fatores desconhecidos.
    pub fn description_length(&self, concept: &Concept) -> usize {
        let d = self.decompose(concept);
        d.asserted.len() + d.negated.len() + d.unknown_factors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Candidate, Domain, RelationKind};
    use proptest::prelude::*;

    const LABELS: [&str; 6] = ["existence", "identity", "difference", "time", "space", "cause"];

    fn fixture() -> (Registry, RelationshipGraph) {
        let mut registry = Registry::new();
        for label in LABELS {
            let prime = registry.next_prime();
            registry
                .register(&Candidate::new(label, Domain::Being, "..."), prime, 0)
                .unwrap();
        }
        (registry, RelationshipGraph::new())
    }

    /// existence→2, identity→3: a composição é 6/1 e decompõe nos dois labels.
    #[test]
    fn existence_and_identity_compose_to_six() {
        let (registry, graph) = fixture();
        let calc = Calculus::new(&registry, &graph);
        let e = calc.primitive_concept("existence").unwrap();
        let i = calc.primitive_concept("identity").unwrap();
        let composed = calc.compose(&[e, i]).unwrap();
        assert_eq!(composed.positive(), &BigUint::from(6u32));
        assert_eq!(composed.negative(), &BigUint::one());

        let d = calc.decompose(&composed);
        assert_eq!(d.asserted, vec!["existence", "identity"]);
        assert!(d.negated.is_empty());
        assert!(d.is_clean());
    }

    #[test]
    fn unknown_label_is_rejected() {
        let (registry, graph) = fixture();
        let calc = Calculus::new(&registry, &graph);
        assert_eq!(
            calc.primitive_concept("phlogiston").unwrap_err(),
            Error::UnknownPrimitive {
                reference: "phlogiston".into()
            }
        );
    }

    /// O erro de inconsistência identifica o primitivo pelo label.
    #[test]
    fn clash_is_reported_by_label() {
        let (registry, graph) = fixture();
        let calc = Calculus::new(&registry, &graph);
        let i = calc.primitive_concept("identity").unwrap();
        let err = calc.compose(&[i.clone(), calc.negate(&i)]).unwrap_err();
        assert_eq!(
            err,
            Error::Inconsistency {
                prime: 3,
                label: Some("identity".into())
            }
        );
    }

    /// Fatores fora do registro são reportados, nunca descartados.
    #[test]
    fn residual_factors_surface_as_unknown() {
        let (registry, graph) = fixture();
        let calc = Calculus::new(&registry, &graph);
        // 2 * 3 * 17 * 19 / 5 * 23
        let concept = Concept::from_parts(BigUint::from(1938u32), BigUint::from(115u32)).unwrap();
        let d = calc.decompose(&concept);
        assert_eq!(d.asserted, vec!["existence", "identity"]);
        assert_eq!(d.negated, vec!["difference"]);
        assert_eq!(
            d.unknown_factors,
            vec![
                UnknownFactor { factor: BigUint::from(17u32), track: Track::Positive },
                UnknownFactor { factor: BigUint::from(19u32), track: Track::Positive },
                UnknownFactor { factor: BigUint::from(23u32), track: Track::Negative },
            ]
        );
        assert_eq!(calc.render(&concept), "existence AND identity AND not(difference) AND 17 AND 19 AND not(23)");
    }

    #[test]
    fn deprecated_primitives_still_decode() {
        let (mut registry, graph) = fixture();
        let id = registry.find_by_label("time").unwrap().id;
        registry.deprecate(id).unwrap();
        let calc = Calculus::new(&registry, &graph);
        let d = calc.decompose(&calc.primitive_concept("time").unwrap());
        assert_eq!(d.asserted, vec!["time"]);
        assert_eq!(d.deprecated, vec!["time"]);
    }

    #[test]
    fn containment_and_subtype() {
        let (registry, graph) = fixture();
        let calc = Calculus::new(&registry, &graph);
        let specific = calc.literals(&["existence", "time"], &["difference"]).unwrap();
        let general = calc.literals(&["existence"], &["difference"]).unwrap();
        assert!(calc.contains(&specific, "time"));
        assert!(!calc.contains(&specific, "difference"));
        assert!(!calc.contains(&specific, "unregistered"));
        assert!(calc.is_subtype(&specific, &general));
        assert!(!calc.is_subtype(&general, &specific));
        // sem a exclusão, o específico não é subtipo
        let loose = calc.literals(&["existence", "time"], &[]).unwrap();
        assert!(!calc.is_subtype(&loose, &general));
    }

    #[test]
    fn contrasting_primitives_are_not_well_formed_together() {
        let (registry, mut graph) = fixture();
        let e = registry.find_by_label("existence").unwrap().id;
        let d = registry.find_by_label("difference").unwrap().id;
        graph.add(&registry, RelationKind::ContrastsWith, e, d, "").unwrap();
        let calc = Calculus::new(&registry, &graph);

        let bad = calc.literals(&["existence", "difference"], &[]).unwrap();
        assert_eq!(
            calc.well_formedness(&bad),
            vec![Malformation::Contrasting {
                left: "existence".into(),
                right: "difference".into()
            }]
        );
        let fine = calc.literals(&["existence"], &["difference"]).unwrap();
        assert!(calc.is_well_formed(&fine));
    }

    #[test]
    fn common_components_keep_shared_literals() {
        let (registry, graph) = fixture();
        let calc = Calculus::new(&registry, &graph);
        let a = calc.literals(&["existence", "time"], &["cause"]).unwrap();
        let b = calc.literals(&["existence", "space"], &["cause"]).unwrap();
        let common = calc.common_components(&[a, b]);
        assert_eq!(calc.render(&common), "existence AND not(cause)");
        assert_eq!(calc.common_components(&[]), Concept::unit());
    }

    #[test]
    fn call_expression_cites_negation() {
        let (registry, graph) = fixture();
        let calc = Calculus::new(&registry, &graph);
        let c = calc.literals(&[], &["identity"]).unwrap();
        assert_eq!(calc.call_expression(&c), r#"compose(negate(primitive_concept("identity")))"#);
        assert_eq!(calc.description_length(&c), 1);
    }

    fn arb_literals() -> impl Strategy<Value = Vec<(usize, bool)>> {
        proptest::collection::vec((0..LABELS.len(), any::<bool>()), 0..4)
    }

    fn build(calc: &Calculus<'_>, lits: &[(usize, bool)]) -> Option<Concept> {
        let concepts: Vec<Concept> = lits
            .iter()
            .map(|&(i, neg)| {
                let c = calc.primitive_concept(LABELS[i]).unwrap();
                if neg { c.negate() } else { c }
            })
            .collect();
        calc.compose(&concepts).ok()
    }

    proptest! {
        #[test]
        fn every_primitive_decomposes_to_itself(i in 0..LABELS.len()) {
            let (registry, graph) = fixture();
            let calc = Calculus::new(&registry, &graph);
            let d = calc.decompose(&calc.primitive_concept(LABELS[i]).unwrap());
            prop_assert_eq!(d.asserted, vec![LABELS[i].to_string()]);
            prop_assert!(d.negated.is_empty());
        }

        #[test]
        fn composition_commutes_and_unions_labels(a in arb_literals(), b in arb_literals()) {
            let (registry, graph) = fixture();
            let calc = Calculus::new(&registry, &graph);
            let (Some(ca), Some(cb)) = (build(&calc, &a), build(&calc, &b)) else {
                return Ok(());
            };
            let ab = calc.compose(&[ca.clone(), cb.clone()]);
            let ba = calc.compose(&[cb.clone(), ca.clone()]);
            prop_assert_eq!(ab.is_ok(), ba.is_ok());
            if let (Ok(ab), Ok(ba)) = (ab, ba) {
                prop_assert_eq!(&ab, &ba);
                let mut expected: Vec<String> = calc.decompose(&ca).asserted;
                for l in calc.decompose(&cb).asserted {
                    if !expected.contains(&l) {
                        expected.push(l);
                    }
                }
                let mut got = calc.decompose(&ab).asserted;
                expected.sort();
                got.sort();
                prop_assert_eq!(got, expected);
            }
        }
    }
}
