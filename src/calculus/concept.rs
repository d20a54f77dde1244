//! # Concept: Produto de Primos em Duas Trilhas
//!
//! Um [`Concept`] é uma conjunção de primitivos codificada em dois inteiros
//! de precisão arbitrária:
//!
//! - `positive`: produto dos primos dos primitivos afirmados
//! - `negative`: produto dos primos dos primitivos explicitamente excluídos
//!
//! A invariante de consistência é `gcd(positive, negative) == 1`: nenhum
//! primitivo pode ser afirmado e negado ao mesmo tempo. Ela é verificada em
//! cada passo de composição, não só no commit.
//!
//! ```text
//! existence=2, identity=3, difference=5
//!
//! existence ∧ identity        → 6 / 1
//! existence ∧ ¬difference     → 2 / 5
//! negate(2 / 5)               → 5 / 2
//! (2 / 5) ∧ (5 / 1)           → InconsistencyError (primo 5)
//! ```
//!
//! A conjunção usa `lcm` em cada trilha: os produtos continuam livres de
//! quadrados, `A ∧ A == A`, e para entradas disjuntas o resultado coincide
//! com a multiplicação.

use std::fmt;

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};

use crate::error::{Error, Result};

/// Limite da divisão por tentativa genérica (fora dos primos do registro).
pub const TRIAL_DIVISION_LIMIT: u64 = 1_000_000;

/// Conceito composto. Efêmero: construído sob demanda e descartado.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Concept {
    positive: BigUint,
    negative: BigUint,
}

impl Default for Concept {
    fn default() -> Self {
        Self::unit()
    }
}

impl Concept {
    /// Conjunção vazia (`1 / 1`): neutra para [`conjoin`](Concept::conjoin).
    pub fn unit() -> Self {
        Self {
            positive: BigUint::one(),
            negative: BigUint::one(),
        }
    }

    /// Conceito que afirma um único primo.
    pub fn from_prime(prime: u64) -> Self {
        Self {
            positive: BigUint::from(prime),
            negative: BigUint::one(),
        }
    }

    /// Constrói a partir das duas trilhas, validando a invariante.
    ///
    /// # Erros
    ///
    /// - [`Error::InvalidExpression`] se alguma trilha for zero
    /// - [`Error::Inconsistency`] se as trilhas compartilharem um fator
    pub fn from_parts(positive: BigUint, negative: BigUint) -> Result<Self> {
        if positive.is_zero() || negative.is_zero() {
            return Err(Error::InvalidExpression("trilha com valor zero".into()));
        }
        let concept = Self { positive, negative };
        concept.check_consistency()?;
        Ok(concept)
    }

    pub fn positive(&self) -> &BigUint {
        &self.positive
    }

    pub fn negative(&self) -> &BigUint {
        &self.negative
    }

    /// `true` para a conjunção vazia.
    pub fn is_trivial(&self) -> bool {
        self.positive.is_one() && self.negative.is_one()
    }

    pub fn is_consistent(&self) -> bool {
        self.positive.gcd(&self.negative).is_one()
    }

    /// Falha com o menor fator compartilhado entre as trilhas.
    pub fn check_consistency(&self) -> Result<()> {
        let shared = self.positive.gcd(&self.negative);
        if shared.is_one() {
            return Ok(());
        }
        let prime = smallest_factor(&shared, TRIAL_DIVISION_LIMIT)
            .or_else(|| shared.to_u64())
            .unwrap_or(0);
        Err(Error::Inconsistency { prime, label: None })
    }

    /// Conjunção de dois conceitos, trilha a trilha.
    ///
    /// Cada trilha é o `lcm` das duas, então a decomposição de
    /// `a.conjoin(b)` afirma exatamente a união dos primos afirmados por `a`
    /// e por `b` (e nega a união dos negados). Um primo comum aos dois entra
    /// uma vez só: `a.conjoin(a) == a` e os produtos continuam livres de
    /// quadrados.
    ///
    /// # Erros
    ///
    /// [`Error::Inconsistency`] se o resultado afirmar e negar o mesmo primo.
    pub fn conjoin(&self, other: &Concept) -> Result<Concept> {
        let composed = Concept {
            positive: self.positive.lcm(&other.positive),
            negative: self.negative.lcm(&other.negative),
        };
        composed.check_consistency()?;
        Ok(composed)
    }

    /// Troca as trilhas. `negate(negate(a)) == a`.
    pub fn negate(&self) -> Concept {
        Concept {
            positive: self.negative.clone(),
            negative: self.positive.clone(),
        }
    }

    /// `true` se `prime` divide a trilha positiva.
    pub fn asserts(&self, prime: u64) -> bool {
        prime > 1 && (&self.positive % BigUint::from(prime)).is_zero()
    }

    /// `true` se `prime` divide a trilha negativa.
    pub fn excludes(&self, prime: u64) -> bool {
        prime > 1 && (&self.negative % BigUint::from(prime)).is_zero()
    }

    /// `self` afirma tudo que `general` afirma e exclui tudo que `general` exclui.
    pub fn is_subtype_of(&self, general: &Concept) -> bool {
        (&self.positive % &general.positive).is_zero() && (&self.negative % &general.negative).is_zero()
    }

    /// Componentes comuns: gcd de cada trilha.
    pub fn common(&self, other: &Concept) -> Concept {
        Concept {
            positive: self.positive.gcd(&other.positive),
            negative: self.negative.gcd(&other.negative),
        }
    }
}

/// Forma numérica `positive/negative`; omite `/1`.
impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative.is_one() {
            write!(f, "{}", self.positive)
        } else {
            write!(f, "{}/{}", self.positive, self.negative)
        }
    }
}

/// Menor fator primo de `n` por divisão por tentativa até `limit`.
pub(crate) fn smallest_factor(n: &BigUint, limit: u64) -> Option<u64> {
    if n <= &BigUint::one() {
        return None;
    }
    let mut d = 2u64;
    while d <= limit {
        let divisor = BigUint::from(d);
        if &divisor * &divisor > *n {
            return n.to_u64();
        }
        if (n % &divisor).is_zero() {
            return Some(d);
        }
        d += if d == 2 { 1 } else { 2 };
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn c(positive: u64, negative: u64) -> Concept {
        Concept::from_parts(BigUint::from(positive), BigUint::from(negative)).unwrap()
    }

    #[test]
    fn conjunction_multiplies_disjoint_tracks() {
        let composed = c(2, 1).conjoin(&c(3, 5)).unwrap();
        assert_eq!(composed, c(6, 5));
        assert_eq!(composed.to_string(), "6/5");
    }

    /// Primo compartilhado entra uma vez: 2·3 com 2·5 dá 2·3·5, não 60.
    #[test]
    fn conjunction_unions_shared_primes() {
        let composed = c(6, 1).conjoin(&c(10, 7)).unwrap();
        assert_eq!(composed, c(30, 7));
        for p in [2, 3, 5] {
            assert!(composed.asserts(p));
        }
        assert!(composed.excludes(7));
    }

    #[test]
    fn conjunction_is_idempotent() {
        let a = c(6, 5);
        assert_eq!(a.conjoin(&a).unwrap(), a);
    }

    /// O erro carrega o primo conflitante.
    #[test]
    fn clash_reports_the_offending_prime() {
        let err = c(2, 5).conjoin(&c(5, 1)).unwrap_err();
        assert_eq!(err, Error::Inconsistency { prime: 5, label: None });
    }

    #[test]
    fn from_parts_rejects_zero_and_shared_factors() {
        assert!(matches!(
            Concept::from_parts(BigUint::zero(), BigUint::one()),
            Err(Error::InvalidExpression(_))
        ));
        assert!(matches!(
            Concept::from_parts(BigUint::from(6u32), BigUint::from(3u32)),
            Err(Error::Inconsistency { prime: 3, .. })
        ));
    }

    #[test]
    fn subtype_requires_both_tracks() {
        let general = c(2, 5);
        assert!(c(6, 5).is_subtype_of(&general));
        assert!(c(6, 35).is_subtype_of(&general));
        assert!(!c(6, 1).is_subtype_of(&general));
        assert!(!c(3, 5).is_subtype_of(&general));
    }

    #[test]
    fn smallest_factor_by_trial_division() {
        assert_eq!(smallest_factor(&BigUint::from(35u32), 100), Some(5));
        assert_eq!(smallest_factor(&BigUint::from(97u32), 100), Some(97));
        assert_eq!(smallest_factor(&BigUint::one(), 100), None);
        // 1009 * 1013 com limite baixo demais
        assert_eq!(smallest_factor(&BigUint::from(1_022_117u64), 100), None);
    }

    fn primes() -> Vec<u64> {
        vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]
    }

    /// Conceito consistente sobre os primeiros primos: cada primo cai em
    /// uma das trilhas ou em nenhuma.
    fn arb_concept() -> impl Strategy<Value = Concept> {
        proptest::collection::vec(0u8..3, 10).prop_map(|tracks| {
            let mut positive = BigUint::one();
            let mut negative = BigUint::one();
            for (p, t) in primes().into_iter().zip(tracks) {
                match t {
                    1 => positive *= p,
                    2 => negative *= p,
                    _ => {}
                }
            }
            Concept { positive, negative }
        })
    }

    proptest! {
        #[test]
        fn double_negation_is_identity(a in arb_concept()) {
            prop_assert_eq!(a.negate().negate(), a);
        }

        #[test]
        fn conjunction_commutes(a in arb_concept(), b in arb_concept()) {
            prop_assert_eq!(a.conjoin(&b).ok(), b.conjoin(&a).ok());
        }

        #[test]
        fn concept_with_its_negation_is_inconsistent(a in arb_concept()) {
            prop_assume!(!a.is_trivial());
            let result = a.conjoin(&a.negate());
            prop_assert!(matches!(result, Err(Error::Inconsistency { .. })), "{:?}", result);
        }

        #[test]
        fn conjunction_is_a_subtype_of_each_input(a in arb_concept(), b in arb_concept()) {
            if let Ok(ab) = a.conjoin(&b) {
                prop_assert!(ab.is_subtype_of(&a));
                prop_assert!(ab.is_subtype_of(&b));
            }
        }
    }
}
