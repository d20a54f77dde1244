//! # Alocador de Primos
//!
//! Cada primitivo recebe um número primo exclusivo, atribuído uma única vez
//! e nunca reciclado, nem quando o primitivo é depreciado. É isso que
//! mantém comparáveis produtos calculados em momentos diferentes.
//!
//! ```text
//! usados = {}          → 2
//! usados = {2, 3}      → 5
//! usados = {2, 3, 7}   → 11   (5 nunca é "devolvido")
//! ```

/// Retorna o menor primo estritamente maior que `max(used)` e fora de `used`.
///
/// Com `used` vazio, retorna 2. Função pura e determinística: o mesmo
/// conjunto sempre produz o mesmo primo, o que garante alocação idêntica
/// após um restart.
pub fn next_prime<'a, I>(used: I) -> u64
where
    I: IntoIterator<Item = &'a u64>,
{
    let used: Vec<u64> = used.into_iter().copied().collect();
    let Some(max) = used.iter().copied().max() else {
        return 2;
    };
    let mut candidate = max + 1;
    while !is_prime(candidate) || used.contains(&candidate) {
        candidate += 1;
    }
    candidate
}

/// Teste de primalidade por divisão (6k ± 1).
///
/// Os primos do alfabeto são pequenos (poucos milhares de primitivos),
/// então a divisão por tentativa é suficiente.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    let mut i = 5u64;
    while i.saturating_mul(i) <= n {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_starts_at_two() {
        assert_eq!(next_prime(&[] as &[u64]), 2);
    }

    #[test]
    fn follows_the_largest_used_prime() {
        assert_eq!(next_prime(&[2u64, 3]), 5);
        assert_eq!(next_prime(&[2u64, 3, 7]), 11);
        assert_eq!(next_prime(&[13u64]), 17);
    }

    /// Lacunas abaixo do máximo nunca são reaproveitadas.
    #[test]
    fn never_fills_gaps() {
        assert_eq!(next_prime(&[2u64, 11]), 13);
    }

    #[test]
    fn sequential_allocation_is_strictly_increasing() {
        let mut used: Vec<u64> = Vec::new();
        for _ in 0..50 {
            let p = next_prime(&used);
            if let Some(last) = used.last() {
                assert!(p > *last);
            }
            assert!(is_prime(p));
            used.push(p);
        }
        assert_eq!(used[..6], [2, 3, 5, 7, 11, 13]);
    }

    #[test]
    fn primality() {
        assert!(!is_prime(0));
        assert!(!is_prime(1));
        assert!(is_prime(2));
        assert!(!is_prime(9));
        assert!(!is_prime(25));
        assert!(is_prime(97));
        assert!(is_prime(7919));
    }
}
