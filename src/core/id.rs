//! Deterministic Identifier Generation
//!
//! Ids are `"{prefix}-{base36}"`, where the suffix encodes one RNG draw scaled
//! to [0, 10^9). Same RNG state and prefix always yields the same id.

use super::rng::Mulberry32;

/// Exclusive upper bound of the numeric id suffix.
pub const ID_SPACE: u32 = 1_000_000_000;

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Draw one value from `rng` and render it as a prefixed base-36 id.
///
/// Advances the RNG exactly once. Collision handling is the caller's job.
pub fn deterministic_id(prefix: &str, rng: &mut Mulberry32) -> String {
    let n = rng.next_below(ID_SPACE);
    format!("{prefix}-{}", to_base36(n))
}

/// Encode an integer in lowercase base 36.
pub fn to_base36(mut n: u32) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let mut buf = Vec::with_capacity(7);
    while n > 0 {
        buf.push(BASE36_DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    buf.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::mulberry32;

    fn is_id_with_prefix(id: &str, prefix: &str) -> bool {
        id.strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('-'))
            .is_some_and(|suffix| {
                !suffix.is_empty()
                    && suffix.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
            })
    }

    #[test]
    fn test_id_format() {
        let mut rng = mulberry32(7);
        for _ in 0..1000 {
            let id = deterministic_id("proposal", &mut rng);
            assert!(is_id_with_prefix(&id, "proposal"), "bad id: {id}");
        }
    }

    #[test]
    fn test_id_known_values() {
        // Regression guard: these ids appear in recorded logs.
        let mut rng = mulberry32(42);
        assert_eq!(deterministic_id("proposal", &mut rng), "proposal-9xvqmf");
        assert_eq!(deterministic_id("proposal", &mut rng), "proposal-7ewf7i");

        let mut rng = mulberry32(1);
        assert_eq!(deterministic_id("debate", &mut rng), "debate-adcdck");
        assert_eq!(deterministic_id("debate", &mut rng), "debate-1mmw9");
    }

    #[test]
    fn test_same_draw_differs_only_in_prefix() {
        let mut rng1 = mulberry32(11);
        let mut rng2 = mulberry32(11);

        let a = deterministic_id("speech", &mut rng1);
        let b = deterministic_id("vote", &mut rng2);

        assert_eq!(a.strip_prefix("speech"), b.strip_prefix("vote"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(ID_SPACE - 1), "gjdgxr");
    }
}
