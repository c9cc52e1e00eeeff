//! Collision-avoiding test data. No reproducibility guarantees.

use rand::Rng;
use rand::seq::SliceRandom;

const ALPHABET: [char; 36] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r',
    's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];

/// Lowercase alphanumeric string of `len` characters.
pub fn string(len: usize) -> String {
    nanoid::nanoid!(len, &ALPHABET)
}

/// Integer in `[min, max]`. Bounds are swapped if given in reverse.
pub fn number(min: i64, max: i64) -> i64 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    rand::thread_rng().gen_range(lo..=hi)
}

pub fn uuid() -> String {
    ::uuid::Uuid::new_v4().to_string()
}

pub fn item<T>(items: &[T]) -> Option<&T> {
    items.choose(&mut rand::thread_rng())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_shape() {
        let s = string(12);
        assert_eq!(s.len(), 12);
        assert!(s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_number_in_range() {
        for _ in 0..200 {
            let n = number(3, 7);
            assert!((3..=7).contains(&n));
        }
        assert_eq!(number(5, 5), 5);
        assert!((1..=9).contains(&number(9, 1)));
    }

    #[test]
    fn test_uuid_shape() {
        let id = uuid();
        assert_eq!(id.len(), 36);
        assert!(::uuid::Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_item() {
        assert_eq!(item::<u8>(&[]), None);
        assert_eq!(item(&[4]), Some(&4));
    }
}
