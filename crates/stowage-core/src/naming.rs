//! Server-assigned object names
//!
//! Destination names are random and unguessable; the uniqueness constraint
//! on the pending ledger makes a collision a loud caller-visible error
//! rather than a silent overwrite.

use rand::Rng;

const NAME_LEN: usize = 7;
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Random 7-character name from uppercase letters and digits.
pub fn random_name() -> String {
    let mut rng = rand::rng();
    (0..NAME_LEN)
        .map(|_| {
            let idx = rng.random_range(0..ALPHABET.len());
            ALPHABET[idx] as char
        })
        .collect()
}

/// Random destination file name with the given storage suffix,
/// e.g. `K3TZ09Q.jpg`.
pub fn random_file_name(suffix: &str) -> String {
    format!("{}.{}", random_name(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_seven_chars_from_the_alphabet() {
        for _ in 0..100 {
            let name = random_name();
            assert_eq!(name.len(), NAME_LEN);
            assert!(name.bytes().all(|b| ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn file_names_carry_the_suffix() {
        let name = random_file_name("png");
        assert_eq!(name.len(), NAME_LEN + 4);
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn names_do_not_repeat_in_practice() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            assert!(seen.insert(random_name()));
        }
    }
}
