use rand::{Rng, distributions::Alphanumeric, rngs::OsRng};

use crate::config::CONFIRMATION_CODE_LENGTH;

/// Generates a fresh alphanumeric confirmation code from the OS RNG.
pub fn generate_code() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(CONFIRMATION_CODE_LENGTH as usize)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_have_fixed_length_and_differ() {
        let a = generate_code();
        let b = generate_code();
        assert_eq!(a.len(), CONFIRMATION_CODE_LENGTH as usize);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
