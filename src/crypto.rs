use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

/// Generates a cryptographically secure API key.
///
/// The key is formatted as `ak-{40_random_alphanumeric_chars}`, drawn from
/// the thread-local CSPRNG.
pub fn generate_api_key() -> String {
    let suffix: String = thread_rng().sample_iter(&Alphanumeric).take(40).map(char::from).collect();
    format!("ak-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_prefixed_and_unique() {
        let a = generate_api_key();
        let b = generate_api_key();
        assert!(a.starts_with("ak-"));
        assert_eq!(a.len(), 43);
        assert_ne!(a, b);
    }
}
