//! Tracking number generation.

use rand::Rng;

/// Number of hex digits after the carrier prefix.
pub const TRACKING_DIGITS: usize = 16;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Source of candidate tracking numbers.
///
/// Uniqueness is enforced by the store, not the generator; a clash is
/// reported as a conflict and the caller asks for another number.
pub trait TrackingNumberGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// `<prefix>` followed by 16 random uppercase hex digits.
#[derive(Debug, Clone)]
pub struct RandomTrackingNumbers {
    prefix: String,
}

impl RandomTrackingNumbers {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl TrackingNumberGenerator for RandomTrackingNumbers {
    fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        let mut number = String::with_capacity(self.prefix.len() + TRACKING_DIGITS);
        number.push_str(&self.prefix);
        for _ in 0..TRACKING_DIGITS {
            number.push(HEX_DIGITS[rng.gen_range(0..HEX_DIGITS.len())] as char);
        }
        number
    }
}

/// Whether `candidate` is `prefix` followed by exactly 16 uppercase hex digits.
pub fn is_valid_tracking_number(candidate: &str, prefix: &str) -> bool {
    match candidate.strip_prefix(prefix) {
        Some(digits) => {
            digits.len() == TRACKING_DIGITS
                && digits.bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_format() {
        let generator = RandomTrackingNumbers::new("USPS");
        for _ in 0..100 {
            let number = generator.generate();
            assert_eq!(number.len(), 20);
            assert!(is_valid_tracking_number(&number, "USPS"), "bad number {number}");
        }
    }

    #[test]
    fn test_generated_numbers_differ() {
        let generator = RandomTrackingNumbers::new("USPS");
        let numbers: HashSet<String> = (0..1000).map(|_| generator.generate()).collect();
        assert_eq!(numbers.len(), 1000);
    }

    #[test]
    fn test_validation_rejects_malformed() {
        assert!(is_valid_tracking_number("USPS0123456789ABCDEF", "USPS"));
        assert!(!is_valid_tracking_number("USPS0123456789abcdef", "USPS"));
        assert!(!is_valid_tracking_number("USPS0123456789ABCDE", "USPS"));
        assert!(!is_valid_tracking_number("UPS00123456789ABCDEF", "USPS"));
        assert!(!is_valid_tracking_number("USPS0123456789ABCDEG", "USPS"));
    }
}
