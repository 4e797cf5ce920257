//! Small utility functions shared across the fraud scoring platform

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new UUID v4
pub fn generate_id() -> Uuid {
    Uuid::new_v4()
}

/// Get current UTC timestamp
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Numeric helpers used by the rule evaluator when formatting reason strings
pub mod numeric {
    /// Round a float to a fixed number of decimal places
    pub fn round_to_decimal_places(value: f64, places: u32) -> f64 {
        let multiplier = 10_f64.powi(places as i32);
        (value * multiplier).round() / multiplier
    }

    /// Clamp a value between min and max, inclusive
    pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
        if value < min {
            min
        } else if value > max {
            max
        } else {
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_and_clamps() {
        assert_eq!(numeric::round_to_decimal_places(0.8456, 2), 0.85);
        assert_eq!(numeric::clamp(1.5, 0.0, 1.0), 1.0);
        assert_eq!(numeric::clamp(-0.5, 0.0, 1.0), 0.0);
    }
}
