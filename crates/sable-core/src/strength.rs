//! Heuristic password-strength estimation
//!
//! Additive 0-100 score plus remediation hints and a human-readable
//! crack-time estimate. This is a UX heuristic, not a cryptographic
//! guarantee: a high score must never be treated as a security proof.

use serde::{Deserialize, Serialize};

/// Assumed guesses per second for the crack-time estimate
const GUESSES_PER_SECOND: f64 = 1_000_000_000.0;

/// Strength estimate for a password
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrengthReport {
    /// 0-100, additive heuristic
    pub score: u8,
    /// Remediation hints, in scoring order
    pub feedback: Vec<String>,
    /// Human-readable average-case crack time
    pub crack_time: String,
}

/// Score a password
///
/// Scoring: +25 for length >= 12 (else +15 for length >= 8), +15 each for
/// lowercase, uppercase and digit presence, +20 for a symbol, +10 if no
/// run of 3+ identical consecutive characters. Capped at 100. Each missed
/// bonus contributes a hint.
pub fn score(password: &str) -> StrengthReport {
    let mut score: u32 = 0;
    let mut feedback = Vec::new();

    if password.chars().count() >= 12 {
        score += 25;
    } else if password.chars().count() >= 8 {
        score += 15;
    } else {
        feedback.push("Use at least 12 characters".to_string());
    }

    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_ascii_alphanumeric());

    if has_lowercase {
        score += 15;
    } else {
        feedback.push("Add lowercase letters".to_string());
    }
    if has_uppercase {
        score += 15;
    } else {
        feedback.push("Add uppercase letters".to_string());
    }
    if has_digit {
        score += 15;
    } else {
        feedback.push("Add numbers".to_string());
    }
    if has_symbol {
        score += 20;
    } else {
        feedback.push("Add symbols".to_string());
    }

    if has_repeated_run(password) {
        feedback.push("Avoid repeated characters".to_string());
    } else {
        score += 10;
    }

    StrengthReport {
        score: score.min(100) as u8,
        feedback,
        crack_time: crack_time(password),
    }
}

/// True if the password contains a run of 3+ identical consecutive chars
fn has_repeated_run(password: &str) -> bool {
    let chars: Vec<char> = password.chars().collect();
    chars.windows(3).any(|w| w[0] == w[1] && w[1] == w[2])
}

/// Effective charset size: 26/26/10/32 per present class, summed
fn estimate_charset(password: &str) -> u32 {
    let mut charset = 0;
    if password.chars().any(|c| c.is_ascii_lowercase()) {
        charset += 26;
    }
    if password.chars().any(|c| c.is_ascii_uppercase()) {
        charset += 26;
    }
    if password.chars().any(|c| c.is_ascii_digit()) {
        charset += 10;
    }
    if password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        charset += 32;
    }
    charset
}

/// Average-case crack time at [`GUESSES_PER_SECOND`], bucketed
fn crack_time(password: &str) -> String {
    let charset = f64::from(estimate_charset(password));
    let combinations = charset.powf(password.chars().count() as f64);
    let seconds = combinations / 2.0 / GUESSES_PER_SECOND;

    if seconds < 60.0 {
        "Less than a minute".to_string()
    } else if seconds < 3_600.0 {
        format!("{} minutes", (seconds / 60.0).round())
    } else if seconds < 86_400.0 {
        format!("{} hours", (seconds / 3_600.0).round())
    } else if seconds < 31_536_000.0 {
        format!("{} days", (seconds / 86_400.0).round())
    } else if seconds < 31_536_000_000.0 {
        format!("{} years", (seconds / 31_536_000.0).round())
    } else {
        "Centuries".to_string()
    }
}
