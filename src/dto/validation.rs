//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates a word-set word: at least two ASCII letters once trimmed.
///
/// Case is irrelevant, words are uppercased before storage.
///
/// # Examples
///
/// ```ignore
/// validate_word("cat")   // Ok
/// validate_word(" Emu ") // Ok
/// validate_word("a")     // Err - too short
/// validate_word("ice-cream") // Err - not a letter
/// ```
pub fn validate_word(word: &str) -> Result<(), ValidationError> {
    let word = word.trim();
    if word.chars().count() < 2 {
        let mut err = ValidationError::new("word_length");
        err.message = Some("Word must contain at least 2 letters".into());
        return Err(err);
    }

    if !word.chars().all(|c| c.is_ascii_alphabetic()) {
        let mut err = ValidationError::new("word_format");
        err.message = Some("Word must contain only ASCII letters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a clue is not blank.
pub fn validate_clue(clue: &str) -> Result<(), ValidationError> {
    if clue.trim().is_empty() {
        let mut err = ValidationError::new("clue_blank");
        err.message = Some("Clue must not be empty".into());
        return Err(err);
    }
    Ok(())
}

/// Validates a cell letter: blank (clears the cell) or a single character.
pub fn validate_letter(letter: &str) -> Result<(), ValidationError> {
    if letter.trim().chars().count() > 1 {
        let mut err = ValidationError::new("letter_length");
        err.message = Some("A cell holds at most one character".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_word_valid() {
        assert!(validate_word("cat").is_ok());
        assert!(validate_word("  EMU ").is_ok());
        assert!(validate_word("ox").is_ok());
    }

    #[test]
    fn test_validate_word_invalid() {
        assert!(validate_word("a").is_err()); // too short
        assert!(validate_word("   ").is_err()); // blank
        assert!(validate_word("ice cream").is_err()); // space
        assert!(validate_word("café").is_err()); // non-ASCII
        assert!(validate_word("r2d2").is_err()); // digits
    }

    #[test]
    fn test_validate_clue() {
        assert!(validate_clue("Feline pet").is_ok());
        assert!(validate_clue("").is_err());
        assert!(validate_clue(" \t").is_err());
    }

    #[test]
    fn test_validate_letter() {
        assert!(validate_letter("A").is_ok());
        assert!(validate_letter("").is_ok());
        assert!(validate_letter(" b ").is_ok());
        assert!(validate_letter("AB").is_err());
    }
}
