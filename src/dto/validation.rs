//! Validation helpers for DTOs.

use chrono_tz::Tz;
use validator::ValidationError;

/// Validates that a timezone is a known IANA name such as `Europe/Paris`.
pub fn validate_timezone(timezone: &str) -> Result<(), ValidationError> {
    if timezone.parse::<Tz>().is_err() {
        let mut err = ValidationError::new("timezone_unknown");
        err.message = Some(format!("Unknown timezone `{timezone}`").into());
        return Err(err);
    }
    Ok(())
}

/// Validates a music service track id: 1 to 64 ASCII alphanumeric characters.
///
/// ```ignore
/// validate_track_id("4uLU6hMCjMI75M1A2tKUQC") // Ok
/// validate_track_id("spotify:track:4uLU6h")   // Err - full URI instead of an id
/// validate_track_id("")                       // Err - empty
/// ```
pub fn validate_track_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > 64 {
        let mut err = ValidationError::new("track_id_length");
        err.message = Some(
            format!(
                "Track ID must be between 1 and 64 characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut err = ValidationError::new("track_id_format");
        err.message = Some("Track ID must contain only ASCII letters and digits".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a display name is not only whitespace.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("name_blank");
        err.message = Some("Name must not be blank".into());
        return Err(err);
    }
    Ok(())
}
