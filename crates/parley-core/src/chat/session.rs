//! Session identifier handling.

use chrono::Utc;
use parley_types::chat::MAX_SESSION_ID_LEN;
use parley_types::error::ChatError;
use uuid::Uuid;

/// Mint a fresh session id: `session_<uuid-v4>_<unix-millis>`.
pub fn new_session_id() -> String {
    format!(
        "session_{}_{}",
        Uuid::new_v4(),
        Utc::now().timestamp_millis()
    )
}

/// Trim a client-supplied session id.
///
/// Blank ids count as absent. Ids longer than `MAX_SESSION_ID_LEN` are
/// rejected.
pub fn normalize_session_id(raw: Option<&str>) -> Result<Option<&str>, ChatError> {
    let Some(id) = raw.map(str::trim).filter(|id| !id.is_empty()) else {
        return Ok(None);
    };
    if id.chars().count() > MAX_SESSION_ID_LEN {
        return Err(ChatError::Validation(format!(
            "Session ID must be at most {MAX_SESSION_ID_LEN} characters"
        )));
    }
    Ok(Some(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minted_id_shape() {
        let id = new_session_id();
        let parts: Vec<&str> = id.splitn(3, '_').collect();
        assert_eq!(parts[0], "session");
        assert!(Uuid::parse_str(parts[1]).is_ok());
        assert!(parts[2].parse::<i64>().is_ok());
    }

    #[test]
    fn test_minted_ids_are_unique() {
        assert_ne!(new_session_id(), new_session_id());
    }

    #[test]
    fn test_normalize_trims_and_drops_blank() {
        assert_eq!(normalize_session_id(Some("  abc ")).unwrap(), Some("abc"));
        assert_eq!(normalize_session_id(Some("   ")).unwrap(), None);
        assert_eq!(normalize_session_id(None).unwrap(), None);
    }

    #[test]
    fn test_normalize_rejects_overlong() {
        let long = "x".repeat(MAX_SESSION_ID_LEN + 1);
        let err = normalize_session_id(Some(&long)).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let max = "x".repeat(MAX_SESSION_ID_LEN);
        assert!(normalize_session_id(Some(&max)).unwrap().is_some());
    }
}
