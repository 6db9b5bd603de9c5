// ═══════════════════════════════════════════════════════════════════
// Error Tests — CoreError variants, Display formatting, From impls
// ═══════════════════════════════════════════════════════════════════

use portfolio_engine_core::errors::CoreError;

// ── Display formatting ──────────────────────────────────────────────

mod display {
    use super::*;

    #[test]
    fn serialization() {
        let err = CoreError::Serialization("buffer overflow".into());
        assert_eq!(err.to_string(), "Serialization error: buffer overflow");
    }

    #[test]
    fn deserialization() {
        let err = CoreError::Deserialization("unexpected EOF".into());
        assert_eq!(err.to_string(), "Deserialization error: unexpected EOF");
    }

    #[test]
    fn invalid_period() {
        let err = CoreError::InvalidPeriod("fortnightly".into());
        assert_eq!(err.to_string(), "Unknown rebalance period: fortnightly");
    }

    #[test]
    fn invalid_settings() {
        let err = CoreError::InvalidSettings("noise_threshold_pct must not be negative".into());
        assert_eq!(
            err.to_string(),
            "Invalid engine settings: noise_threshold_pct must not be negative"
        );
    }

    #[test]
    fn validation_error() {
        let err = CoreError::ValidationError("horizon too long".into());
        assert_eq!(err.to_string(), "Validation failed: horizon too long");
    }

    #[test]
    fn empty_message() {
        let err = CoreError::InvalidPeriod(String::new());
        assert_eq!(err.to_string(), "Unknown rebalance period: ");
    }
}

// ── From impls ──────────────────────────────────────────────────────

mod conversions {
    use super::*;

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<Vec<u32>>("[1, 2").unwrap_err();
        let message = json_err.to_string();
        let err: CoreError = json_err.into();

        match err {
            CoreError::Deserialization(msg) => assert_eq!(msg, message),
            other => panic!("expected Deserialization, got {other:?}"),
        }
    }

    #[test]
    fn question_mark_propagates_json_errors() {
        fn parse(json: &str) -> Result<Vec<f64>, CoreError> {
            Ok(serde_json::from_str(json)?)
        }

        assert!(parse("[1.5, 2.5]").is_ok());
        assert!(matches!(parse("nope"), Err(CoreError::Deserialization(_))));
    }
}

// ── Trait bounds ────────────────────────────────────────────────────

mod traits {
    use super::*;

    #[test]
    fn is_std_error() {
        fn assert_error<E: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<CoreError>();
    }

    #[test]
    fn debug_names_variant() {
        let err = CoreError::InvalidSettings("x".into());
        assert!(format!("{err:?}").contains("InvalidSettings"));
    }
}
