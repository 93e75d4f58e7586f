/*!
 * Tests for error types and conversions
 */

use std::path::PathBuf;
use toass::errors::{AppError, ConversionError, ProviderError, SubtitleError};

#[test]
fn test_conversion_error_fromProviderError_shouldWrapAsTextConversion() {
    let err: ConversionError = ProviderError::ServiceError {
        code: 3,
        message: "quota".to_string(),
    }
    .into();

    assert!(matches!(err, ConversionError::TextConversion(ProviderError::ServiceError { code: 3, .. })));
    assert_eq!(err.to_string(), "Text conversion failed: Service reported error code 3: quota");
}

#[test]
fn test_conversion_error_display_shouldNamePath() {
    let err = ConversionError::UnsupportedFormat {
        path: PathBuf::from("movie.txt"),
    };
    assert!(err.to_string().contains("movie.txt"));

    let err = ConversionError::Parse {
        path: PathBuf::from("bad.srt"),
        source: SubtitleError::Parse {
            line: 7,
            message: "malformed timing line".to_string(),
        },
    };
    assert_eq!(err.to_string(), "Failed to parse bad.srt: line 7: malformed timing line");

    let err = ConversionError::DestinationConflict {
        path: PathBuf::from("ep.ass"),
        owner: PathBuf::from("ep.srt"),
    };
    assert_eq!(err.to_string(), "Output ep.ass is already written by ep.srt");
}

#[test]
fn test_app_error_fromConversionError_shouldKeepVariant() {
    let err: AppError = ConversionError::TextConversionPartial {
        expected: 3,
        received: 2,
    }
    .into();

    assert!(matches!(err, AppError::Conversion(_)));
    assert!(err.to_string().contains("2 lines for 3 events"));
}

#[test]
fn test_app_error_fromIoAndAnyhow_shouldMapToFileAndUnknown() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    assert!(matches!(AppError::from(io), AppError::File(_)));
    assert!(matches!(AppError::from(anyhow::anyhow!("boom")), AppError::Unknown(_)));
}

#[test]
fn test_provider_error_is_transient_withTransportErrors_shouldBeTrue() {
    assert!(ProviderError::ConnectionError("refused".into()).is_transient());
    assert!(ProviderError::RequestFailed("reset".into()).is_transient());
    assert!(!ProviderError::ApiError { status_code: 404, message: String::new() }.is_transient());
}
