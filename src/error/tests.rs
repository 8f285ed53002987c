//! Unit tests for error module.

use super::*;

#[test]
fn test_missing_credentials_display() {
    let error = Error::MissingCredentials;

    let display = format!("{}", error);
    assert!(display.contains("missing credentials"));
}

#[test]
fn test_missing_parameters_display() {
    let error = Error::MissingParameters;

    let display = format!("{}", error);
    assert!(display.contains("missing parameters"));
}

#[test]
fn test_bad_url_display() {
    let error = Error::BadUrl("ftp://example.com".to_string());

    let display = format!("{}", error);
    assert!(display.contains("invalid URL scheme"));
    assert!(display.contains("ftp://example.com"));
}

#[test]
fn test_api_error_display() {
    let error = Error::Api {
        status: 404,
        reason: "Not Found".to_string(),
    };

    let display = format!("{}", error);
    assert!(display.contains("404"));
    assert!(display.contains("Not Found"));
}

#[test]
fn test_decode_error_display() {
    let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
    let error = Error::Decode(json_err);

    let display = format!("{}", error);
    assert!(display.contains("JSON decode failed"));
}

#[test]
fn test_error_codes() {
    assert_eq!(Error::MissingCredentials.code(), "missing_credentials");
    assert_eq!(Error::MissingParameters.code(), "missing_parameters");
    assert_eq!(Error::BadUrl("x".to_string()).code(), "bad_url");
    assert_eq!(
        Error::Api {
            status: 500,
            reason: "Internal Server Error".to_string(),
        }
        .code(),
        "http_error"
    );

    let json_err = serde_json::from_str::<i32>("[]").unwrap_err();
    assert_eq!(Error::Decode(json_err).code(), "decode_error");

    let url_err = url::Url::parse("::not a url::").unwrap_err();
    assert_eq!(Error::Url(url_err).code(), "bad_url");

    let io_err = std::io::Error::other("sink closed");
    assert_eq!(Error::Io(io_err).code(), "io_error");
}

#[test]
fn test_error_debug() {
    let error = Error::Api {
        status: 503,
        reason: "Service Unavailable".to_string(),
    };

    let debug = format!("{:?}", error);
    assert!(debug.contains("Api"));
    assert!(debug.contains("503"));
}
