//! Unit tests for error display and classification.

use chesscli_engine::AppError;

#[test]
fn display_names_the_category() {
    let cases = [
        (AppError::EngineUnavailable("x".into()), "engine unavailable: x"),
        (AppError::EngineTerminated("x".into()), "engine terminated: x"),
        (AppError::HandshakeFailed("x".into()), "handshake failed: x"),
        (AppError::Timeout("x".into()), "timeout: x"),
        (AppError::Busy("x".into()), "busy: x"),
        (AppError::Protocol("x".into()), "protocol: x"),
        (AppError::Config("x".into()), "config: x"),
        (AppError::Io("x".into()), "io: x"),
    ];
    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn session_ending_errors_are_terminal() {
    assert!(AppError::EngineUnavailable(String::new()).is_terminal());
    assert!(AppError::EngineTerminated(String::new()).is_terminal());
    assert!(AppError::HandshakeFailed(String::new()).is_terminal());

    assert!(!AppError::Timeout(String::new()).is_terminal());
    assert!(!AppError::Busy(String::new()).is_terminal());
    assert!(!AppError::Protocol(String::new()).is_terminal());
}

#[test]
fn io_errors_convert() {
    let err: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(err, AppError::Io(ref msg) if msg == "gone"));
}

#[test]
fn toml_errors_convert_to_config() {
    let parse = toml::from_str::<toml::Value>("engine = [").expect_err("invalid toml");
    let err: AppError = parse.into();
    assert!(matches!(err, AppError::Config(ref msg) if msg.starts_with("invalid config")));
}
