use strata_util::errors::StrataError;

#[test]
fn test_invalid_variant_value_message() {
    let err = StrataError::InvalidVariantValue {
        package: "mesa".to_string(),
        variant: "swr".to_string(),
        value: "sse2".to_string(),
    };
    let msg = err.to_string();
    assert!(msg.contains("mesa"));
    assert!(msg.contains("swr"));
    assert!(msg.contains("sse2"));
}

#[test]
fn test_unsatisfiable_version_message() {
    let err = StrataError::UnsatisfiableVersion {
        package: "llvm".to_string(),
        constraint: "99:".to_string(),
        requirer: "mesa".to_string(),
    };
    let msg = err.to_string();
    assert!(msg.contains("llvm"));
    assert!(msg.contains("99:"));
    assert!(msg.contains("mesa"));
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: StrataError = io.into();
    assert!(matches!(err, StrataError::Io(_)));
}

#[test]
fn test_conflict_message_includes_rule_and_settings() {
    let err = StrataError::ConfigurationConflict {
        package: "mesa".to_string(),
        rule: "~egl ~glx ~osmesa".to_string(),
        settings: "~egl ~glx ~osmesa".to_string(),
        message: String::new(),
    };
    assert!(err.to_string().contains("~egl ~glx ~osmesa"));
}
