use nv_core::{validate_key, validate_value, BankId, NvError, Scope};

#[test]
fn test_bank_alternation() {
    assert_eq!(BankId::A.other(), BankId::B);
    assert_eq!(BankId::B.other(), BankId::A);
    assert_eq!(BankId::A.other().other(), BankId::A);
}

#[test]
fn test_scope_names() {
    assert_eq!(Scope::User.name(), "user");
    assert_eq!(Scope::System.to_string(), "system");
}

#[test]
fn test_key_rules() {
    assert!(validate_key("var1").is_ok());
    assert!(validate_key("SYS_BOOT_PART").is_ok());

    // Would break key=value listings
    assert_eq!(validate_key(""), Err(NvError::InvalidKey));
    assert_eq!(validate_key("a=b"), Err(NvError::InvalidKey));
    assert_eq!(validate_key("a\nb"), Err(NvError::InvalidKey));
    assert_eq!(validate_key("a\0"), Err(NvError::InvalidKey));
}

#[test]
fn test_value_rules() {
    assert!(validate_value("").is_ok());
    assert!(validate_value("x=y z").is_ok());

    // A newline would forge an extra listing line
    assert_eq!(validate_value("a\nspoof=1"), Err(NvError::InvalidValue));
    assert_eq!(validate_value("a\0"), Err(NvError::InvalidValue));
}

#[test]
fn test_not_found_is_distinguishable() {
    let err = NvError::NotFound { key: "key1".into() };
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "key1: not found");
    assert!(!NvError::InvalidKey.is_not_found());
}
