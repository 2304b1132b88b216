use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        LaminateError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        LaminateError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert!(LaminateError::filter("x").to_string().contains("filter error:"));
    assert!(LaminateError::render("x").to_string().contains("render error:"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = LaminateError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn asset_errors_carry_their_url() {
    let err = AssetError::load("cat.png", "not found");
    assert_eq!(err.url(), "cat.png");
    let wrapped: LaminateError = err.into();
    assert!(wrapped.to_string().contains("unable to load image 'cat.png'"));
}

#[test]
fn json_errors_convert_to_serde_kind() {
    let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(LaminateError::from(err), LaminateError::Serde(_)));
}
