use super::*;
use crate::render::composite::BlendMode;

#[test]
fn parses_what_it_can() {
    let v: Lenient<BlendMode> = serde_json::from_str(r#""screen""#).unwrap();
    assert_eq!(v, Lenient::Valid(BlendMode::Screen));
    assert_eq!(v.valid(), Some(&BlendMode::Screen));
    assert_eq!(v.invalid(), None);

    let v: Lenient<BlendMode> = serde_json::from_str(r#""plus-lighter""#).unwrap();
    assert_eq!(v.invalid(), Some(&serde_json::json!("plus-lighter")));
    assert_eq!(or_default(Some(&v)), BlendMode::SourceOver);
}

#[test]
fn numbers_reject_strings() {
    let v: Lenient<f64> = serde_json::from_str(r#""0.5""#).unwrap();
    assert_eq!(v, Lenient::Invalid(serde_json::json!("0.5")));
    let v: Lenient<f64> = serde_json::from_str("0.5").unwrap();
    assert_eq!(v, Lenient::Valid(0.5));
}

#[test]
fn absent_fields_use_the_default() {
    assert_eq!(or_default::<BlendMode>(None), BlendMode::SourceOver);
}

#[test]
fn writes_back_the_original_value() {
    let raw = serde_json::json!({"not": "a mode"});
    let v: Lenient<BlendMode> = serde_json::from_value(raw.clone()).unwrap();
    assert_eq!(serde_json::to_value(&v).unwrap(), raw);
    let v = Lenient::from(BlendMode::Multiply);
    assert_eq!(serde_json::to_value(&v).unwrap(), serde_json::json!("multiply"));
}
