use super::*;
use crate::model::AppConfig;
use crate::widgets::captcha::CaptchaStatus;
use serde_json::json;

fn state() -> AppState {
    let mut s = AppState::new(AppConfig::default());
    s.view = View::Form;
    s
}

#[test]
fn successful_submit_resets_form_and_returns_to_landing() {
    let mut s = state();
    s.submitting = true;
    s.form.form.disabled = true;
    s.form.form.set_value("title", "Repair Café".into());
    let effects = update(
        &mut s,
        AppMsg::LoadedSubmit {
            outcome: Ok(json!({"ok": true, "data": {"id": "abc123"}})),
        },
    );
    assert!(!s.submitting);
    assert_eq!(s.view, View::Landing);
    // a fresh form was mounted
    assert_eq!(s.form.form.value_of("title"), "");
    assert_eq!(s.form.form.captcha_status, CaptchaStatus::Pending);
    assert!(matches!(
        effects.as_slice(),
        [Effect::ShowToast {
            level: ToastLevel::Success,
            ..
        }]
    ));
}

#[test]
fn submit_validation_errors_map_onto_fields() {
    let mut s = state();
    let effects = update(
        &mut s,
        AppMsg::LoadedSubmit {
            outcome: Ok(json!({
                "ok": false,
                "error": {
                    "message": "validation failed",
                    "fields": {"title": "Title is required"}
                }
            })),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(s.view, View::Form);
    assert!(s.form.form.submit_failed);
    assert_eq!(
        s.form.form.field("title").unwrap().error.as_deref(),
        Some("Title is required")
    );
    assert!(!s.form.form.disabled);
}

#[test]
fn submit_failure_without_fields_shows_the_banner() {
    let mut s = state();
    update(
        &mut s,
        AppMsg::LoadedSubmit {
            outcome: Ok(json!({"ok": false, "error": {"message": "server unreachable"}})),
        },
    );
    assert_eq!(
        s.form.form.banner_error.as_deref(),
        Some("server unreachable")
    );
    let mut s = state();
    update(
        &mut s,
        AppMsg::LoadedSubmit {
            outcome: Err("spawn failed".into()),
        },
    );
    assert_eq!(s.form.form.banner_error.as_deref(), Some("spawn failed"));
}

#[test]
fn geocode_result_fills_the_position_fields() {
    let mut s = state();
    s.status_text = Some("Looking up position".into());
    let effects = update(
        &mut s,
        AppMsg::LoadedGeocode {
            outcome: Ok(json!({"ok": true, "data": {"lat": 51.34, "lng": 12.37}})),
        },
    );
    assert!(effects.is_empty());
    assert!(s.status_text.is_none());
    assert_eq!(s.form.form.value_of("lat"), "51.34");
    assert_eq!(s.form.form.value_of("lng"), "12.37");
}

#[test]
fn geocode_failure_becomes_an_error_toast() {
    let mut s = state();
    let effects = update(
        &mut s,
        AppMsg::LoadedGeocode {
            outcome: Ok(json!({"ok": false, "error": {"message": "no match"}})),
        },
    );
    assert!(matches!(
        effects.as_slice(),
        [Effect::ShowToast {
            level: ToastLevel::Error,
            ..
        }]
    ));
    assert_eq!(s.form.form.value_of("lat"), "");
}
