use crate::model::FormMode;
use crate::ui::{AppState, ToastLevel, View};
use serde_json::Value as JsonValue;

#[cfg(test)]
mod tests;

/// Messages produced by background dispatches.
#[derive(Clone, Debug, PartialEq)]
pub enum AppMsg {
    LoadedSubmit { outcome: Result<JsonValue, String> },
    LoadedGeocode { outcome: Result<JsonValue, String> },
}

/// Side effects requested by widgets and by `update`; executed by the
/// run loop.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    SubmitEntry {
        cmdline: String,
    },
    Geocode {
        query: String,
    },
    CancelForm {
        mode: FormMode,
    },
    ShowToast {
        text: String,
        level: ToastLevel,
        seconds: u64,
    },
}

fn envelope_ok(v: &JsonValue) -> bool {
    v.get("ok").and_then(JsonValue::as_bool).unwrap_or(false)
}

fn envelope_error(v: &JsonValue) -> (String, Option<serde_json::Map<String, JsonValue>>) {
    let err = v.get("error");
    let message = err
        .and_then(|e| e.get("message"))
        .and_then(JsonValue::as_str)
        .unwrap_or("Unknown error")
        .to_string();
    let fields = err
        .and_then(|e| e.get("fields"))
        .and_then(JsonValue::as_object)
        .cloned();
    (message, fields)
}

pub fn update(state: &mut AppState, msg: AppMsg) -> Vec<Effect> {
    let mut effects = Vec::new();
    match msg {
        AppMsg::LoadedSubmit { outcome } => {
            state.submitting = false;
            state.status_text = None;
            state.form.form.disabled = false;
            match outcome {
                Ok(env) => {
                    if envelope_ok(&env) {
                        let mode = state.form.form.mode;
                        state.reset_form();
                        state.view = View::Landing;
                        let text = match mode {
                            FormMode::Create => "Entry saved",
                            FormMode::Edit => "Entry updated",
                        };
                        effects.push(Effect::ShowToast {
                            text: text.into(),
                            level: ToastLevel::Success,
                            seconds: 4,
                        });
                    } else {
                        let (message, fields) = envelope_error(&env);
                        match fields.filter(|m| !m.is_empty()) {
                            Some(fields) => state.form.form.apply_field_errors(&fields),
                            None => state.form.form.banner_error = Some(message),
                        }
                    }
                }
                Err(e) => state.form.form.banner_error = Some(e),
            }
        }
        AppMsg::LoadedGeocode { outcome } => {
            state.status_text = None;
            let position = match &outcome {
                Ok(env) if envelope_ok(env) => {
                    let data = env.get("data");
                    let lat = data.and_then(|d| d.get("lat")).and_then(JsonValue::as_f64);
                    let lng = data.and_then(|d| d.get("lng")).and_then(JsonValue::as_f64);
                    lat.zip(lng)
                }
                _ => None,
            };
            match position {
                Some((lat, lng)) => state.form.set_position(lat, lng),
                None => {
                    let text = match outcome {
                        Ok(env) => envelope_error(&env).0,
                        Err(e) => e,
                    };
                    effects.push(Effect::ShowToast {
                        text: format!("Geocoding failed: {text}"),
                        level: ToastLevel::Error,
                        seconds: 4,
                    });
                }
            }
        }
    }
    effects
}
