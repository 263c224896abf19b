use serde_json::Value;

/// Event payload: field name to value, supplied by the host for one event.
pub type Payload = serde_json::Map<String, Value>;

/// Substitute `{field}` placeholders in `template` from `payload`.
///
/// Placeholders with no matching payload key are left verbatim (the rendered
/// text still contains `{field}`). Notification templates may legitimately
/// reference fields that only some events carry, so an unresolved placeholder
/// is not an error.
///
/// # Examples
///
/// ```rust
/// use print_notifier::template::{render, Payload};
///
/// let mut payload = Payload::new();
/// payload.insert("name".to_string(), "benchy.gcode".into());
/// assert_eq!(render("Print started {name}", &payload), "Print started benchy.gcode");
/// assert_eq!(render("done in {time}", &payload), "done in {time}");
/// ```
pub fn render(template: &str, payload: &Payload) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let key = &after[..close];
                match payload.get(key) {
                    Some(value) => out.push_str(&value_to_string(value)),
                    None => {
                        // Unknown field: keep the placeholder text as-is.
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                // Unterminated brace: nothing left to substitute.
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

/// Format an elapsed time in raw seconds as `H:MM:SS` (e.g. 125 -> "0:02:05").
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = total_seconds % 3600 / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}:{:02}", hours, minutes, seconds)
}

fn value_to_string(value: &Value) -> String {
    match value {
        // Strings render bare, without the JSON quotes.
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload_from(value: serde_json::Value) -> Payload {
        value.as_object().expect("test payload is an object").clone()
    }

    #[test]
    fn substitutes_known_fields() {
        let payload = payload_from(json!({"name": "benchy.gcode", "progress": 40}));
        assert_eq!(
            render("Printing {name} is at {progress}%", &payload),
            "Printing benchy.gcode is at 40%"
        );
    }

    #[test]
    fn unknown_fields_stay_verbatim() {
        let payload = payload_from(json!({"name": "benchy.gcode"}));
        assert_eq!(
            render("{name} done in {time}.", &payload),
            "benchy.gcode done in {time}."
        );
    }

    #[test]
    fn empty_payload_leaves_template_unchanged() {
        assert_eq!(
            render("Print complete: {name}", &Payload::new()),
            "Print complete: {name}"
        );
    }

    #[test]
    fn non_string_values_render_without_quotes() {
        let payload = payload_from(json!({"progress": 80, "origin": "local", "paused": false}));
        assert_eq!(
            render("{progress} {origin} {paused}", &payload),
            "80 local false"
        );
    }

    #[test]
    fn unterminated_placeholder_is_kept() {
        let payload = payload_from(json!({"name": "x"}));
        assert_eq!(render("broken {name", &payload), "broken {name");
    }

    #[test]
    fn template_without_placeholders_passes_through() {
        assert_eq!(render("plain text", &Payload::new()), "plain text");
    }

    #[test]
    fn formats_durations_as_h_mm_ss() {
        assert_eq!(format_duration(0), "0:00:00");
        assert_eq!(format_duration(125), "0:02:05");
        assert_eq!(format_duration(3600), "1:00:00");
        assert_eq!(format_duration(3 * 3600 + 47 * 60 + 9), "3:47:09");
        assert_eq!(format_duration(26 * 3600), "26:00:00");
    }
}
