//! Step data model and response decoder.

use serde_json::{Map, Value};

/// One tagged unit of agent output.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Think { content: String },
    Action { tool: String, input: Value },
    Observer { content: String },
    Output { content: String },
}

/// What a raw model reply decodes to.
///
/// `Transient` keeps the loop polling (malformed JSON that still looks like
/// an attempt at one); `NonJson` ends the run cleanly (no brace characters at
/// all); `UnknownKind` is a decoded object whose tag is outside the protocol
/// and is a terminal error, never silently dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    Step(Step),
    UnknownKind(String),
    Transient,
    NonJson,
}

pub fn decode_step(raw: &str) -> DecodeOutcome {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DecodeOutcome::Transient;
    }

    let candidate = fenced_candidate(trimmed).unwrap_or_else(|| trimmed.to_string());

    match serde_json::from_str::<Value>(&candidate) {
        Ok(Value::Object(map)) => step_from_object(&map),
        Ok(_) => DecodeOutcome::UnknownKind("(missing)".to_string()),
        Err(_) => {
            if !raw.contains('{') && !raw.contains('}') {
                DecodeOutcome::NonJson
            } else {
                DecodeOutcome::Transient
            }
        }
    }
}

fn step_from_object(map: &Map<String, Value>) -> DecodeOutcome {
    let tag = map.get("step").and_then(Value::as_str).unwrap_or_default();
    let step = match tag {
        "think" => Step::Think {
            content: text_field(map, "content"),
        },
        "action" => Step::Action {
            tool: text_field(map, "tool"),
            input: map.get("input").cloned().unwrap_or(Value::Null),
        },
        "observer" => Step::Observer {
            content: text_field(map, "content"),
        },
        "output" => Step::Output {
            content: text_field(map, "content"),
        },
        "" => return DecodeOutcome::UnknownKind("(missing)".to_string()),
        other => return DecodeOutcome::UnknownKind(other.to_string()),
    };
    DecodeOutcome::Step(step)
}

fn text_field(map: &Map<String, Value>, field: &str) -> String {
    map.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Pull the first balanced object out of the first ```json fence.
///
/// Later fences are ignored; a fence without a complete object falls back to
/// parsing the whole reply.
fn fenced_candidate(text: &str) -> Option<String> {
    let fence = text.find("```json")?;
    let inner = &text[fence + "```json".len()..];
    balanced_object(inner).map(str::to_string)
}

/// First `{...}` span with balanced braces, skipping braces inside string
/// literals and escaped quotes.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_bare_json_object() {
        let outcome = decode_step(r#"{"step":"think","content":"planning"}"#);
        assert_eq!(
            outcome,
            DecodeOutcome::Step(Step::Think {
                content: "planning".to_string()
            })
        );
    }

    #[test]
    fn decodes_action_with_input() {
        let outcome = decode_step(r#"{"step":"action","tool":"readFile","input":"notes.txt"}"#);
        assert_eq!(
            outcome,
            DecodeOutcome::Step(Step::Action {
                tool: "readFile".to_string(),
                input: json!("notes.txt"),
            })
        );
    }

    #[test]
    fn unwraps_fenced_payload() {
        let raw = "Here you go:\n```json\n{\"step\":\"output\",\"content\":\"done\"}\n```\nthanks";
        assert_eq!(
            decode_step(raw),
            DecodeOutcome::Step(Step::Output {
                content: "done".to_string()
            })
        );
    }

    #[test]
    fn first_fence_wins_over_later_ones() {
        let raw = concat!(
            "```json\n{\"step\":\"think\",\"content\":\"first\"}\n```\n",
            "```json\n{\"step\":\"output\",\"content\":\"second\"}\n```",
        );
        assert_eq!(
            decode_step(raw),
            DecodeOutcome::Step(Step::Think {
                content: "first".to_string()
            })
        );
    }

    #[test]
    fn braces_inside_strings_do_not_end_the_scan() {
        let raw = "```json\n{\"step\":\"think\",\"content\":\"use {braces} and \\\"quotes\\\"\"}\n```";
        assert_eq!(
            decode_step(raw),
            DecodeOutcome::Step(Step::Think {
                content: "use {braces} and \"quotes\"".to_string()
            })
        );
    }

    #[test]
    fn malformed_with_braces_is_transient() {
        assert_eq!(decode_step("{\"step\": \"think\", oops"), DecodeOutcome::Transient);
        assert_eq!(decode_step("partial } tail"), DecodeOutcome::Transient);
    }

    #[test]
    fn empty_reply_is_transient() {
        assert_eq!(decode_step(""), DecodeOutcome::Transient);
        assert_eq!(decode_step("   \n "), DecodeOutcome::Transient);
    }

    #[test]
    fn braceless_text_ends_the_run() {
        assert_eq!(
            decode_step("Sorry, I cannot continue with this request."),
            DecodeOutcome::NonJson
        );
    }

    #[test]
    fn unknown_tag_is_terminal_not_dropped() {
        assert_eq!(
            decode_step(r#"{"step":"ponder","content":"hmm"}"#),
            DecodeOutcome::UnknownKind("ponder".to_string())
        );
    }

    #[test]
    fn missing_tag_is_terminal() {
        assert_eq!(
            decode_step(r#"{"content":"no tag here"}"#),
            DecodeOutcome::UnknownKind("(missing)".to_string())
        );
        assert_eq!(
            decode_step("\"just a string\""),
            DecodeOutcome::UnknownKind("(missing)".to_string())
        );
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let outcome = decode_step(r#"{"step":"action"}"#);
        assert_eq!(
            outcome,
            DecodeOutcome::Step(Step::Action {
                tool: String::new(),
                input: Value::Null,
            })
        );
    }
}
