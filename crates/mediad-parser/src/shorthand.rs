//! The shorthand grammar (§4.5): `<domain>_<action> <arg…>` expanded to
//! the URI form through a fixed dispatch table. Every entry here must
//! yield behavior identical to the equivalent URI-form command (§4.5:
//! "Two command grammars are recognized and must yield identical
//! behavior").

use crate::{Command, ParseError};

fn tokens(rest: &str) -> Vec<&str> {
    rest.split_whitespace().collect()
}

/// Splits `rest` into exactly `n` leading tokens plus a joined remainder
/// (used where the last logical argument may itself contain spaces, e.g. a
/// pipeline description or a property value).
fn split_n(rest: &str, n: usize) -> Option<(Vec<&str>, String)> {
    let mut remaining = rest.trim_start();
    let mut head = Vec::with_capacity(n);
    for _ in 0..n {
        let (token, tail) = match remaining.split_once(char::is_whitespace) {
            Some((t, r)) => (t, r.trim_start()),
            None => (remaining, ""),
        };
        if token.is_empty() {
            return None;
        }
        head.push(token);
        remaining = tail;
    }
    Some((head, remaining.to_string()))
}

fn missing(what: &str) -> ParseError {
    ParseError::BadValue(format!("{what} requires more arguments"))
}

/// Names recognized in the shorthand dispatch table, for documentation and
/// `--help`-style listings.
pub fn shorthand_names() -> &'static [&'static str] {
    &[
        "pipeline_create",
        "pipeline_delete",
        "pipeline_play",
        "pipeline_pause",
        "pipeline_stop",
        "list_pipelines",
        "list_elements",
        "element_get",
        "element_set",
        "bus_read",
        "bus_filter",
        "bus_timeout",
        "signal_connect",
        "signal_timeout",
        "action_emit",
        "event_eos",
        "debug_enable",
        "debug_color",
        "debug_threshold",
        "debug_reset",
    ]
}

/// Expands a shorthand command word plus its remaining text into the URI
/// form. Unrecognized words are `BAD_COMMAND` (§4.5).
pub fn expand(head: &str, rest: &str) -> Result<Command, ParseError> {
    match head {
        "pipeline_create" => {
            let (args, description) = split_n(rest, 1).ok_or_else(|| missing("pipeline_create"))?;
            Ok(Command::Create {
                path: "/pipelines".to_string(),
                name: args[0].to_string(),
                description,
            })
        },
        "pipeline_delete" => {
            let args = tokens(rest);
            let name = *args.first().ok_or_else(|| missing("pipeline_delete"))?;
            Ok(Command::Delete { path: "/pipelines".to_string(), name: name.to_string() })
        },
        "pipeline_play" => state_transition(rest, "playing"),
        "pipeline_pause" => state_transition(rest, "paused"),
        "pipeline_stop" => state_transition(rest, "null"),
        "list_pipelines" => Ok(Command::Read { path: "/pipelines".to_string() }),
        "list_elements" => {
            let args = tokens(rest);
            let pipeline = *args.first().ok_or_else(|| missing("list_elements"))?;
            Ok(Command::Read { path: format!("/pipelines/{pipeline}/elements") })
        },
        "element_get" => {
            let args = tokens(rest);
            if args.len() < 3 {
                return Err(missing("element_get"));
            }
            Ok(Command::Read {
                path: format!(
                    "/pipelines/{}/elements/{}/properties/{}",
                    args[0], args[1], args[2]
                ),
            })
        },
        "element_set" => {
            let (args, value) = split_n(rest, 3).ok_or_else(|| missing("element_set"))?;
            if value.is_empty() {
                return Err(missing("element_set"));
            }
            Ok(Command::Update {
                path: format!(
                    "/pipelines/{}/elements/{}/properties/{}",
                    args[0], args[1], args[2]
                ),
                value,
            })
        },
        "bus_read" => {
            let args = tokens(rest);
            let pipeline = *args.first().ok_or_else(|| missing("bus_read"))?;
            Ok(Command::Read { path: format!("/pipelines/{pipeline}/bus") })
        },
        "bus_filter" => {
            let (args, value) = split_n(rest, 1).ok_or_else(|| missing("bus_filter"))?;
            Ok(Command::Update { path: format!("/pipelines/{}/bus/filter", args[0]), value })
        },
        "bus_timeout" => {
            let (args, value) = split_n(rest, 1).ok_or_else(|| missing("bus_timeout"))?;
            if value.is_empty() {
                return Err(missing("bus_timeout"));
            }
            Ok(Command::Update { path: format!("/pipelines/{}/bus/timeout", args[0]), value })
        },
        "signal_connect" => {
            let args = tokens(rest);
            if args.len() < 3 {
                return Err(missing("signal_connect"));
            }
            Ok(Command::Create {
                path: format!("/pipelines/{}/elements/{}/signals-actions", args[0], args[1]),
                name: args[2].to_string(),
                description: String::new(),
            })
        },
        "signal_timeout" => {
            let (args, value) = split_n(rest, 3).ok_or_else(|| missing("signal_timeout"))?;
            if value.is_empty() {
                return Err(missing("signal_timeout"));
            }
            Ok(Command::Update {
                path: format!(
                    "/pipelines/{}/elements/{}/signals-actions/{}",
                    args[0], args[1], args[2]
                ),
                value,
            })
        },
        "action_emit" => {
            let (args, value) = split_n(rest, 3).ok_or_else(|| missing("action_emit"))?;
            Ok(Command::Update {
                path: format!(
                    "/pipelines/{}/elements/{}/signals-actions/{}",
                    args[0], args[1], args[2]
                ),
                value,
            })
        },
        "event_eos" => {
            let args = tokens(rest);
            let pipeline = *args.first().ok_or_else(|| missing("event_eos"))?;
            Ok(Command::Create {
                path: format!("/pipelines/{pipeline}/event"),
                name: "eos".to_string(),
                description: String::new(),
            })
        },
        "debug_enable" => debug_field(rest, "enabled"),
        "debug_color" => debug_field(rest, "color"),
        "debug_threshold" => debug_field(rest, "threshold"),
        "debug_reset" => Ok(Command::Update { path: "/debug".to_string(), value: "reset".to_string() }),
        other => Err(ParseError::BadCommand(format!("unknown command '{other}'"))),
    }
}

fn state_transition(rest: &str, target: &str) -> Result<Command, ParseError> {
    let args = tokens(rest);
    let pipeline = *args.first().ok_or_else(|| missing("pipeline state transition"))?;
    Ok(Command::Update { path: format!("/pipelines/{pipeline}/state"), value: target.to_string() })
}

fn debug_field(rest: &str, field: &str) -> Result<Command, ParseError> {
    let (args, _) = split_n(rest, 1).ok_or_else(|| missing("debug field"))?;
    Ok(Command::Update { path: format!("/debug/{field}"), value: args[0].to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_create_matches_uri_form() {
        let shorthand = crate::parse(Some("pipeline_create p0 fakesrc ! fakesink")).unwrap();
        let uri = crate::parse(Some("create /pipelines p0 fakesrc ! fakesink")).unwrap();
        assert_eq!(shorthand, uri);
    }

    #[test]
    fn pipeline_play_expands_to_state_update() {
        let cmd = crate::parse(Some("pipeline_play p0")).unwrap();
        assert_eq!(
            cmd,
            Command::Update { path: "/pipelines/p0/state".to_string(), value: "playing".to_string() }
        );
    }

    #[test]
    fn element_set_matches_uri_form() {
        let shorthand = crate::parse(Some("element_set p0 e0 num-buffers 42")).unwrap();
        let uri =
            crate::parse(Some("update /pipelines/p0/elements/e0/properties/num-buffers 42")).unwrap();
        assert_eq!(shorthand, uri);
    }

    #[test]
    fn event_eos_creates_under_event_factory() {
        let cmd = crate::parse(Some("event_eos p0")).unwrap();
        assert_eq!(
            cmd,
            Command::Create {
                path: "/pipelines/p0/event".to_string(),
                name: "eos".to_string(),
                description: String::new(),
            }
        );
    }

    #[test]
    fn debug_enable_matches_uri_form() {
        let shorthand = crate::parse(Some("debug_enable true")).unwrap();
        let uri = crate::parse(Some("update /debug/enabled true")).unwrap();
        assert_eq!(shorthand, uri);
    }

    #[test]
    fn list_pipelines_takes_no_arguments() {
        assert_eq!(
            crate::parse(Some("list_pipelines")).unwrap(),
            Command::Read { path: "/pipelines".to_string() }
        );
    }

    #[test]
    fn unknown_shorthand_is_bad_command() {
        assert!(matches!(crate::parse(Some("pipeline_frobnicate p0")), Err(ParseError::BadCommand(_))));
    }

    #[test]
    fn element_get_missing_arguments_is_bad_value() {
        assert!(matches!(crate::parse(Some("element_get p0 e0")), Err(ParseError::BadValue(_))));
    }
}
