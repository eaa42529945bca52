//! The wire envelope shared by the TCP and HTTP servers (spec.md §6):
//! `{"code": <int>, "description": "<text>", "response": <payload-or-null>}`.
//! Both transports render it the same way — only the framing around it
//! (a trailing NUL vs. an HTTP status line) differs.

use mediad_core::{CoreResult, ReturnCode};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct Envelope {
    pub code: i32,
    pub description: &'static str,
    pub response: Value,
}

/// Renders a dispatch result into the wire envelope. Errors carry a `null`
/// response — the payload is only ever the verb's own success value.
#[must_use]
pub fn render_envelope(result: CoreResult<Value>) -> Envelope {
    match result {
        Ok(response) => Envelope {
            code: ReturnCode::Eok.code(),
            description: ReturnCode::Eok.description(),
            response,
        },
        Err(err) => {
            let code = err.return_code();
            Envelope { code: code.code(), description: code.description(), response: Value::Null }
        },
    }
}

#[must_use]
pub fn return_code_of(result: &CoreResult<Value>) -> ReturnCode {
    match result {
        Ok(_) => ReturnCode::Eok,
        Err(err) => err.return_code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediad_core::CoreError;

    #[test]
    fn ok_result_renders_eok_with_the_payload() {
        let envelope = render_envelope(Ok(serde_json::json!({"name": "p0"})));
        assert_eq!(envelope.code, 0);
        assert_eq!(envelope.description, "OK");
        assert_eq!(envelope.response["name"], "p0");
    }

    #[test]
    fn error_result_renders_null_response_with_the_matching_code() {
        let envelope = render_envelope(Err(CoreError::NoResource("/nope".to_string())));
        assert_eq!(envelope.code, ReturnCode::NoResource.code());
        assert!(envelope.response.is_null());
    }
}
