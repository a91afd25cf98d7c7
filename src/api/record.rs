use crate::error::RecordParseError;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamRecord {
    /// Backend activity line for the system log.
    Log { content: String },
    /// Response text to type into the agent message.
    Text { content: String },
}

#[derive(Deserialize)]
struct RawRecord {
    #[serde(rename = "type")]
    kind: Option<String>,
    content: Option<String>,
}

pub fn interpret(line: &str) -> Result<StreamRecord, RecordParseError> {
    let raw: RawRecord = serde_json::from_str(line)?;
    let kind = raw.kind.ok_or(RecordParseError::MissingType)?;
    let content = match kind.as_str() {
        "log" | "text" => raw
            .content
            .ok_or_else(|| RecordParseError::MissingContent(kind.clone()))?,
        _ => return Err(RecordParseError::UnknownType(kind)),
    };

    Ok(match kind.as_str() {
        "log" => StreamRecord::Log { content },
        _ => StreamRecord::Text { content },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_log_records() {
        assert_eq!(
            interpret(r#"{"type":"text","content":"hi"}"#).expect("text"),
            StreamRecord::Text {
                content: "hi".to_string()
            }
        );
        assert_eq!(
            interpret(r#"{"type":"log","content":"QUERYING processes","extra":1}"#).expect("log"),
            StreamRecord::Log {
                content: "QUERYING processes".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_malformed_lines() {
        assert!(matches!(
            interpret("not json"),
            Err(RecordParseError::Json(_))
        ));
        assert!(matches!(
            interpret(r#"{"content":"x"}"#),
            Err(RecordParseError::MissingType)
        ));
        assert!(matches!(
            interpret(r#"{"type":"image","content":"x"}"#),
            Err(RecordParseError::UnknownType(kind)) if kind == "image"
        ));
        assert!(matches!(
            interpret(r#"{"type":"text"}"#),
            Err(RecordParseError::MissingContent(_))
        ));
        assert!(matches!(
            interpret(r#"{"type":"text","content":42}"#),
            Err(RecordParseError::Json(_))
        ));
    }
}
