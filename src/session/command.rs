/// Slash commands recognised in the input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/model <id>` → `POST /config/model`.
    SwitchModel(String),
    /// `/clear` → `POST /session/clear`.
    ClearSession,
    /// `/help`, answered locally.
    Help,
    /// `/quit`, `/exit`.
    Quit,
}

pub const HELP_LINES: &[&str] = &[
    "COMMANDS:",
    "  /model <id>   SWITCH BACKEND MODEL",
    "  /clear        CLEAR THE AGENT SESSION",
    "  /help         SHOW THIS LIST",
    "  /quit         EXIT",
];

/// `None` means the input is a chat query. `Some(Err(_))` is a recognised
/// command used incorrectly, carrying the usage text.
pub fn parse_command(input: &str) -> Option<Result<Command, String>> {
    let trimmed = input.trim();
    let mut parts = trimmed.split_whitespace();
    let head = parts.next()?;

    match head {
        "/model" => {
            let model_id: Vec<&str> = parts.collect();
            if model_id.len() == 1 {
                Some(Ok(Command::SwitchModel(model_id[0].to_string())))
            } else {
                Some(Err("USAGE: /model <model_id>".to_string()))
            }
        }
        "/clear" => Some(Ok(Command::ClearSession)),
        "/help" | "/commands" => Some(Ok(Command::Help)),
        "/quit" | "/exit" | "/q" => Some(Ok(Command::Quit)),
        _ => None,
    }
}
