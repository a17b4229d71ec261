#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    Schema,
    AnalyzeVideo,
    Unknown,
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        match s {
            "ping" => Command::Ping,
            "schema" => Command::Schema,
            "analyze_video" | "analyze" => Command::AnalyzeVideo,
            _ => Command::Unknown,
        }
    }
}
