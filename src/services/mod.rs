pub mod analysis;
pub mod gemini;
pub mod prompt;
