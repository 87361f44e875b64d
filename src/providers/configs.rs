pub mod anthropic;
pub mod base;
pub mod gemini;
pub mod openai;
