pub mod gemini;

pub use gemini::{lessons_prompt, tips_prompt, GeminiAdvisor, MISSING_KEY_MESSAGE};
