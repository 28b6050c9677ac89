//! mdposter - article formatting and poster generation over any
//! chat-completions LLM.
//!
//! Features:
//! - Rule-based or AI-based article to Markdown formatting
//! - AI-generated standalone HTML posters, stored and served by id
//! - Runtime-editable AI settings with vendor URL normalization
//! - Offline rewrite + cover pipeline with headless-browser PNG rendering

pub mod api;
pub mod config;
pub mod cover;
pub mod error;
pub mod formatter;
pub mod http;
pub mod llm;
pub mod poster;
pub mod render;
pub mod settings;
