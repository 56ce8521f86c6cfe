mod client;

pub use client::GeminiAdvisor;
