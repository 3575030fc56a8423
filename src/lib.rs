//! Resumable batch pipeline that scores banking-website pages for CEFR B2
//! plain-language compliance: render → extract → clean → classify → grade
//! via an external LLM → checkpoint → aggregate.

pub mod classify;
pub mod clean;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod grader;
pub mod pipeline;
pub mod report;
pub mod store;
pub mod testing;
