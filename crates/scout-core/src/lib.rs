//! # scout-core
//!
//! Provider-agnostic text generation for the scout aggregation pipeline.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │                 Agent (role)                    │
//! │  ┌──────────────┐        ┌──────────────────┐   │
//! │  │ instructions │──────▶ │   LlmProvider    │   │
//! │  │  + options   │        │   (Strategy)     │   │
//! │  └──────────────┘        └──────────────────┘   │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait lets the classifier and summarizer roles run
//! against Azure OpenAI, Ollama or [`MockProvider`] without code changes.

pub mod agent;
pub mod error;
pub mod message;
pub mod mock;
pub mod preferences;
pub mod provider;

pub use agent::{Agent, AgentBuilder};
pub use error::{AgentError, Result};
pub use message::{Message, Role};
pub use mock::MockProvider;
pub use preferences::{MemoryPreferenceStore, PreferenceStore};
pub use provider::{Completion, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo};
