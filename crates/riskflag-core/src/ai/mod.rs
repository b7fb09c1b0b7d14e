// SPDX-License-Identifier: Apache-2.0

//! Language-model integration.
//!
//! Prompt rendering lives in [`prompt`]; the HTTP client for the local
//! completion server lives in [`completion`].

pub mod completion;
pub mod prompt;

pub use completion::{CompletionClient, ModelReply};
pub use prompt::{Prompt, SystemPrompt, build_prompt};
