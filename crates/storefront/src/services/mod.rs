//! Business logic services for the mall.
//!
//! # Services
//!
//! - `assistant` - Canned-response shopping assistant behind `/api/chat`

pub mod assistant;

pub use assistant::{Assistant, AssistantReply};
