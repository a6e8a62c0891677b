//! Backend module - upstream task API, its DashScope client, and chat relays

pub mod dashscope;
pub mod relay;
pub mod relay_registry;
pub mod traits;

pub use dashscope::DashScopeClient;
pub use relay::{extract_results, ChatRelay};
pub use relay_registry::RelayRegistry;
pub use traits::{TaskApi, TaskResponse, TaskSubmission};
