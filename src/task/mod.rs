//! Asynchronous task lifecycle: validate, submit, poll, normalize

pub mod job_spec;
pub mod normalizer;
pub mod outcome;
pub mod pipeline;
pub mod poller;
pub mod request;
pub mod submitter;

pub use job_spec::UpstreamJobSpec;
pub use normalizer::{normalize, GenerationResult, ImageRecord};
pub use outcome::TerminalOutcome;
pub use pipeline::GenerationPipeline;
pub use poller::{PollLoop, PollPolicy, PollState, Task, TaskStatus};
pub use request::GenerationRequest;
pub use submitter::TaskSubmitter;
