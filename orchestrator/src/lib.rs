pub mod healing;
pub mod process;
pub mod queue;
pub mod worker;

pub use healing::{run_healing_loop, HealingReport};
pub use process::{Orchestrator, ProcessOutcome};
pub use queue::{ChannelJobQueue, Job, JobQueue};
pub use worker::Worker;
