pub mod engine;
pub mod scheduler;

pub use engine::LifecycleEngine;
pub use scheduler::ExpiryScheduler;
