mod hash;
mod task;

pub use hash::{bytes_hash, content_hash};
pub use task::{FormSnapshot, Run, RunType, Task};
