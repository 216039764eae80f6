#![deny(rust_2018_idioms)]

//! A modal terminal form for composing RepoBird runs and submitting them
//! asynchronously without blocking input.

pub mod app;
pub mod domain;
pub mod form;
pub mod io;
pub mod presentation;
pub mod services;
pub mod submit;

#[cfg(any(test, feature = "testing"))]
pub mod testing;


pub use app::{RunForm, SessionOutcome, UiOptions};

pub mod prelude {
    pub use super::{RunForm, SessionOutcome, UiOptions};
    pub use crate::domain::{Run, RunType, Task};
    pub use crate::services::{ServiceError, Services};
}
