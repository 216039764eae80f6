mod focus;
mod registry;
mod slot;
mod text;

pub use focus::{DoubleTap, FocusCursor};
pub use registry::{FieldRegistry, LoadedConfig};
pub use slot::{Focus, SlotId, TextKind};
pub use text::TextBuffer;
