mod body;
mod dialog;
mod footer;
mod layout;
mod overlay;

pub use body::render_form;
pub use dialog::render_submission;
pub use footer::render_footer;
pub use overlay::render_overlay;
