mod editor;
mod host;
pub mod keymap;
mod keymap_ext;
mod state;
mod types;

pub use keymap_ext::AppKeymapExt;
pub use types::{ActivePanel, App, EditorPhase, FilteredHost, InputMode};
