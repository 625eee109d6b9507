mod clock_face;
mod context_menu;

pub use clock_face::ClockFace;
pub use context_menu::{ContextMenu, MenuAction, MenuPage, MenuStatus};
