//! Built-in tools

pub mod calculate;
pub mod clock;
pub mod inspire;
pub mod notes;

pub use calculate::{CalculateTool, CalculateToolFactory};
pub use clock::{NowTool, NowToolFactory};
pub use inspire::{random_quote, InspireTool, InspireToolFactory, QUOTES};
pub use notes::{FindNoteTool, NoteToolFactory, NotesStore, SaveNoteTool};
