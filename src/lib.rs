// Choosr Library - keep lists, let fair shuffle choose for you
// The shuffle core knows nothing about storage; the session glues everything together

pub mod backup;  // export/import of lists + preferences
pub mod config;  // settings and preferences
pub mod lists;   // lists and their JSON store
pub mod session; // long-lived owner of store + shuffle rounds
pub mod shuffle; // per-list fair rounds

// Export the stuff other modules actually use
pub use config::{Config, Preferences, ViewType};
pub use lists::{ChoiceList, ListStore};
pub use session::{ListEdit, Pick, Session};
pub use shuffle::{ShuffleError, ShuffleSessionManager};
