//! The form editor: the root controller of one editor mount and the
//! external collaborators it talks to.

pub mod collaborators;
pub mod controller;

pub use collaborators::{AuthContext, Clipboard, Collaborators, Navigator, Notice, NoticeLevel, Notifier};
pub use controller::{EditorMode, FormEditor};
