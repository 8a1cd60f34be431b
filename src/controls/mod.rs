//! On-screen controls: the button bar, the shared session state it drives, and the
//! click dispatcher that connects them.

mod button;
mod dispatch;
mod session;

pub use button::{Button, ButtonAction, ButtonRegistry, QUIT_LABEL};
pub use dispatch::InputDispatcher;
pub use session::SessionState;
