//! Terminal teardown on panic
//!
//! Panics inside a guarded draw are recovered into the crash screen, so the
//! terminal stays in raw mode for them. Any other panic restores the terminal
//! before the process unwinds.

use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::event::DisableMouseCapture;
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, LeaveAlternateScreen};
use tracing::error;

static DRAWING: AtomicBool = AtomicBool::new(false);

pub fn is_drawing() -> bool {
    DRAWING.load(Ordering::SeqCst)
}

/// Run a draw closure, catching its panic
pub fn draw_guarded<R>(draw: impl FnOnce() -> R) -> Result<R, String> {
    DRAWING.store(true, Ordering::SeqCst);
    let result = panic::catch_unwind(AssertUnwindSafe(draw));
    DRAWING.store(false, Ordering::SeqCst);
    result.map_err(|payload| panic_message(payload.as_ref()))
}

/// Leave raw mode and the alternate screen; errors are ignored
pub fn restore() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

pub fn install_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        if is_drawing() {
            error!(panic = %panic_info, "panic while drawing");
            return;
        }
        restore();
        error!(panic = %panic_info, "panic");
        eprintln!("{panic_info}");
    }));
}

pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}
