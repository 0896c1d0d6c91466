use std::time::Duration;

/// Default time a toast stays on screen.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(1000);

/// Severity or category for user-visible toasts.
///
/// This enum classifies toasts by their intent and visual styling,
/// allowing the host to display them appropriately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastVariant {
    /// Neutral informational message that does not indicate success or failure.
    Info,
    /// Indicates a successful operation or positive outcome.
    Success,
    /// Indicates a non-critical issue that the user should be aware of, but
    /// does not prevent normal operation.
    Warning,
    /// Indicates an error or failure that may affect functionality.
    Error,
}

/// How a toast is dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastMode {
    /// Stays until the user closes it or the duration elapses.
    Dismissible,
    /// Disappears after the duration and cannot be closed early.
    Pester,
    /// Stays until the user closes it.
    Sticky,
}

/// A toast payload intended for the user interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastMessage {
    /// The type/severity of the toast, determining its visual style.
    pub variant: ToastVariant,
    /// Dismissal behaviour.
    pub mode: ToastMode,
    /// Short heading line.
    pub title: String,
    /// The text content to display to the user.
    pub message: String,
    /// How long the toast stays visible.
    pub duration: Duration,
}
