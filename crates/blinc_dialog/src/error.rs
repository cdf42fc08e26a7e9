//! Error types for blinc_dialog

use thiserror::Error;

/// Errors detected when a dialog launch is requested
///
/// These are caller mistakes (a dialog that cannot be stolen, a host that
/// cannot host). Expected runtime conditions, like a trigger that was detached
/// before the exit animation, are never reported as errors.
#[derive(Error, Debug)]
pub enum DialogLaunchError {
    /// The dialog has no content root its content can be stolen from
    #[error("dialog does not have a content root")]
    MissingContentRoot,

    /// The dialog has no window attributes
    #[error("dialog does not have a window")]
    MissingWindow,

    /// The dialog window has no background
    #[error("dialogs with no background on their window are not supported")]
    MissingBackground,

    /// The host provider returned a host without a window
    #[error("there is no window associated to the host dialog")]
    MissingHostWindow,

    /// The parent host does not show animated dialog content
    #[error("no dialog content found in host dialog")]
    NoDialogContent,

    /// Failed to parse configuration
    #[error("invalid dialog launch config: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for blinc_dialog operations
pub type Result<T> = std::result::Result<T, DialogLaunchError>;
