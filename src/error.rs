use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChartError>;

/// Failures while turning a payload into a [`crate::game::chart::ChartData`],
/// or while exporting one.
///
/// Load failures are fatal for the load that produced them but leave the
/// session usable: a later load with valid data replaces the error state.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("malformed chart payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("chart metadata is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("note {index} sits on panel {panel}, outside the 10-panel pad")]
    InvalidPanel { index: usize, panel: u8 },

    #[error("note {index} has a non-finite or out-of-range time")]
    InvalidTime { index: usize },

    #[error("failed to read chart: {0}")]
    Io(#[from] std::io::Error),

    #[error("no chart is loaded")]
    NotLoaded,
}
