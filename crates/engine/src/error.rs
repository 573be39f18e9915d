use thiserror::Error;

/// Why one attempt was abandoned. Never surfaces as an `Err` to callers: the
/// last one ends up in the failure message of an exhausted run.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("placement exhausted: {stage} lab '{lab}' in section {section} after {attempts} attempts")]
    LabExhausted {
        stage: &'static str,
        lab: String,
        section: String,
        attempts: u32,
    },
    #[error("placement exhausted: {remaining} batch sessions left unplaced in section {section} after {draws} draws")]
    BatchDrawsExhausted {
        section: String,
        remaining: usize,
        draws: u32,
    },
    #[error("elective '{name}' placed {placed} of {required} times")]
    ElectiveShortfall {
        name: String,
        placed: u32,
        required: u32,
    },
    #[error("subject '{name}' placed {placed} of {required} times in section {section}")]
    SubjectShortfall {
        name: String,
        section: String,
        placed: u32,
        required: u32,
    },
}
