pub mod analysis;
pub mod note;

pub use analysis::{
    AnalysisDetail, AnalysisRecord, AnalysisSummary, NewAnalysis, WordFrequency, PREVIEW_CHARS,
};
pub use note::{Note, NoteInput};
