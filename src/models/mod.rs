pub mod artifact;
pub mod dashboard;
pub mod document;
pub mod extraction;
pub mod profile;
pub mod subject;
pub mod submission;

pub use artifact::{
    ArtifactBody, ArtifactMetadata, ContentKind, Difficulty, Engagement, GameSpec, GameType,
    GeneratedArtifact, QuizSpec, ReviewSpec, ScorableQuestion,
};
pub use dashboard::{DashboardReport, RecentActivity};
pub use document::{Document, DocumentStatusReport, GeneratedContentRefs, ProcessingStatus};
pub use extraction::{ExtractionMethod, ExtractionReport, ExtractionResult, QualityReport};
pub use profile::LearningProfile;
pub use subject::Subject;
pub use submission::{AnswerSubmission, Feedback, ProgressSubmit, SubmissionResult};
