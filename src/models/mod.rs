//! 数据模型模块

pub mod analysis;
pub mod snapshot;

pub use analysis::{
    AggregateAnalysis, AnalysisData, ErrorCorrelation, IndividualAssessment, OverallAssessment,
    PotentialMisconception, TopError,
};
pub use snapshot::CodeSnapshot;
