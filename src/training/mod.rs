//! Training data collaborator: store listing, statistics and Modelfile output

pub mod modelfile;
pub mod store;

pub use modelfile::{write_modelfile, KnowledgePair};
pub use store::{
    collect_stats, list_training_files, DataFormat, DatasetStats, RecordCount, TrainingFile,
    TrainingFilePattern,
};
