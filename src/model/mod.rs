pub mod config;
pub mod label_encoder;
pub mod model_metadata;
pub mod model_storage;

pub use config::{AppConfig, ImageMode, ImageSettings, ModelSettings, QuizSettings, TrainingSettings};
pub use label_encoder::LabelEncoder;
pub use model_metadata::ModelMetadata;
pub use model_storage::{
    load_label_encoder, load_metadata, load_model_with_metadata, print_metadata_info,
    save_label_encoder, save_model_with_metadata,
};
