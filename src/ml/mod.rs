pub mod forest;
pub mod training;
pub mod inference;

pub use forest::{DecisionTree, ForestParams, Node, RandomForest};
pub use training::{fit, prepare_dataset, train_model, TrainingReport};
pub use inference::{Prediction, Predictor};
