use serde::{Deserialize, Serialize};

use crate::population::VectorPopulation;
use crate::Result;

/// What a trainer hands back: where the model went and how good it looked.
/// Both fields are opaque to the monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrainingResult {
    pub artifact: String,
    pub accuracy: f64,
}

/// Model-fitting capability invoked after a drift decision.
///
/// Implementations own their algorithm and their source of supervision;
/// the monitor only passes the merged population in.
pub trait ModelTrainer {
    fn train(&self, population: &VectorPopulation) -> Result<RetrainingResult>;
}

/// Adapts a closure into a [`ModelTrainer`]
pub struct FnTrainer<F>(pub F);

impl<F> ModelTrainer for FnTrainer<F>
where
    F: Fn(&VectorPopulation) -> Result<RetrainingResult>,
{
    fn train(&self, population: &VectorPopulation) -> Result<RetrainingResult> {
        (self.0)(population)
    }
}

impl<T: ModelTrainer + ?Sized> ModelTrainer for Box<T> {
    fn train(&self, population: &VectorPopulation) -> Result<RetrainingResult> {
        (**self).train(population)
    }
}
