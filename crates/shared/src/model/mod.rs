mod exercise;
pub use exercise::*;

mod clock;
pub use clock::*;

use crate::error::ValidationError;

pub trait ValidateModel {
    fn validate(&self) -> Result<(), ValidationError>;
}
