//! Classification of documents with a trained model.

pub mod multinomial;
pub mod prediction;
pub mod traits;

pub use multinomial::*;
pub use prediction::*;
pub use traits::*;
