pub mod growth;
pub mod incentive;
pub mod ranker;

pub use growth::*;
pub use incentive::*;
pub use ranker::*;
