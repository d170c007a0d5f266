pub mod problem;
pub mod repair;
pub mod surrogate;

pub use problem::Problem;
pub use repair::RepairPolicy;
pub use surrogate::{SurrogateFit, SurrogateProblem};
