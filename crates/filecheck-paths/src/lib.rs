pub mod repair;
pub mod unc;

pub use repair::PathRepairer;
pub use unc::to_unc;
