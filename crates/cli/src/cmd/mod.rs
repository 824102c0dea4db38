mod eval;
mod info;
mod plan;

pub use eval::cmd_eval;
pub use info::cmd_info;
pub use plan::cmd_plan;
