mod check;
mod eval;
mod generate;

pub use check::cmd_check;
pub use eval::cmd_eval;
pub use generate::{GenerateArgs, cmd_generate};
