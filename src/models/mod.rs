pub mod account;
pub mod generation;
pub mod model_info;

pub use account::*;
pub use generation::*;
pub use model_info::*;
