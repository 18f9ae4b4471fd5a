pub mod defaults;
pub mod logging;
