pub mod args;
pub mod docker;
pub mod env_export;
pub mod error;
pub mod fs_util;
pub mod logging;
pub mod output;
pub mod privilege;
pub mod runner;
pub mod serve;
pub mod tool_dir;
