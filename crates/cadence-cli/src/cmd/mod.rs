pub mod advance;
pub mod backup;
pub mod init;
pub mod lifecycle;
pub mod post_tool;
pub mod pre_tool;
pub mod sprint;
pub mod state;
