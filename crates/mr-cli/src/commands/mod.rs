//! CLI command implementations

pub(crate) mod common;
pub(crate) mod init;
pub(crate) mod run;
pub(crate) mod status;
