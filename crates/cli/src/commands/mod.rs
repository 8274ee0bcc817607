//! CLI Commands

pub mod compare;
pub mod convert;
pub mod init;
pub mod show;
