pub mod init;
pub mod levels;
pub mod run;
pub mod summary;
pub mod validate;
