pub mod cli;
pub mod options;
pub mod run;
