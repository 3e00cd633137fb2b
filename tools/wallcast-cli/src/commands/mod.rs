pub mod confcheck;
pub mod run;
