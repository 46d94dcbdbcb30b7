pub mod kill;
pub mod run;
