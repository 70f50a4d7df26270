pub mod cli;
pub mod io;
