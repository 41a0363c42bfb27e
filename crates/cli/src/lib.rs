// checkcell CLI library: rendering shared by the binary and its tests

pub mod exit_codes;
pub mod render;
mod util;
