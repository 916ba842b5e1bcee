pub mod main;
pub mod session;

#[cfg(test)]
mod main_test;
