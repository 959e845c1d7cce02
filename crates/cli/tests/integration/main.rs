mod clean_tests;
mod common;
mod install_tests;
mod status_tests;
