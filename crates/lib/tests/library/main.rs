mod common;
mod command_tests;
mod graph_tests;
