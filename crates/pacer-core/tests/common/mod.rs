pub mod scripted_runner;
