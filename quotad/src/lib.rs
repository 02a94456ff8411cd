pub mod cli;
pub mod config;
pub mod rest;
pub mod server;
pub mod service;
pub mod session;
pub mod storage;
