#![deny(warnings)]

pub mod completion;
pub mod config;
pub mod controller;
pub mod form;
pub mod markup;
pub mod options;
pub mod prompt;
