//! Conductor: terminal administration console of the music school.
//!
//! The screens in [`screens`] describe their records as form descriptors; the
//! [`form_engine`] crate runs the forms; [`components::form_popup`] draws them.
pub mod action;
pub mod app;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod components;
pub mod config;
pub mod errors;
pub mod logging;
pub mod screens;
pub mod store;
pub mod theme;
pub mod tui;
