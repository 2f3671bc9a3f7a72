pub mod data;
pub mod hosts;
pub mod info;
pub mod resolve;
pub mod settings;
pub mod speakers;
pub mod sync;
pub mod templates;
pub mod views;
pub mod visits;
