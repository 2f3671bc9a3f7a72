pub mod calendar;
pub mod dashboard;
pub mod dates;
pub mod filter;
pub mod search;
pub mod text;
pub mod views;
