pub mod agent;
pub mod errors;
pub mod project;
pub mod prompt;
pub mod providers;
pub mod session;
pub mod tools;
