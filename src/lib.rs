pub mod backend;
pub mod clock;
pub mod config;
pub mod eligibility;
pub mod exchange;
pub mod fetch;
pub mod infra;
pub mod linecheck;
pub mod output;
pub mod report;
pub mod store;
