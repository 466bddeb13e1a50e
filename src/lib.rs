//! Query Umbrella deployment-status reports and render them as a Markdown table.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod formatters;
pub mod request;
pub mod timespec;
pub mod types;

pub use client::{HttpTransport, RawResponse, ReportClient, Transport};
pub use config::{ConfigProvider, Settings};
pub use error::ReportError;
pub use request::{HttpRequest, ReportRequest, ReportRequestBuilder};
pub use timespec::{TimeRange, TimeSpec, parse_time_expression};
pub use types::{ReportResult, ReportRow};
