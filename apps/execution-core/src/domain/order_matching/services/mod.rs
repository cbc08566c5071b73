//! Order Matching Services

mod report_matcher;

pub use report_matcher::ReportMatcher;
