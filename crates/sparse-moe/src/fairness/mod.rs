//! Load-fairness signal derived from a routing decision.
//!
//! Two skews are measured per batch:
//!
//! - **importance**: total gate mass each expert received
//! - **load**: how many units each expert received (counted or expected)
//!
//! Both are reduced with the squared coefficient of variation and summed.
//! The result is zero when every expert is used equally and grows as
//! routing collapses onto a few experts.

mod monitor;


pub use monitor::{cv_squared, imbalance, FairnessReport, CV_EPSILON};
