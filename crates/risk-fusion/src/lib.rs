//! Risk Fusion & Alert Decision Engine
//!
//! Merges the ocular state stream and the vitals classification stream into
//! one temporally stable risk level:
//! - Rate decoupling: consumes whatever latest value each producer has
//!   written, never blocks on either
//! - Staleness: vitals past their maximum age are treated as absent
//! - Severity combination: max() over the contributing levels
//! - Hysteresis: escalate fast, de-escalate slow
//!
//! The engine is a pure synchronous state reduction; it always produces an
//! assessment and has no failure states.

pub mod assessment;
pub mod engine;

pub use assessment::RiskAssessment;
pub use engine::{FusionConfig, FusionEngine};

pub use vitals_classifier::RiskLevel;
