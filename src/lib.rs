//! Gemini CLI telemetry, reconstructed from the OpenTelemetry collector's
//! debug log.
pub mod collector;
pub mod config;
pub mod discovery;
pub mod report;
