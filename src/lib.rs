//! Histalert - sustained regression detection for daily telemetry histograms
//!
//! For every metric, daily histograms are compared against a trailing reference
//! window with the Bhattacharyya distance. A day is reported when it and the
//! following days all differ from the window by a large and consistent margin.
//! Newly found regressions are recorded in a JSON ledger so later runs only flag
//! what is new.
//!
//! The detector itself ([`regression`]) works on in-memory series; [`batch`]
//! wires it to dump directories, probe metadata, plots and the ledger.

pub mod batch;
pub mod cli;
pub mod config;
pub mod ledger;
pub mod plot;
pub mod probes;
pub mod regression;
pub mod series;
