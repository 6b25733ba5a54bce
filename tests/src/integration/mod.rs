//! Integration flows across the subsystems.

#[cfg(test)]
mod support;

mod bus_flows;
mod catalog_flows;
mod membership_flows;
