mod common;

mod completeness;
mod legacy;
mod registry;
mod routing;
mod scoring;
mod sweep;
