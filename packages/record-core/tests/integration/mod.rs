//! Integration test suite.
//!
//! Tests are organized by area:
//! 1. Record files written and read back through byte streams
//! 2. Record copying between layouts
//! 3. Schema XML and configuration loading

pub mod copier_tests;
pub mod end_to_end_tests;
pub mod helpers;
pub mod schema_xml_tests;
