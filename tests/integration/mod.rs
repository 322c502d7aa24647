mod persistence_tests;
mod permission_tests;
