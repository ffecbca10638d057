mod cache_tests;
mod common;
mod lock_tests;
