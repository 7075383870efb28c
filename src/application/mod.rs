pub mod task_service;
mod task_service_tests;
