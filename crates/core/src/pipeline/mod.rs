pub mod anonymization_session;
pub mod debouncer;
pub mod processing_error;
pub mod processing_orchestrator;
