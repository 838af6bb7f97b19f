pub mod in_memory_user_repository;
pub mod user_repository;
