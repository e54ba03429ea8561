pub mod answers_repository;
pub mod comments_repository;
pub mod questions_repository;
pub mod reactions_repository;
