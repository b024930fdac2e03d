/*
 * Responsibility
 * - v1 の HTTP 面: DTO, extractor, handler, URL 構造
 */
pub mod dto;
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::routes;
