/*
 * Responsibility
 * - middleware の入口
 * - auth (route ごとの permission gate), cors, http (request id / trace / limit), security headers
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
