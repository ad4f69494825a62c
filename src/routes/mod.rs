/**
 * Routes Module
 * API route handlers
 */
pub mod auth;
pub mod blog;
pub mod contact;
pub mod health;
pub mod messages;
pub mod pages;
pub mod rss;
pub mod services;
pub mod upload;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

/// Success response (for delete)
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}
