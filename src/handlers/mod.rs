use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

pub mod auth;
pub mod contact;
pub mod health;
pub mod pages;
pub mod stats;

/// `Json` whose rejections use the API error shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Query` whose rejections use the API error shape.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
