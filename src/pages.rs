use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate;

#[derive(Template)]
#[template(path = "message.html")]
struct MessageTemplate;

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    code: u16,
    reason: String,
    message: String,
}

pub async fn index() -> impl IntoResponse {
    Html(IndexTemplate.render().unwrap_or_default())
}

pub async fn message() -> impl IntoResponse {
    Html(MessageTemplate.render().unwrap_or_default())
}

pub async fn not_found() -> Response {
    error_page(
        StatusCode::NOT_FOUND,
        "The page you are looking for does not exist.".to_string(),
    )
}

pub fn error_page(status: StatusCode, message: String) -> Response {
    let template = ErrorTemplate {
        code: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Error").to_string(),
        message,
    };
    (status, Html(template.render().unwrap_or_default())).into_response()
}
