use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use std::io::Cursor;

#[derive(Debug, Clone)]
pub enum Error {
    LoginError(String),
    ApiError(String),
    UnexpectedApiResponse,
    InvalidResponse(String, String),
    UnknownDevice(String),
    RateExceeded(String),
    FormatError,
    InternalError,
}

fn html(status: Status, body: String) -> response::Result<'static> {
    Response::build()
        .status(status)
        .sized_body(body.len(), Cursor::new(body))
        .header(ContentType::new("text", "html"))
        .ok()
}

impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        match self {
            Error::RateExceeded(s) => html(
                Status::TooManyRequests,
                format!("<html><body><h3>429 Too Many Requests</h3>Downstream API response: <code>{}</code></body></html>", s),
            ),
            Error::LoginError(s) => html(
                Status::Forbidden,
                format!("<html><body><h3>403 Forbidden</h3>Access token rejected by downstream API: <code>{}</code></body></html>", s),
            ),
            Error::UnknownDevice(s) => html(
                Status::NotFound,
                format!("<html><body><h3>404 Not Found</h3>No such device on gateway: <code>{}</code></body></html>", s),
            ),
            _ => html(
                Status::InternalServerError,
                format!(
                    "<html><body><h3>Unknown exception</h3><code>{:?}</code></body></html>",
                    self
                ),
            ),
        }
    }
}
