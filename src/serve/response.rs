//! HTTP response handlers.

use super::content::{ReloadScript, inject_reload_script};
use super::path::{ResolveError, ResolvedFile};
use crate::utils::mime::types::{JAVASCRIPT, PLAIN};
use anyhow::Result;
use std::fs;
use tiny_http::{Header, Method, Request, Response, StatusCode};

/// Respond with a resolved file, injecting the reload script into HTML.
///
/// Non-HTML files are streamed untouched. A file that vanished since it was
/// resolved is answered with 404.
pub fn respond_file(request: Request, file: &ResolvedFile, script: &ReloadScript) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 200, file.content_type);
    }

    if file.inject {
        let Ok(body) = fs::read(&file.path) else {
            return respond_error(request, ResolveError::NotFound);
        };
        let body = inject_reload_script(&body, script.tag());
        return send_body(request, 200, file.content_type, body);
    }

    let Ok(handle) = fs::File::open(&file.path) else {
        return respond_error(request, ResolveError::NotFound);
    };
    let response =
        Response::from_file(handle).with_header(make_header("Content-Type", file.content_type));
    request.respond(response)?;
    Ok(())
}

/// Respond with 404 or 403, without disclosing anything about the target.
pub fn respond_error(request: Request, error: ResolveError) -> Result<()> {
    let body = match error {
        ResolveError::NotFound => "404 Not Found",
        ResolveError::Forbidden => "403 Forbidden",
    };

    if is_head_request(&request) {
        return send_head(request, error.status(), PLAIN);
    }
    send_body(request, error.status(), PLAIN, body.as_bytes().to_vec())
}

/// Respond with the reload script from memory.
pub fn respond_reload_js(request: Request, script: &ReloadScript) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 200, JAVASCRIPT);
    }
    send_body(request, 200, JAVASCRIPT, script.js().as_bytes().to_vec())
}

/// Respond with 405 for anything other than GET/HEAD.
pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    let response = Response::from_data(b"405 Method Not Allowed".to_vec())
        .with_status_code(StatusCode(405))
        .with_header(make_header("Content-Type", PLAIN))
        .with_header(make_header("Allow", "GET, HEAD"));
    request.respond(response)?;
    Ok(())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response = Response::empty(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}
