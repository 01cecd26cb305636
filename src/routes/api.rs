use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use std::io::Write;
use std::sync::Arc;

use crate::naming::certificate_filename;
use crate::render::RenderedCertificate;
use crate::state::AppState;

use super::{attach_cookie, ensure_session};

fn attachment(content_type: &str, filename: &str, body: Vec<u8>) -> Response {
    axum::response::Response::builder()
        .header("Content-Type", content_type)
        .header(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(axum::body::Body::from(body))
        .unwrap()
        .into_response()
}

fn cached_render(state: &AppState, sid: &str) -> Option<(RenderedCertificate, String)> {
    state.sessions.with(sid, |s| {
        match (s.last_render.clone(), s.last_name.clone()) {
            (Some(r), Some(n)) => Some((r, n)),
            _ => None,
        }
    })
}

pub async fn download_png(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (sid, cookie) = ensure_session(&headers);
    let resp = match cached_render(&state, &sid) {
        Some((rendered, name)) => {
            attachment("image/png", &certificate_filename(&name, "png"), rendered.png)
        }
        None => Redirect::to("/").into_response(),
    };
    attach_cookie(resp, cookie)
}

pub async fn download_pdf(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (sid, cookie) = ensure_session(&headers);
    let resp = match cached_render(&state, &sid) {
        Some((rendered, name)) => attachment(
            "application/pdf",
            &certificate_filename(&name, "pdf"),
            rendered.pdf,
        ),
        None => Redirect::to("/").into_response(),
    };
    attach_cookie(resp, cookie)
}

/// Both formats in one zip, for people who will want them anyway.
pub async fn download_all(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (sid, cookie) = ensure_session(&headers);
    let Some((rendered, name)) = cached_render(&state, &sid) else {
        return attach_cookie(Redirect::to("/").into_response(), cookie);
    };

    let mut zip_data = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut zip_data));
        let options = zip::write::SimpleFileOptions::default().unix_permissions(0o644);

        let _ = zip.start_file(certificate_filename(&name, "png"), options);
        let _ = zip.write_all(&rendered.png);
        let _ = zip.start_file(certificate_filename(&name, "pdf"), options);
        let _ = zip.write_all(&rendered.pdf);
        let _ = zip.finish();
    }

    let download_name = format!("{}_certificate.zip", crate::naming::sanitize_download_stem(&name));
    attach_cookie(
        attachment("application/zip", &download_name, zip_data),
        cookie,
    )
}

/// Inline PNG of the last render, for the preview <img> on the user page.
pub async fn preview_png(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (sid, cookie) = ensure_session(&headers);
    let resp = match cached_render(&state, &sid) {
        Some((rendered, _)) => axum::response::Response::builder()
            .header("Content-Type", "image/png")
            .body(axum::body::Body::from(rendered.png))
            .unwrap()
            .into_response(),
        None => Redirect::to("/").into_response(),
    };
    attach_cookie(resp, cookie)
}

/// The raw stored template, for the admin preview. Bytes are stored verbatim
/// so the content type is sniffed from the data itself.
pub async fn template_png(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (sid, cookie) = ensure_session(&headers);
    let template = state.sessions.with(&sid, |s| s.template.clone());
    let resp = match template {
        Some(bytes) => {
            let content_type = match image::guess_format(&bytes) {
                Ok(image::ImageFormat::Png) => "image/png",
                Ok(image::ImageFormat::Jpeg) => "image/jpeg",
                _ => "application/octet-stream",
            };
            axum::response::Response::builder()
                .header("Content-Type", content_type)
                .body(axum::body::Body::from(bytes))
                .unwrap()
                .into_response()
        }
        None => Redirect::to("/admin").into_response(),
    };
    attach_cookie(resp, cookie)
}

pub async fn session_status(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (sid, cookie) = ensure_session(&headers);
    let body = state.sessions.with(&sid, |s| {
        serde_json::json!({
            "authenticated": s.authenticated,
            "has_template": s.template.is_some(),
            "has_font": s.font.is_some(),
            "name_x": s.name_x,
            "name_y": s.name_y,
            "font_size": s.font_size,
            "font_color": s.font_color,
            "has_render": s.last_render.is_some(),
        })
    });
    attach_cookie(axum::Json(body).into_response(), cookie)
}
