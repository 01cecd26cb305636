use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;
use tera::Context;

use crate::naming::certificate_filename;
use crate::state::AppState;

use super::{attach_cookie, ensure_session};

#[derive(Deserialize, Default)]
pub struct FlashParams {
    pub error: Option<String>,
    pub notice: Option<String>,
    pub generated: Option<u8>,
}

fn error_message(code: &str) -> &'static str {
    match code {
        "missing_template" => {
            "No certificate template uploaded yet. Please ask the admin to upload one first."
        }
        "empty_name" => "Please enter your name!",
        "render_failed" => {
            "An error occurred while generating the certificate. \
             Please check the template and font files and try again."
        }
        "bad_password" => "Incorrect password!",
        "empty_upload" => "The uploaded file was empty.",
        _ => "Something went wrong.",
    }
}

fn notice_message(code: &str) -> &'static str {
    match code {
        "logged_in" => "Logged in successfully!",
        "logged_out" => "Logged out successfully!",
        "template_uploaded" => "Template uploaded and stored!",
        "template_removed" => "Template removed!",
        "font_uploaded" => "Font uploaded!",
        "settings_saved" => "Settings saved!",
        "reset" => "Settings reset to defaults!",
        _ => "Done.",
    }
}

fn insert_flash(ctx: &mut Context, params: &FlashParams) {
    if let Some(code) = params.error.as_deref() {
        ctx.insert("error", error_message(code));
    }
    if let Some(code) = params.notice.as_deref() {
        ctx.insert("notice", notice_message(code));
    }
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FlashParams>,
    headers: HeaderMap,
) -> Response {
    let (sid, cookie) = ensure_session(&headers);

    let (has_template, last_name, warnings) = state.sessions.with(&sid, |s| {
        (
            s.template.is_some(),
            s.last_name.clone(),
            s.last_render
                .as_ref()
                .map(|r| r.warnings.clone())
                .unwrap_or_default(),
        )
    });

    let mut ctx = Context::new();
    ctx.insert("has_template", &has_template);
    insert_flash(&mut ctx, &params);

    let generated = params.generated == Some(1) && last_name.is_some();
    ctx.insert("generated", &generated);
    if generated {
        let name = last_name.unwrap_or_default();
        ctx.insert("recipient_name", &name);
        ctx.insert("png_filename", &certificate_filename(&name, "png"));
        ctx.insert("pdf_filename", &certificate_filename(&name, "pdf"));
        ctx.insert("render_warnings", &warnings);
    }

    attach_cookie(render_template("index.html", ctx), cookie)
}

#[derive(Deserialize)]
pub struct GenerateForm {
    pub full_name: String,
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<GenerateForm>,
) -> Response {
    let (sid, cookie) = ensure_session(&headers);

    let session = state.sessions.with(&sid, |s| s.clone());
    if session.template.is_none() {
        return attach_cookie(
            Redirect::to("/?error=missing_template").into_response(),
            cookie,
        );
    }

    let name = form.full_name.trim().to_string();
    if name.is_empty() {
        return attach_cookie(Redirect::to("/?error=empty_name").into_response(), cookie);
    }

    match crate::render::render(&session, &name) {
        Ok(rendered) => {
            tracing::info!(
                recipient = %name,
                width = rendered.width,
                height = rendered.height,
                "certificate generated"
            );
            state.sessions.with(&sid, |s| s.cache_render(name, rendered));
            attach_cookie(Redirect::to("/?generated=1").into_response(), cookie)
        }
        Err(e) => {
            tracing::error!("certificate render failed: {}", e);
            attach_cookie(Redirect::to("/?error=render_failed").into_response(), cookie)
        }
    }
}

pub async fn admin(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FlashParams>,
    headers: HeaderMap,
) -> Response {
    let (sid, cookie) = ensure_session(&headers);

    let mut ctx = Context::new();
    state.sessions.with(&sid, |s| {
        ctx.insert("authenticated", &s.authenticated);
        ctx.insert("has_template", &s.template.is_some());
        ctx.insert("has_font", &s.font.is_some());
        ctx.insert("name_x", &s.name_x);
        ctx.insert("name_y", &s.name_y);
        ctx.insert("font_size", &s.font_size);
        ctx.insert("font_color", &s.font_color);
    });
    ctx.insert(
        "default_password_in_use",
        &state.config.admin_password_is_default,
    );
    insert_flash(&mut ctx, &params);

    attach_cookie(render_template("admin.html", ctx), cookie)
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let (sid, cookie) = ensure_session(&headers);
    let ok = state
        .sessions
        .with(&sid, |s| s.authenticate(&form.password, &state.config.admin_password));

    let target = if ok {
        tracing::info!("admin authenticated");
        "/admin?notice=logged_in"
    } else {
        tracing::info!("admin authentication rejected");
        "/admin?error=bad_password"
    };
    attach_cookie(Redirect::to(target).into_response(), cookie)
}

pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (sid, cookie) = ensure_session(&headers);
    state.sessions.with(&sid, |s| s.logout());
    attach_cookie(
        Redirect::to("/admin?notice=logged_out").into_response(),
        cookie,
    )
}

pub async fn upload_template(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: axum::extract::Multipart,
) -> Response {
    upload_blob(state, headers, multipart, "template").await
}

pub async fn upload_font(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: axum::extract::Multipart,
) -> Response {
    upload_blob(state, headers, multipart, "font").await
}

/// Shared multipart handling for the two admin uploads. Bytes are stored
/// verbatim; whether they decode is only discovered at render time.
async fn upload_blob(
    state: Arc<AppState>,
    headers: HeaderMap,
    mut multipart: axum::extract::Multipart,
    field_name: &str,
) -> Response {
    let (sid, cookie) = ensure_session(&headers);

    if !state.sessions.with(&sid, |s| s.authenticated) {
        return attach_cookie(Redirect::to("/admin").into_response(), cookie);
    }

    let mut data: Option<Vec<u8>> = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some(field_name) {
            if let Ok(bytes) = field.bytes().await {
                data = Some(bytes.to_vec());
            }
        }
    }

    let target = match data {
        Some(bytes) if !bytes.is_empty() => {
            tracing::info!(kind = field_name, bytes = bytes.len(), "admin upload stored");
            state.sessions.with(&sid, |s| match field_name {
                "font" => s.set_font(bytes),
                _ => s.set_template(bytes),
            });
            if field_name == "font" {
                "/admin?notice=font_uploaded"
            } else {
                "/admin?notice=template_uploaded"
            }
        }
        _ => "/admin?error=empty_upload",
    };
    attach_cookie(Redirect::to(target).into_response(), cookie)
}

pub async fn remove_template(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (sid, cookie) = ensure_session(&headers);
    if !state.sessions.with(&sid, |s| s.authenticated) {
        return attach_cookie(Redirect::to("/admin").into_response(), cookie);
    }
    state.sessions.with(&sid, |s| s.remove_template());
    attach_cookie(
        Redirect::to("/admin?notice=template_removed").into_response(),
        cookie,
    )
}

#[derive(Deserialize)]
pub struct SettingsForm {
    pub name_x: i64,
    pub name_y: i64,
    pub font_size: i64,
    pub font_color: String,
}

fn valid_hex_color(s: &str) -> bool {
    s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

pub async fn save_settings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<SettingsForm>,
) -> Response {
    let (sid, cookie) = ensure_session(&headers);
    if !state.sessions.with(&sid, |s| s.authenticated) {
        return attach_cookie(Redirect::to("/admin").into_response(), cookie);
    }

    // The store itself does not re-validate; the route layer is the UI and
    // clamps to the documented ranges.
    let x = form.name_x.clamp(0, 2000) as u32;
    let y = form.name_y.clamp(0, 2000) as u32;
    let size = form.font_size.clamp(50, 500) as u32;

    state.sessions.with(&sid, |s| {
        s.set_position(x, y);
        s.set_font_size(size);
        if valid_hex_color(&form.font_color) {
            s.set_font_color(form.font_color.clone());
        }
    });
    attach_cookie(
        Redirect::to("/admin?notice=settings_saved").into_response(),
        cookie,
    )
}

pub async fn reset_settings(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (sid, cookie) = ensure_session(&headers);
    if !state.sessions.with(&sid, |s| s.authenticated) {
        return attach_cookie(Redirect::to("/admin").into_response(), cookie);
    }
    state.sessions.with(&sid, |s| s.reset_to_defaults());
    attach_cookie(Redirect::to("/admin?notice=reset").into_response(), cookie)
}

fn render_template(name: &str, ctx: Context) -> Response {
    let tera = crate::templates::get_tera();
    let rendered = tera
        .render(name, &ctx)
        .unwrap_or_else(|_| format!("Template error: {}", name));
    Html(rendered).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_color_validation() {
        assert!(valid_hex_color("#000000"));
        assert!(valid_hex_color("#AbCdEf"));
        assert!(!valid_hex_color("000000"));
        assert!(!valid_hex_color("#00"));
        assert!(!valid_hex_color("#gggggg"));
    }

    #[test]
    fn flash_codes_have_messages() {
        assert!(error_message("empty_name").contains("name"));
        assert!(error_message("render_failed").contains("try again"));
        assert!(notice_message("reset").contains("defaults"));
        // Unknown codes degrade to a generic line instead of panicking.
        assert!(!error_message("nonsense").is_empty());
    }
}
