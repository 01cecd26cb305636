use std::collections::HashMap;
use std::sync::Mutex;

use crate::render::RenderedCertificate;

pub const DEFAULT_NAME_X: u32 = 750;
pub const DEFAULT_NAME_Y: u32 = 704;
pub const DEFAULT_FONT_SIZE: u32 = 60;
pub const DEFAULT_FONT_COLOR: &str = "#000000";

/// Per-user admin configuration plus the most recent render. One instance per
/// session cookie, in memory only; everything is lost on restart.
#[derive(Debug, Clone)]
pub struct Session {
    pub authenticated: bool,
    pub template: Option<Vec<u8>>,
    pub font: Option<Vec<u8>>,
    pub name_x: u32,
    pub name_y: u32,
    pub font_size: u32,
    pub font_color: String,
    pub last_render: Option<RenderedCertificate>,
    pub last_name: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            authenticated: false,
            template: None,
            font: None,
            name_x: DEFAULT_NAME_X,
            name_y: DEFAULT_NAME_Y,
            font_size: DEFAULT_FONT_SIZE,
            font_color: DEFAULT_FONT_COLOR.to_string(),
            last_render: None,
            last_name: None,
        }
    }
}

impl Session {
    pub fn authenticate(&mut self, password: &str, admin_password: &str) -> bool {
        if password == admin_password {
            self.authenticated = true;
        }
        self.authenticated
    }

    /// Bytes are stored verbatim; a template that fails to decode surfaces
    /// later, at render time.
    pub fn set_template(&mut self, bytes: Vec<u8>) {
        self.template = Some(bytes);
    }

    pub fn set_font(&mut self, bytes: Vec<u8>) {
        self.font = Some(bytes);
    }

    pub fn set_position(&mut self, x: u32, y: u32) {
        self.name_x = x;
        self.name_y = y;
    }

    pub fn set_font_size(&mut self, size: u32) {
        self.font_size = size;
    }

    pub fn set_font_color(&mut self, hex: String) {
        self.font_color = hex;
    }

    /// Restores position and styling only; template, font, authentication
    /// and the cached render stay as they are.
    pub fn reset_to_defaults(&mut self) {
        self.name_x = DEFAULT_NAME_X;
        self.name_y = DEFAULT_NAME_Y;
        self.font_size = DEFAULT_FONT_SIZE;
        self.font_color = DEFAULT_FONT_COLOR.to_string();
    }

    pub fn remove_template(&mut self) {
        self.template = None;
        // A cached render can no longer be regenerated without its template.
        self.last_render = None;
        self.last_name = None;
    }

    pub fn logout(&mut self) {
        *self = Session::default();
    }

    pub fn cache_render(&mut self, name: String, rendered: RenderedCertificate) {
        self.last_name = Some(name);
        self.last_render = Some(rendered);
    }
}

/// In-memory session map keyed by the session cookie. Handlers run a closure
/// under the lock; nothing async happens while it is held.
#[derive(Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R>(&self, id: &str, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let session = map.entry(id.to_string()).or_default();
        f(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let s = Session::default();
        assert!(!s.authenticated);
        assert!(s.template.is_none());
        assert!(s.font.is_none());
        assert_eq!(
            (s.name_x, s.name_y, s.font_size, s.font_color.as_str()),
            (750, 704, 60, "#000000")
        );
    }

    #[test]
    fn authenticate_checks_password() {
        let mut s = Session::default();
        assert!(!s.authenticate("wrong", "secret"));
        assert!(!s.authenticated);
        assert!(s.authenticate("secret", "secret"));
        assert!(s.authenticated);
    }

    #[test]
    fn reset_restores_styling_but_keeps_uploads() {
        let mut s = Session::default();
        s.authenticate("p", "p");
        s.set_template(vec![1, 2, 3]);
        s.set_font(vec![4, 5]);
        s.set_position(10, 20);
        s.set_font_size(300);
        s.set_font_color("#ff0000".to_string());

        s.reset_to_defaults();

        assert_eq!(
            (s.name_x, s.name_y, s.font_size, s.font_color.as_str()),
            (750, 704, 60, "#000000")
        );
        assert!(s.authenticated);
        assert_eq!(s.template.as_deref(), Some(&[1u8, 2, 3][..]));
        assert_eq!(s.font.as_deref(), Some(&[4u8, 5][..]));
    }

    #[test]
    fn logout_clears_everything() {
        let mut s = Session::default();
        s.authenticate("p", "p");
        s.set_template(vec![1]);
        s.set_font(vec![2]);
        s.set_position(1, 2);

        s.logout();

        assert!(!s.authenticated);
        assert!(s.template.is_none());
        assert!(s.font.is_none());
        assert_eq!(s.name_x, DEFAULT_NAME_X);
        assert_eq!(s.name_y, DEFAULT_NAME_Y);
    }

    #[test]
    fn remove_template_drops_cached_render() {
        let mut s = Session::default();
        s.set_template(vec![1]);
        s.cache_render(
            "Jane".to_string(),
            RenderedCertificate {
                png: vec![1],
                pdf: vec![2],
                width: 1,
                height: 1,
                warnings: vec![],
            },
        );
        s.remove_template();
        assert!(s.template.is_none());
        assert!(s.last_render.is_none());
        assert!(s.last_name.is_none());
    }

    #[test]
    fn store_creates_sessions_on_first_touch() {
        let store = SessionStore::new();
        store.with("a", |s| s.set_position(1, 2));
        let (x, y) = store.with("a", |s| (s.name_x, s.name_y));
        assert_eq!((x, y), (1, 2));
        // A different id sees fresh defaults.
        let x = store.with("b", |s| s.name_x);
        assert_eq!(x, DEFAULT_NAME_X);
    }
}
