use std::sync::OnceLock;
use tera::Tera;

static TERA: OnceLock<Tera> = OnceLock::new();

/// The two pages are compiled in so the binary runs from any working
/// directory; a `templates/` dir next to the binary overrides them for
/// styling tweaks without a rebuild.
pub fn get_tera() -> &'static Tera {
    TERA.get_or_init(|| {
        let mut tera = Tera::default();
        tera.add_raw_templates([
            ("index.html", include_str!("../templates/index.html")),
            ("admin.html", include_str!("../templates/admin.html")),
        ])
        .expect("built-in templates must parse");

        let override_dir = std::path::Path::new("templates");
        if override_dir.exists() {
            if let Ok(entries) = std::fs::read_dir(override_dir) {
                let files = entries
                    .filter_map(Result::ok)
                    .filter(|e| e.path().extension().map_or(false, |ext| ext == "html"))
                    .filter_map(|e| {
                        let name = e.path().file_name()?.to_str()?.to_string();
                        Some((e.path(), Some(name)))
                    })
                    .collect::<Vec<_>>();
                if let Err(err) = tera.add_template_files(files) {
                    tracing::warn!("ignoring unparseable template overrides: {}", err);
                }
            }
        }
        tera
    })
}
