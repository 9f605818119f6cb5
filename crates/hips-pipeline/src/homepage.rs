//! Viewer index pages.
//!
//! A template is plain HTML with one insertion token; the double-view
//! template carries a second token for the right-hand viewer.

use hips_common::{fs, log_info, HipsError, HipsResult, Logger, PageTemplates};
use std::path::{Path, PathBuf};

/// Insertion point for the primary viewer's layers.
pub const MAP_CODE_TOKEN: &str = "$INSERT_MAP_CODE_HERE$";

/// Insertion point for the second viewer of the double-view page.
pub const MAP_CODE_TOKEN_2: &str = "$INSERT_MAP_CODE_HERE_2$";

pub const INDEX_PAGE: &str = "index.html";
pub const DOUBLE_INDEX_PAGE: &str = "index_double.html";

/// One published survey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLayer {
    pub tag: String,
    /// Tile directory, relative to the page.
    pub hips_dir: String,
}

impl IndexLayer {
    pub fn new(tag: impl Into<String>, hips_dir: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            hips_dir: hips_dir.into(),
        }
    }
}

/// Templates read and checked for their tokens.
#[derive(Debug, Clone)]
pub struct LoadedTemplates {
    single: String,
    double: Option<String>,
}

impl LoadedTemplates {
    pub fn load(templates: &PageTemplates) -> HipsResult<Self> {
        let single = read_template(&templates.template)?;
        require_token(&single, MAP_CODE_TOKEN, &templates.template)?;

        let double = match &templates.double_view_template {
            Some(path) => {
                let text = read_template(path)?;
                require_token(&text, MAP_CODE_TOKEN, path)?;
                require_token(&text, MAP_CODE_TOKEN_2, path)?;
                Some(text)
            }
            None => None,
        };
        Ok(Self { single, double })
    }

    pub fn from_strings(single: impl Into<String>, double: Option<String>) -> HipsResult<Self> {
        let single = single.into();
        require_token(&single, MAP_CODE_TOKEN, Path::new("<single template>"))?;
        if let Some(text) = &double {
            let origin = Path::new("<double template>");
            require_token(text, MAP_CODE_TOKEN, origin)?;
            require_token(text, MAP_CODE_TOKEN_2, origin)?;
        }
        Ok(Self { single, double })
    }

    pub fn render_single(&self, layers: &[IndexLayer]) -> String {
        splice(&self.single, &[(MAP_CODE_TOKEN, layer_code(layers, "aladin", ""))])
    }

    pub fn render_double(&self, layers: &[IndexLayer]) -> Option<String> {
        self.double.as_ref().map(|template| {
            splice(
                template,
                &[
                    (MAP_CODE_TOKEN, layer_code(layers, "aladin", "")),
                    (MAP_CODE_TOKEN_2, layer_code(layers, "aladin2", "_2")),
                ],
            )
        })
    }
}

/// Write `index.html` (and `index_double.html` when configured) under
/// `output_root`. Returns the written paths.
pub fn write_index_pages(
    output_root: &Path,
    layers: &[IndexLayer],
    templates: &LoadedTemplates,
    logger: &dyn Logger,
) -> HipsResult<Vec<PathBuf>> {
    let mut written = Vec::new();

    let index = output_root.join(INDEX_PAGE);
    fs::write_atomic(&index, templates.render_single(layers).as_bytes())?;
    log_info!(logger, "wrote {} with {} layers", index.display(), layers.len());
    written.push(index);

    if let Some(page) = templates.render_double(layers) {
        let index = output_root.join(DOUBLE_INDEX_PAGE);
        fs::write_atomic(&index, page.as_bytes())?;
        log_info!(logger, "wrote {}", index.display());
        written.push(index);
    }
    Ok(written)
}

/// JavaScript registering every layer with `viewer`.
pub fn layer_code(layers: &[IndexLayer], viewer: &str, suffix: &str) -> String {
    let mut code = String::new();
    for (i, layer) in layers.iter().enumerate() {
        let tag = escape_js(&layer.tag);
        code.push_str(&format!(
            "var hipsDir{i}{suffix} = '{}';\n",
            escape_js(&layer.hips_dir)
        ));
        code.push_str(&format!(
            "var survey{i}{suffix} = {viewer}.createImageSurvey('{tag}', '{tag}', hipsDir{i}{suffix}, 'equatorial', 3, {{imgFormat: 'png'}});\n"
        ));
    }
    code
}

/// Escape for a single-quoted JavaScript string inside a `<script>` block.
pub fn escape_js(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '<' if chars.peek() == Some(&'/') => out.push_str("<\\"),
            c => out.push(c),
        }
    }
    out
}

/// Replace the first occurrence of each token, located in the unmodified
/// template so inserted code is never rescanned.
fn splice(template: &str, inserts: &[(&str, String)]) -> String {
    let mut positions: Vec<(usize, usize, &str)> = inserts
        .iter()
        .filter_map(|(token, code)| template.find(token).map(|at| (at, token.len(), code.as_str())))
        .collect();
    positions.sort_by_key(|(at, _, _)| *at);

    let mut out = String::with_capacity(template.len() + inserts.iter().map(|(_, c)| c.len()).sum::<usize>());
    let mut cursor = 0;
    for (at, len, code) in positions {
        out.push_str(&template[cursor..at]);
        out.push_str(code);
        cursor = at + len;
    }
    out.push_str(&template[cursor..]);
    out
}

fn read_template(path: &Path) -> HipsResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| HipsError::config(format!("cannot read page template {}: {}", path.display(), e)))
}

fn require_token(template: &str, token: &str, origin: &Path) -> HipsResult<()> {
    if template.contains(token) {
        Ok(())
    } else {
        Err(HipsError::config(format!(
            "page template {} has no {} token",
            origin.display(),
            token
        )))
    }
}
