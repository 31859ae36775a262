//! HTML for the single-page form. Every piece of user- or filesystem-derived text goes through
//! [`escape_html`].

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use srt_folders::{OutcomeStatus, TranscriptionOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Warning,
    Danger,
}

impl FlashLevel {
    fn class(self) -> &'static str {
        match self {
            FlashLevel::Warning => "warning",
            FlashLevel::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Warning,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Danger,
            message: message.into(),
        }
    }
}

pub struct IndexPage<'a> {
    pub base_directory: &'a Path,
    pub directories: &'a [PathBuf],
    pub flash: Option<&'a Flash>,
    pub results: Option<&'a [TranscriptionOutcome]>,
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

fn esc_path(path: &Path) -> String {
    escape_html(&path.display().to_string())
}

const HEAD: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>srt-folders</title>
<style>
body { font-family: sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; }
.flash { padding: .5rem 1rem; border-radius: 4px; }
.flash.warning { background: #fff3cd; }
.flash.danger { background: #f8d7da; }
table { border-collapse: collapse; width: 100%; margin-top: 1rem; }
td, th { border: 1px solid #ccc; padding: .25rem .5rem; text-align: left; }
tr.created td { background: #e6f4ea; }
tr.failed td { background: #fdecea; }
</style>
</head>
<body>
<h1>Generate subtitles</h1>
"#;

impl IndexPage<'_> {
    pub fn render(&self) -> String {
        let mut html = String::from(HEAD);

        if let Some(flash) = self.flash {
            let _ = writeln!(
                html,
                r#"<p class="flash {}">{}</p>"#,
                flash.level.class(),
                escape_html(&flash.message)
            );
        }

        self.render_form(&mut html);

        if let Some(results) = self.results {
            render_results(&mut html, results);
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    fn render_form(&self, html: &mut String) {
        html.push_str("<form method=\"post\" action=\"/\">\n");
        let _ = writeln!(
            html,
            "<fieldset><legend>Directories in {}</legend>",
            esc_path(self.base_directory)
        );

        if self.directories.is_empty() {
            html.push_str("<p>No directories found.</p>\n");
        }
        for dir in self.directories {
            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| dir.display().to_string());
            let _ = writeln!(
                html,
                r#"<label><input type="checkbox" name="directories" value="{}"> {}</label><br>"#,
                esc_path(dir),
                escape_html(&name)
            );
        }
        html.push_str("</fieldset>\n");

        html.push_str(concat!(
            "<p><label>Additional path <input type=\"text\" name=\"extra_path\" size=\"60\"></label></p>\n",
            "<p><label><input type=\"checkbox\" name=\"recursive\" value=\"on\" checked> Include subdirectories</label>\n",
            "<label><input type=\"checkbox\" name=\"overwrite\" value=\"on\"> Overwrite existing subtitles</label></p>\n",
            "<p><button type=\"submit\">Generate</button></p>\n",
            "</form>\n",
        ));
    }
}

fn render_results(html: &mut String, results: &[TranscriptionOutcome]) {
    html.push_str(concat!(
        "<h2>Results</h2>\n<table>\n",
        "<tr><th>Source</th><th>Subtitle</th><th>Status</th><th>Message</th></tr>\n",
    ));

    for outcome in results {
        let class = match outcome.status() {
            OutcomeStatus::Created => "created",
            OutcomeStatus::Failed => "failed",
            OutcomeStatus::Skipped | OutcomeStatus::NoMedia => "skipped",
        };
        let output = outcome.output().map(esc_path).unwrap_or_else(|| "n/a".to_owned());

        let _ = writeln!(
            html,
            r#"<tr class="{class}"><td>{}</td><td>{output}</td><td>{}</td><td>{}</td></tr>"#,
            esc_path(outcome.source()),
            outcome.status(),
            escape_html(outcome.message()),
        );
    }

    html.push_str("</table>\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html_covers_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn directory_names_and_flash_are_escaped() {
        let dirs = vec![PathBuf::from("/data/<script>")];
        let flash = Flash::danger("The following paths do not exist: <b>");
        let page = IndexPage {
            base_directory: Path::new("/data"),
            directories: &dirs,
            flash: Some(&flash),
            results: None,
        }
        .render();

        assert!(!page.contains("<script>"));
        assert!(page.contains("/data/&lt;script&gt;"));
        assert!(page.contains(r#"<p class="flash danger">"#));
        assert!(page.contains("&lt;b&gt;"));
        assert!(!page.contains("<h2>Results</h2>"));
    }

    #[test]
    fn results_table_lists_each_outcome() {
        let results = vec![
            TranscriptionOutcome::created("/data/a.mp4".into(), "/data/a.srt".into()),
            TranscriptionOutcome::failed("/data/b.mp4".into(), "bad <codec>"),
        ];
        let page = IndexPage {
            base_directory: Path::new("/data"),
            directories: &[],
            flash: None,
            results: Some(results.as_slice()),
        }
        .render();

        assert!(page.contains("<h2>Results</h2>"));
        assert!(page.contains(r#"<tr class="created"><td>/data/a.mp4</td><td>/data/a.srt</td>"#));
        assert!(page.contains(r#"<tr class="failed"><td>/data/b.mp4</td><td>n/a</td>"#));
        assert!(page.contains("bad &lt;codec&gt;"));
        assert!(page.contains("No directories found."));
    }
}
