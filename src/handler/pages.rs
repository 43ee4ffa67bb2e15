//! HTML pages
//!
//! Every page shares one layout. Text coming from the request or the
//! filesystem is escaped before it is embedded.

use crate::http::query;
use html_escape::{encode_double_quoted_attribute, encode_text};

pub const CHALLENGE_NAME: &str = "Chakravyuha";

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} - {CHALLENGE_NAME}</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Arial, sans-serif;
            line-height: 1.6;
            background: #0f172a;
            color: #e2e8f0;
            margin: 0;
            padding: 40px;
        }}
        .container {{
            max-width: 860px;
            margin: 0 auto;
            padding: 32px;
            background: #1e293b;
            border-radius: 12px;
            border: 1px solid #334155;
        }}
        h1 {{ color: #f59e0b; margin-top: 0; }}
        a {{ color: #38bdf8; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
        pre {{
            background: #0b1120;
            padding: 16px;
            border-radius: 8px;
            overflow-x: auto;
            font-size: 0.85em;
        }}
        .error {{ color: #f87171; }}
        nav a {{ margin-right: 16px; }}
    </style>
</head>
<body>
    <div class="container">
        <nav><a href="/">Home</a><a href="/documents">Documents</a><a href="/upload">Upload</a></nav>
        {body}
    </div>
</body>
</html>"#
    )
}

/// Welcome page
pub fn index() -> String {
    layout(
        "Welcome",
        &format!(
            r#"<h1>{CHALLENGE_NAME}</h1>
        <p>Like Abhimanyu, you may find your way into the wheel formation. Finding the way out is another matter.</p>
        <ul>
            <li><strong>Outer ring:</strong> the document portal</li>
            <li><strong>Middle ring:</strong> the container that hosts it</li>
            <li><strong>Inner ring:</strong> the services behind it</li>
        </ul>
        <p>Start by browsing the <a href="/documents">document library</a>.</p>"#
        ),
    )
}

/// Document listing with links to the viewer
pub fn documents(names: &[String]) -> String {
    let items = if names.is_empty() {
        "<li><em>No documents available</em></li>".to_string()
    } else {
        names
            .iter()
            .map(|name| {
                let href = format!("/view?file={}", query::encode(name));
                format!(
                    r#"<li><a href="{}">{}</a></li>"#,
                    encode_double_quoted_attribute(&href),
                    encode_text(name)
                )
            })
            .collect::<Vec<_>>()
            .join("\n            ")
    };

    layout(
        "Documents",
        &format!(
            r"<h1>Document Library</h1>
        <ul>
            {items}
        </ul>"
        ),
    )
}

/// Generic error page
pub fn error(message: &str) -> String {
    layout(
        "Error",
        &format!(
            r#"<h1>Error</h1>
        <p class="error">{}</p>
        <p><a href="/">Back to start</a></p>"#,
            encode_text(message)
        ),
    )
}

/// Multipart upload form
pub fn upload_form() -> String {
    layout(
        "Upload",
        r#"<h1>Upload a Document</h1>
        <form method="post" action="/upload" enctype="multipart/form-data">
            <input type="file" name="file">
            <button type="submit">Upload</button>
        </form>"#,
    )
}

pub fn upload_success(filename: &str) -> String {
    layout(
        "Upload complete",
        &format!(
            r#"<h1>Upload complete</h1>
        <p>Stored <code>{}</code>.</p>
        <p><a href="/upload">Upload another file</a></p>"#,
            encode_text(filename)
        ),
    )
}

/// Source listing
pub fn source(content: &str) -> String {
    layout(
        "Source",
        &format!(
            r"<h1>Application Source</h1>
        <pre><code>{}</code></pre>",
            encode_text(content)
        ),
    )
}
