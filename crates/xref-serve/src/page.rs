//! Minimal HTML rendering of a symbol detail page.

use xref_index::{SymbolObject, SymbolProvider};

use crate::registry::PageContext;

/// Render the detail page for one symbol. Anchors point at the rendered
/// source pages relative to the tag's `sources/` tree, exactly as the
/// search API's `href` fields do.
pub fn render(ctx: &PageContext, symbol: &SymbolObject) -> String {
    let mut out = String::with_capacity(1024);
    let title = if ctx.project.is_empty() {
        format!("{} - {}", ctx.tag, symbol.name)
    } else {
        format!("{} {} - {}", ctx.project, ctx.tag, symbol.name)
    };

    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape(&title)));
    out.push_str("</head>\n<body>\n");
    out.push_str(&format!("<h1>{}</h1>\n", escape(&symbol.name)));
    out.push_str(&format!(
        "<p class=\"hash\">symbol hash {}</p>\n",
        escape(&symbol.hash)
    ));

    for kind in &symbol.kinds {
        out.push_str(&format!(
            "<section>\n<h2>{} <small>linkage {} access {}</small></h2>\n",
            escape(&kind.kind),
            kind.linkage,
            kind.access
        ));
        render_providers(&mut out, "Definitions", &kind.defs);
        render_providers(&mut out, "Declarations", &kind.decls);
        out.push_str("</section>\n");
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn render_providers(out: &mut String, heading: &str, providers: &[SymbolProvider]) {
    if providers.is_empty() {
        return;
    }
    out.push_str(&format!("<h3>{}</h3>\n<ul>\n", heading));
    for provider in providers {
        out.push_str(&format!(
            "<li><a href=\"{}\">{}</a><pre>{}</pre></li>\n",
            escape(&provider.href),
            escape(&provider.location),
            escape(&provider.snippet)
        ));
    }
    out.push_str("</ul>\n");
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
