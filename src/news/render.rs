//! News card markup

use std::fmt::Write;

use chrono::NaiveDate;

use super::client::NewsArticle;

/// Escape text for interpolation into markup
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Uppercase the first character, leaving the rest untouched
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Render up to `max_items` articles as a card grid
///
/// `region` is the cleaned user input shown in the heading; `date` is
/// printed as `M/D/YYYY`.
#[must_use]
pub fn render_news(
    region: &str,
    articles: &[NewsArticle],
    max_items: usize,
    date: NaiveDate,
) -> String {
    let mut html = format!(
        "<h3>Latest news for {}</h3><p><small>{}</small></p><div class=\"news-grid\">",
        escape_html(&capitalize(region)),
        date.format("%-m/%-d/%Y"),
    );

    for article in articles.iter().take(max_items) {
        let title = escape_html(article.title.as_deref().unwrap_or_default());

        html.push_str("<div class=\"news-card\">");
        if let Some(image) = article.image_url.as_deref() {
            let _ = write!(
                html,
                "<img src=\"{}\" alt=\"{title}\" class=\"news-image\">",
                escape_html(image)
            );
        }
        let _ = write!(
            html,
            "<div class=\"news-content\"><h4>{title}</h4><p>{}</p>",
            escape_html(article.description.as_deref().unwrap_or_default())
        );
        if let Some(source) = article.source_id.as_deref() {
            let _ = write!(html, "<p class=\"news-source\">Source: {}</p>", escape_html(source));
        }
        if let Some(link) = article.link.as_deref() {
            let _ = write!(
                html,
                "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\" class=\"news-link\">Read full story →</a>",
                escape_html(link)
            );
        }
        html.push_str("</div></div>");
    }

    html.push_str("</div>");
    html
}
