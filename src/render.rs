//! HTML export of the final report.
//!
//! Pure rendering, no decision logic: the final Markdown is converted to
//! HTML and wrapped in a standalone page that embeds the final quality
//! score.

use pulldown_cmark::{html, Options, Parser};

/// Render the final report as a standalone HTML page.
pub fn render_html(title: &str, author: &str, score: u8, markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(markdown, options);
    let mut body = String::new();
    html::push_html(&mut body, parser);

    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{title}</title>\n\
         </head>\n\
         <body>\n\
         <h1>{title}</h1>\n\
         <p>Author: {author}</p>\n\
         <p>Score: {score}/100</p>\n\
         <div>\n{body}</div>\n\
         </body>\n\
         </html>\n"
    )
}
