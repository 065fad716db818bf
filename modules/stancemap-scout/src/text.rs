use std::sync::LazyLock;

use regex::Regex;
use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};

/// Elements whose contents never render as page text.
static HIDDEN_BLOCKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["script", "style", "noscript", "template", "head"]
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).expect("valid regex")
        })
        .collect()
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Text a reader would see on the rendered page, as one whitespace-collapsed
/// line.
pub fn visible_text(html: &str, url: Option<&str>) -> String {
    let mut stripped = html.to_string();
    for block in HIDDEN_BLOCKS.iter() {
        stripped = block.replace_all(&stripped, " ").into_owned();
    }

    let parsed_url = url.and_then(|u| url::Url::parse(u).ok());
    let config = TransformConfig {
        readability: false,
        main_content: false,
        return_format: ReturnFormat::Text,
        filter_images: true,
        filter_svg: true,
        clean_html: false,
    };
    let input = TransformInput {
        url: parsed_url.as_ref(),
        content: stripped.as_bytes(),
        screenshot_bytes: None,
        encoding: None,
        selector_config: None,
        ignore_tags: None,
    };

    let text = transform_content_input(input, &config);
    collapse_whitespace(&text)
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <title>Hidden title</title>
    <style>body { color: red; }</style>
  </head>
  <body>
    <script>window.tracker = "alert-me";</script>
    <noscript>Please enable JavaScript</noscript>
    <h1>Ministry of Foreign Affairs</h1>
    <p>We condemn   the
       invasion</p>
  </body>
</html>"#;

    #[test]
    fn hidden_elements_are_removed() {
        let text = visible_text(PAGE, Some("https://www.example.com"));
        assert!(text.contains("Ministry of Foreign Affairs"));
        assert!(!text.contains("alert-me"));
        assert!(!text.contains("color: red"));
        assert!(!text.contains("enable JavaScript"));
        assert!(!text.contains("Hidden title"));
    }

    #[test]
    fn whitespace_is_collapsed() {
        let text = visible_text(PAGE, None);
        assert!(text.contains("We condemn the invasion"));
        assert!(!text.contains('\n'));
        assert!(!text.contains("  "));
        assert_eq!(text, text.trim());
    }

    #[test]
    fn collapse_handles_mixed_runs() {
        assert_eq!(collapse_whitespace("  a \t\n b  "), "a b");
        assert_eq!(collapse_whitespace(""), "");
    }
}
