//! Prompt construction for generated images

/// Aspect ratio used when a page has none configured
pub const DEFAULT_ASPECT_RATIO: &str = "1:1";

const DEFAULT_TEMPLATE: &str = "Create one image for a Facebook post:\n\
- A beautiful natural background\n\
- Text: \"{{QUOTE}}\"\n\
- Bold, easy-to-read lettering";

const SINGLE_IMAGE_DIRECTIVE: &str = "**OUTPUT:** Generate exactly ONE single image. \
Do not produce a grid, collage, split panels or multiple variations.";

/// Pixel dimensions for a supported aspect ratio
pub fn aspect_dimensions(ratio: &str) -> String {
    let dimensions = match ratio {
        "1:1" => "1024x1024 pixels (square)",
        "2:3" => "1024x1536 pixels (portrait)",
        "3:2" => "1536x1024 pixels (landscape)",
        "4:5" => "1024x1280 pixels (portrait)",
        "5:4" => "1280x1024 pixels (landscape)",
        "9:16" => "1024x1820 pixels (vertical)",
        "16:9" => "1820x1024 pixels (widescreen)",
        other => return format!("{} ratio", other),
    };
    dimensions.to_string()
}

/// Build the generation prompt for `quote`
///
/// `template` may contain `{{QUOTE}}` and `{{PAGE_NAME}}`; a missing or
/// blank template uses the built-in one. The dimension directive and the
/// single-image directive are always appended.
pub fn build_image_prompt(
    quote: &str,
    page_name: Option<&str>,
    template: Option<&str>,
    aspect_ratio: Option<&str>,
    resolution: &str,
) -> String {
    let template = template
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_TEMPLATE);
    let ratio = aspect_ratio
        .filter(|r| !r.trim().is_empty())
        .unwrap_or(DEFAULT_ASPECT_RATIO);

    let body = template
        .replace("{{PAGE_NAME}}", page_name.unwrap_or(""))
        .replace("{{QUOTE}}", quote);

    format!(
        "{}\n\n**IMAGE DIMENSIONS:** Aspect Ratio {} → {}, Resolution: {}\n{}",
        body,
        ratio,
        aspect_dimensions(ratio),
        resolution,
        SINGLE_IMAGE_DIRECTIVE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_ratios() {
        assert_eq!(aspect_dimensions("1:1"), "1024x1024 pixels (square)");
        assert_eq!(aspect_dimensions("9:16"), "1024x1820 pixels (vertical)");
        assert_eq!(aspect_dimensions("16:9"), "1820x1024 pixels (widescreen)");
    }

    #[test]
    fn test_unknown_ratio() {
        assert_eq!(aspect_dimensions("21:9"), "21:9 ratio");
    }

    #[test]
    fn test_custom_template_substitution() {
        let prompt = build_image_prompt(
            "Less, but better",
            Some("Calm Mornings"),
            Some("Poster for {{PAGE_NAME}} reading \"{{QUOTE}}\" ({{QUOTE}})"),
            Some("4:5"),
            "4K",
        );
        assert!(prompt.starts_with(
            "Poster for Calm Mornings reading \"Less, but better\" (Less, but better)"
        ));
        assert!(prompt.contains("Aspect Ratio 4:5 → 1024x1280 pixels (portrait), Resolution: 4K"));
    }

    #[test]
    fn test_default_template_used_when_blank() {
        let prompt = build_image_prompt("Be here now", None, Some("   "), None, "2K");
        assert!(prompt.contains("Text: \"Be here now\""));
        assert!(prompt.contains("Aspect Ratio 1:1 → 1024x1024 pixels (square)"));
    }

    #[test]
    fn test_single_image_directive_always_present() {
        for template in [None, Some("{{QUOTE}}")] {
            let prompt = build_image_prompt("q", None, template, Some("3:2"), "2K");
            assert!(prompt.contains("exactly ONE single image"));
            assert!(prompt.contains("collage"));
        }
    }

    #[test]
    fn test_missing_page_name_substitutes_empty() {
        let prompt = build_image_prompt("q", None, Some("[{{PAGE_NAME}}]"), None, "2K");
        assert!(prompt.starts_with("[]"));
    }
}
